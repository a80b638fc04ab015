// SPDX-License-Identifier: MIT

//! ISO-8601 timestamp formatting shared by WAL, audit, and store records.

use chrono::{DateTime, Utc};

/// Render an epoch-millisecond timestamp as an ISO-8601 / RFC 3339 string
/// with millisecond precision, e.g. `2026-07-28T12:00:00.000Z`.
pub fn iso8601_from_epoch_ms(epoch_ms: u64) -> String {
    let dt: DateTime<Utc> =
        DateTime::from_timestamp_millis(epoch_ms as i64).unwrap_or(DateTime::<Utc>::MIN_UTC);
    dt.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
