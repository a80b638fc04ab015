// SPDX-License-Identifier: MIT

//! Default failure classification rule table (§4.6). Callers may always
//! bypass this and classify a failure themselves before calling
//! [`crate::CircuitBreaker::record_failure`].

use ward_core::FailureClass;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureSignal {
    /// An HTTP-style status code observed from the external call.
    Status(u16),
    /// A transport/network-level error with no status code.
    Network,
}

/// Classify an observed failure signal. `resource_should_exist` disambiguates
/// a 404: if the caller expected the resource to be present, a 404 is a
/// transient anomaly; if absence is a normal outcome, it is `Expected`.
pub fn classify_failure(signal: FailureSignal, resource_should_exist: bool) -> FailureClass {
    match signal {
        FailureSignal::Network => FailureClass::External,
        FailureSignal::Status(429) => FailureClass::RateLimited,
        FailureSignal::Status(404) => {
            if resource_should_exist {
                FailureClass::Transient
            } else {
                FailureClass::Expected
            }
        }
        FailureSignal::Status(400) | FailureSignal::Status(422) => FailureClass::Permanent,
        FailureSignal::Status(code) if (500..600).contains(&code) => FailureClass::Transient,
        FailureSignal::Status(_) => FailureClass::Transient,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_status_classifies_as_rate_limited() {
        assert_eq!(classify_failure(FailureSignal::Status(429), false), FailureClass::RateLimited);
    }

    #[test]
    fn missing_resource_depends_on_expectation() {
        assert_eq!(classify_failure(FailureSignal::Status(404), true), FailureClass::Transient);
        assert_eq!(classify_failure(FailureSignal::Status(404), false), FailureClass::Expected);
    }

    #[test]
    fn validation_errors_are_permanent() {
        assert_eq!(classify_failure(FailureSignal::Status(400), false), FailureClass::Permanent);
        assert_eq!(classify_failure(FailureSignal::Status(422), false), FailureClass::Permanent);
    }

    #[test]
    fn server_errors_are_transient() {
        assert_eq!(classify_failure(FailureSignal::Status(503), false), FailureClass::Transient);
    }

    #[test]
    fn network_errors_are_external() {
        assert_eq!(classify_failure(FailureSignal::Network, false), FailureClass::External);
    }
}
