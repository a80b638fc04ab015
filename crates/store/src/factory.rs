// SPDX-License-Identifier: MIT

//! Constructs [`ResilientStore`] instances rooted under one data directory,
//! so callers never hand-assemble per-store paths themselves.

use crate::migration::MigrationRegistry;
use crate::store::{ResilientStore, StoreConfig};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::PathBuf;
use ward_core::Clock;

/// Opens stores by name under a fixed data directory, sharing one clock.
#[derive(Clone)]
pub struct StoreFactory<C: Clock> {
    data_dir: PathBuf,
    clock: C,
}

impl<C: Clock> StoreFactory<C> {
    pub fn new(data_dir: PathBuf, clock: C) -> Self {
        Self { data_dir, clock }
    }

    pub fn data_dir(&self) -> &PathBuf {
        &self.data_dir
    }

    /// Open (but do not create on disk) the store named `name`, backed by
    /// `<data_dir>/<name>.json`.
    pub fn open<T>(
        &self,
        name: &str,
        config: StoreConfig,
        migrations: MigrationRegistry,
    ) -> ResilientStore<T, C>
    where
        T: Serialize + DeserializeOwned + Clone,
    {
        let path = self.data_dir.join(format!("{name}.json"));
        ResilientStore::new(path, config, migrations, self.clock.clone())
    }
}
