// SPDX-License-Identifier: MIT

//! Schema migration: sequential transforms applied to a store's raw JSON
//! payload from its loaded version up to the current version.

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum MigrationError {
    #[error("record schema version {0} is newer than the current version {1}")]
    TooNew(u32, u32),
    #[error("no migration path from version {0} to {1}")]
    MissingMigration(u32, u32),
    #[error("migration from {from} to {to} failed: {reason}")]
    Failed { from: u32, to: u32, reason: String },
}

/// One version-to-version transform over a store's raw payload.
pub trait Migration: Send + Sync {
    fn source_version(&self) -> u32;
    fn target_version(&self) -> u32;
    fn migrate(&self, payload: &mut Value) -> Result<(), String>;
}

/// Ordered collection of migrations, applied sequentially by
/// [`MigrationRegistry::migrate_to`].
#[derive(Default)]
pub struct MigrationRegistry {
    migrations: Vec<Box<dyn Migration>>,
}

impl MigrationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, migration: Box<dyn Migration>) {
        self.migrations.push(migration);
    }

    /// Apply migrations in sequence from `from_version` to `target_version`.
    /// Fails with [`MigrationError::MissingMigration`] if an intermediate
    /// step has no registered migration, and with
    /// [`MigrationError::TooNew`] if the loaded version already exceeds
    /// `target_version` (a downgrade is never attempted).
    pub fn migrate_to(
        &self,
        mut payload: Value,
        from_version: u32,
        target_version: u32,
    ) -> Result<Value, MigrationError> {
        if from_version > target_version {
            return Err(MigrationError::TooNew(from_version, target_version));
        }
        let mut current = from_version;
        while current < target_version {
            let next = self.migrations.iter().find(|m| m.source_version() == current);
            match next {
                Some(migration) => {
                    migration.migrate(&mut payload).map_err(|reason| MigrationError::Failed {
                        from: current,
                        to: migration.target_version(),
                        reason,
                    })?;
                    current = migration.target_version();
                }
                None => return Err(MigrationError::MissingMigration(current, target_version)),
            }
        }
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn same_version_is_noop() {
        let registry = MigrationRegistry::new();
        let v1 = json!({"a": 1});
        let result = registry.migrate_to(v1.clone(), 1, 1).unwrap();
        assert_eq!(result, v1);
    }

    #[test]
    fn loaded_version_newer_than_target_is_rejected() {
        let registry = MigrationRegistry::new();
        let err = registry.migrate_to(json!({}), 99, 1).unwrap_err();
        assert_eq!(err, MigrationError::TooNew(99, 1));
    }

    #[test]
    fn missing_intermediate_migration_fails() {
        let registry = MigrationRegistry::new();
        let err = registry.migrate_to(json!({}), 1, 2).unwrap_err();
        assert_eq!(err, MigrationError::MissingMigration(1, 2));
    }

    struct AddMigratedFlag;
    impl Migration for AddMigratedFlag {
        fn source_version(&self) -> u32 {
            1
        }
        fn target_version(&self) -> u32 {
            2
        }
        fn migrate(&self, payload: &mut Value) -> Result<(), String> {
            if let Some(obj) = payload.as_object_mut() {
                obj.insert("migrated".into(), true.into());
            }
            Ok(())
        }
    }

    #[test]
    fn chains_sequential_migrations() {
        let mut registry = MigrationRegistry::new();
        registry.register(Box::new(AddMigratedFlag));
        let result = registry.migrate_to(json!({"seq": 42}), 1, 2).unwrap();
        assert_eq!(result["migrated"], true);
        assert_eq!(result["seq"], 42);
    }
}
