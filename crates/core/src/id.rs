// SPDX-License-Identifier: MIT

//! Prefixed opaque ID newtypes.

/// Define a newtype ID wrapper around `String` with a fixed type prefix.
///
/// Generates `new()` for random generation, `from_string()` for parsing,
/// `as_str()`, `Display`, `From<String>`, `From<&str>`, and `Deref`.
///
/// ```ignore
/// define_id! {
///     pub struct WorkflowId("wf-");
/// }
/// ```
#[macro_export]
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        pub struct $name:ident($prefix:literal);
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub const PREFIX: &'static str = $prefix;

            /// Generate a new random ID with the type prefix.
            pub fn new() -> Self {
                Self(format!("{}{}", Self::PREFIX, nanoid::nanoid!(16)))
            }

            /// Build an ID from an existing string (parsing/deserialization).
            pub fn from_string(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::from_string(s)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self::from_string(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl std::ops::Deref for $name {
            type Target = str;

            fn deref(&self) -> &str {
                &self.0
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::{StepId, WorkflowId};

    #[test]
    fn new_ids_carry_their_prefix() {
        assert!(WorkflowId::new().0.starts_with("wf-"));
        assert!(StepId::new().0.starts_with("st-"));
    }

    #[test]
    fn from_string_round_trips() {
        let id = WorkflowId::from_string("wf-abc123");
        assert_eq!(id.as_str(), "wf-abc123");
        assert_eq!(id.to_string(), "wf-abc123");
    }

    #[test]
    fn ids_are_usable_as_hashmap_keys_via_borrow_str() {
        use std::collections::HashMap;
        let mut map: HashMap<WorkflowId, u32> = HashMap::new();
        let id = WorkflowId::from_string("wf-xyz");
        map.insert(id.clone(), 1);
        assert_eq!(map.get("wf-xyz"), Some(&1));
    }
}
