//! Typed identifiers for pipeline entities.
//!
//! Each identifier wraps a [`uuid::Uuid`] so that a project id cannot be
//! passed where a template id is expected.  The wrappers serialize
//! transparently, so wire payloads and database rows see plain UUID strings.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a fresh random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wraps an existing UUID, e.g. one read from the database.
            pub fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            /// Returns the underlying UUID.
            pub fn as_uuid(&self) -> Uuid {
                self.0
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

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Uuid {
                id.0
            }
        }
    };
}

uuid_id!(
    /// Identifies a [`Project`](crate::Project).
    ProjectId
);
uuid_id!(
    /// Identifies a [`Template`](crate::Template).
    TemplateId
);
uuid_id!(
    /// Identifies an [`ArtStyle`](crate::ArtStyle).
    ArtStyleId
);
uuid_id!(
    /// Identifies an [`Image`](crate::Image).
    ImageId
);
uuid_id!(
    /// Identifies a purchasable [`Product`](crate::Product).
    ProductId
);

/// Identifies a user account.
///
/// User ids come from the authentication provider and are opaque strings
/// rather than UUIDs we mint ourselves.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_distinct() {
        let a = ProjectId::new();
        let b = ProjectId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn id_round_trips_through_serde() {
        let id = ImageId::new();
        let json = serde_json::to_string(&id).unwrap();
        let back: ImageId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
        // Transparent serialization, no wrapper object.
        assert!(json.starts_with('"'));
    }

    #[test]
    fn user_id_wraps_opaque_string() {
        let id = UserId::from("user_2b7f");
        assert_eq!(id.as_str(), "user_2b7f");
        assert_eq!(id.to_string(), "user_2b7f");
    }
}
