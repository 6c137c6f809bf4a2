//! Typed IDs for type-safe entity references.
//!
//! Using typed IDs prevents accidentally passing a `CategoryId` where a `MiniPoolId` is expected.
//! Every id is a fresh UUID v7 minted at creation time and is never reused.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Macro to generate typed ID wrappers.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Creates a new random ID using UUID v7 (time-ordered).
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Creates an ID from an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner UUID.
            #[must_use]
            pub const fn into_inner(self) -> Uuid {
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

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

typed_id!(UserId, "Unique identifier for a user.");
typed_id!(GrantId, "Unique identifier for a grant.");
typed_id!(AimId, "Unique identifier for a grant aim.");
typed_id!(SubAimId, "Unique identifier for a sub-aim.");
typed_id!(ActivityId, "Unique identifier for a sub-aim activity.");
typed_id!(BudgetId, "Unique identifier for a budget.");
typed_id!(CategoryId, "Unique identifier for a budget category (macro pool).");
typed_id!(MiniPoolId, "Unique identifier for a mini-pool (sub-budget).");
typed_id!(ExpenseId, "Unique identifier for an expense.");
typed_id!(DocumentId, "Unique identifier for a stored document.");
typed_id!(TaskId, "Unique identifier for a task.");
typed_id!(PaymentRequestId, "Unique identifier for a payment request.");
typed_id!(TemplateId, "Unique identifier for a document template.");

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
