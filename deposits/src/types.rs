//! Identifier and value types for the deposits domain.
//!
//! All constrained types use smart constructors so that a value, once built,
//! is always valid ("parse, don't validate"). Identifiers are distinct
//! newtypes per entity: an [`AccountId`] is never accepted where a [`PotId`]
//! is expected, and mixing them up is a compile error.

use nutype::nutype;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::DomainError;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $entity:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generates a fresh, unique identifier.
            pub fn generate() -> Self {
                Self(Uuid::now_v7())
            }

            /// Parses a caller-supplied identifier string.
            ///
            /// # Errors
            ///
            /// Returns [`DomainError::InvalidId`] if the string is not a
            /// well-formed UUID.
            pub fn parse(value: &str) -> Result<Self, DomainError> {
                let uuid = Uuid::parse_str(value).map_err(|source| DomainError::InvalidId {
                    entity: $entity,
                    value: value.to_owned(),
                    source,
                })?;
                Ok(Self(uuid))
            }

            /// Returns the underlying UUID.
            pub const fn into_uuid(self) -> Uuid {
                self.0
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

entity_id!(
    /// Unique identifier of an investor.
    InvestorId,
    "investor"
);
entity_id!(
    /// Unique identifier of a deposit aggregate.
    DepositId,
    "deposit"
);
entity_id!(
    /// Unique identifier of a pot within a deposit.
    PotId,
    "pot"
);
entity_id!(
    /// Unique identifier of a wrapper-typed account within a pot.
    AccountId,
    "account"
);
entity_id!(
    /// Unique identifier of a receipt.
    ReceiptId,
    "receipt"
);

/// The contribution ceiling configured for an account.
///
/// Non-negative; the ceiling is only enforced for capped wrapper types
/// (ISA/SIPP), and the enforcement lives in
/// [`Account`](crate::account::Account), not here.
#[nutype(
    validate(greater_or_equal = 0),
    derive(
        Debug,
        Clone,
        Copy,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Hash,
        Display,
        Into,
        Serialize,
        Deserialize
    )
)]
pub struct NominalAmount(i64);

/// The amount carried by a single receipt. Non-negative.
#[nutype(
    validate(greater_or_equal = 0),
    derive(
        Debug,
        Clone,
        Copy,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Hash,
        Display,
        Into,
        Serialize,
        Deserialize
    )
)]
pub struct AllocatedAmount(i64);

/// The running sum of all receipts applied to an account.
///
/// Starts at zero and only ever increases; no reversal operation exists.
#[nutype(
    validate(greater_or_equal = 0),
    derive(
        Debug,
        Clone,
        Copy,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Hash,
        Display,
        Into,
        Serialize,
        Deserialize
    )
)]
pub struct TotalAllocatedAmount(i64);

impl TotalAllocatedAmount {
    /// The starting total for a freshly created account.
    pub fn zero() -> Self {
        Self::try_new(0).expect("0 is always a valid total")
    }
}

/// The display name of a pot. Non-empty after trimming.
#[nutype(
    sanitize(trim),
    validate(not_empty),
    derive(
        Debug,
        Clone,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Hash,
        AsRef,
        Deref,
        Display,
        Serialize,
        Deserialize
    )
)]
pub struct PotName(String);

/// The name of an investor. Non-empty after trimming.
#[nutype(
    sanitize(trim),
    validate(not_empty),
    derive(
        Debug,
        Clone,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Hash,
        AsRef,
        Deref,
        Display,
        Serialize,
        Deserialize
    )
)]
pub struct InvestorName(String);
