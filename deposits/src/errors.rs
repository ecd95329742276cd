//! Error types for the deposits domain.
//!
//! Two error categories, mirroring the layering of the crate:
//!
//! - [`DomainError`]: construction and invariant failures. These are caller
//!   faults, detected as early as possible (at value construction or when a
//!   domain rule is applied) and surfaced unchanged through every layer.
//! - [`RepositoryError`]: persistence faults. These are wrapped with an
//!   identifying context and surfaced as opaque internal failures; retry
//!   policy, if any, belongs to the storage client, not this crate.

use thiserror::Error;

use crate::types::{
    AccountId, AllocatedAmountError, DepositId, InvestorNameError, NominalAmountError,
    PotNameError, TotalAllocatedAmountError,
};

/// A convenient `Result` alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;

/// Failures raised by domain construction and domain rules.
///
/// Every variant represents a rejected request: none of these are retryable,
/// and the entity under mutation is left unchanged when one is returned.
#[derive(Debug, Clone, Error)]
pub enum DomainError {
    /// A caller-supplied identifier string was not well-formed.
    #[error("invalid {entity} id '{value}'")]
    InvalidId {
        /// Which entity's identifier was being parsed.
        entity: &'static str,
        /// The rejected input.
        value: String,
        /// The underlying parse failure.
        #[source]
        source: uuid::Error,
    },

    /// A wire integer did not map to a defined wrapper type.
    ///
    /// Zero is deliberately unmapped so that an unset wrapper type is always
    /// rejected.
    #[error("invalid wrapper type {0}, expected 1 (GIA), 2 (ISA) or 3 (SIPP)")]
    InvalidWrapperType(i32),

    /// A monetary amount was negative.
    #[error("{amount} amount cannot be negative")]
    NegativeAmount {
        /// Which amount was rejected.
        amount: &'static str,
    },

    /// A required name was empty or whitespace-only.
    #[error("blank {field} given")]
    BlankName {
        /// Which name was rejected.
        field: &'static str,
    },

    /// The pot already holds an account of the given wrapper type.
    #[error("pot already contains an account of wrapper type {wrapper_type}")]
    WrapperTypeExistsInPot {
        /// The conflicting wrapper type, as its wire integer.
        wrapper_type: i32,
    },

    /// Applying a receipt would push a capped account past its nominal
    /// ceiling. The account is left unmodified.
    #[error("allocating would raise the total to {candidate}, exceeding the nominal amount {nominal}")]
    NominalExceeded {
        /// The configured ceiling.
        nominal: i64,
        /// The prospective total that was rejected.
        candidate: i64,
    },

    /// Applying a receipt would overflow the representable running total.
    /// The account is left unmodified.
    #[error("allocating {amount} would overflow the running total {current}")]
    TotalOverflow {
        /// The total before the rejected receipt.
        current: i64,
        /// The receipt amount that was rejected.
        amount: i64,
    },
}

impl From<NominalAmountError> for DomainError {
    fn from(_: NominalAmountError) -> Self {
        Self::NegativeAmount { amount: "nominal" }
    }
}

impl From<AllocatedAmountError> for DomainError {
    fn from(_: AllocatedAmountError) -> Self {
        Self::NegativeAmount {
            amount: "allocated",
        }
    }
}

impl From<TotalAllocatedAmountError> for DomainError {
    fn from(_: TotalAllocatedAmountError) -> Self {
        Self::NegativeAmount {
            amount: "total allocated",
        }
    }
}

impl From<PotNameError> for DomainError {
    fn from(_: PotNameError) -> Self {
        Self::BlankName { field: "pot name" }
    }
}

impl From<InvestorNameError> for DomainError {
    fn from(_: InvestorNameError) -> Self {
        Self::BlankName { field: "name" }
    }
}

/// A convenient `Result` alias for repository operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Failures raised by repository implementations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// A write failed in the underlying store.
    #[error("failed to save {entity}")]
    SaveFailed {
        /// Which entity was being written.
        entity: &'static str,
        /// The underlying storage fault.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A read failed in the underlying store.
    #[error("failed to load {entity}")]
    LoadFailed {
        /// Which entity was being read.
        entity: &'static str,
        /// The underlying storage fault.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// No account exists with the given identifier.
    #[error("account '{0}' not found")]
    AccountNotFound(AccountId),

    /// No deposit exists with the given identifier.
    #[error("deposit '{0}' not found")]
    DepositNotFound(DepositId),

    /// A stored row failed domain validation on load.
    ///
    /// Persisted state is re-validated through the same smart constructors as
    /// fresh input, so corrupted or manually-edited rows are rejected here
    /// rather than trusted silently.
    #[error("stored row rejected by domain validation")]
    CorruptedRow(#[source] DomainError),
}
