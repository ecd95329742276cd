//! Allocation domain model for investor deposits.
//!
//! A deposit contains named pots, each pot holds at most one account per
//! tax-wrapper type, and accounts accumulate incoming receipts against a
//! nominal allocation limit that depends on the wrapper type: GIA accounts
//! are uncapped, ISA and SIPP accounts may never exceed their nominal
//! amount.
//!
//! The crate is organised in three layers:
//!
//! - validated identifier and value types ([`types`]),
//! - the aggregate itself ([`investor`], [`deposit`], [`pot`], [`account`],
//!   [`receipt`]), whose smart constructors make invalid states
//!   unrepresentable,
//! - the services ([`service`]) that sequence persistence through the
//!   [`repository`] capability traits.
//!
//! # Atomicity
//!
//! The create workflow is an ordered, best-effort multi-row save and the
//! receive-receipt workflow is a read-check-write pair; neither is wrapped
//! in a storage transaction by this layer. A failure part-way leaves a
//! partially persisted aggregate, and concurrent receipts against the same
//! account can race past the ceiling check. Deployments that need atomicity
//! under concurrency must provide it at the storage adapter (a serializable
//! transaction or row lock around each workflow).

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod account;
pub mod deposit;
pub mod errors;
pub mod investor;
pub mod pot;
pub mod receipt;
pub mod repository;
pub mod service;
pub mod types;

pub use account::{Account, WrapperType};
pub use deposit::Deposit;
pub use errors::{DomainError, DomainResult, RepositoryError, RepositoryResult};
pub use investor::Investor;
pub use pot::Pot;
pub use receipt::Receipt;
pub use repository::{AccountRepository, DepositRepository, InvestorRepository};
pub use service::{DepositsService, InvestorsService, ServiceError, ServiceResult};
pub use types::{
    AccountId, AllocatedAmount, DepositId, InvestorId, InvestorName, NominalAmount, PotId,
    PotName, ReceiptId, TotalAllocatedAmount,
};
