//! Repository capability traits consumed by the services.
//!
//! One trait per aggregate, so services declare exactly the storage
//! capabilities they need and tests can substitute in-memory fakes. All
//! operations are async; cancelling a caller (dropping the future) aborts
//! the in-flight storage call, and no partial state is rolled back
//! automatically.

use async_trait::async_trait;

use crate::account::Account;
use crate::deposit::Deposit;
use crate::errors::RepositoryResult;
use crate::investor::Investor;
use crate::pot::Pot;
use crate::receipt::Receipt;
use crate::types::{AccountId, DepositId, InvestorId, PotId};

/// Persistence capabilities for the deposit aggregate.
#[async_trait]
pub trait DepositRepository: Send + Sync {
    /// Persists the deposit header: its id and the owning investor's id.
    async fn save_deposit(&self, investor_id: InvestorId, deposit: &Deposit)
        -> RepositoryResult<()>;

    /// Persists one pot row under the given deposit.
    async fn save_pot(&self, deposit_id: DepositId, pot: &Pot) -> RepositoryResult<()>;

    /// Persists one account row under the given pot.
    async fn save_account(&self, pot_id: PotId, account: &Account) -> RepositoryResult<()>;

    /// Loads the fully reassembled aggregate in one read.
    ///
    /// Implementations read the denormalized deposit/pot/account join and
    /// rebuild the nesting: rows are grouped by pot id preserving first-seen
    /// pot order, and each group's accounts are attached in row order. Every
    /// row passes through the domain `parse` constructors, so corrupted
    /// state is rejected rather than returned.
    async fn get_full_deposit(&self, deposit_id: DepositId) -> RepositoryResult<Deposit>;
}

/// Persistence capabilities for individual accounts and their receipts.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Loads one account by id. Not-found is an error.
    async fn get_account(&self, account_id: AccountId) -> RepositoryResult<Account>;

    /// Persists an account's updated state in place.
    async fn update_account(&self, account: &Account) -> RepositoryResult<()>;

    /// Persists one receipt row, recording its account association.
    async fn save_receipt(&self, account_id: AccountId, receipt: &Receipt)
        -> RepositoryResult<()>;
}

/// Persistence capabilities for investors.
#[async_trait]
pub trait InvestorRepository: Send + Sync {
    /// Persists a newly onboarded investor.
    async fn save_investor(&self, investor: &Investor) -> RepositoryResult<()>;
}
