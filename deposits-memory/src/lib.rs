//! In-memory adapter for the deposits allocation domain.
//!
//! This crate provides thread-safe, in-memory implementations of the
//! repository traits from the `deposits` crate, useful for testing and
//! development scenarios where persistence is not required.
//!
//! Rows are stored in the same denormalized shape the relational adapter
//! uses (primitive columns, foreign keys as plain strings), so loads go
//! through the exact same domain `parse` constructors a real store would
//! exercise.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use deposits::errors::{RepositoryError, RepositoryResult};
use deposits::repository::{AccountRepository, DepositRepository, InvestorRepository};
use deposits::types::{AccountId, DepositId, InvestorId, PotId};
use deposits::{Account, Deposit, Investor, Pot, Receipt};

#[derive(Debug, Clone)]
struct DepositRow {
    id: String,
    investor_id: String,
}

#[derive(Debug, Clone)]
struct PotRow {
    id: String,
    deposit_id: String,
    name: String,
}

#[derive(Debug, Clone)]
struct AccountRow {
    id: String,
    pot_id: String,
    wrapper_type: i32,
    nominal_amount: i64,
    total_allocated_amount: i64,
}

#[derive(Debug, Clone)]
struct ReceiptRow {
    id: String,
    account_id: String,
    allocated_amount: i64,
}

fn duplicate_key(entity: &'static str) -> RepositoryError {
    RepositoryError::SaveFailed {
        entity,
        source: "duplicate id".into(),
    }
}

/// Thread-safe in-memory store implementing every repository trait.
///
/// Cloning is cheap and clones share the same tables, so one store can be
/// handed to several services at once.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    // Investor id -> name.
    investors: Arc<RwLock<HashMap<String, String>>>,
    deposits: Arc<RwLock<HashMap<String, DepositRow>>>,
    // Insertion order doubles as row order for aggregate reassembly.
    pots: Arc<RwLock<Vec<PotRow>>>,
    accounts: Arc<RwLock<Vec<AccountRow>>>,
    receipts: Arc<RwLock<Vec<ReceiptRow>>>,
}

impl InMemoryStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of receipt rows persisted for the given account.
    pub fn receipt_count(&self, account_id: AccountId) -> usize {
        let receipts = self.receipts.read().expect("RwLock poisoned");
        let account_id = account_id.to_string();
        receipts
            .iter()
            .filter(|row| row.account_id == account_id)
            .count()
    }

    /// Returns the sum of all receipt rows persisted for the given account.
    pub fn receipt_total(&self, account_id: AccountId) -> i64 {
        let receipts = self.receipts.read().expect("RwLock poisoned");
        let account_id = account_id.to_string();
        receipts
            .iter()
            .filter(|row| row.account_id == account_id)
            .map(|row| row.allocated_amount)
            .sum()
    }

    /// Returns the investor recorded as owner of the given deposit, if the
    /// deposit header has been persisted.
    pub fn owner_of(&self, deposit_id: DepositId) -> Option<InvestorId> {
        let deposits = self.deposits.read().expect("RwLock poisoned");
        deposits
            .get(&deposit_id.to_string())
            .and_then(|row| InvestorId::parse(&row.investor_id).ok())
    }

    /// Returns the persisted name of the given investor, if onboarded.
    pub fn investor_name(&self, investor_id: InvestorId) -> Option<String> {
        let investors = self.investors.read().expect("RwLock poisoned");
        investors.get(&investor_id.to_string()).cloned()
    }
}

#[async_trait]
impl DepositRepository for InMemoryStore {
    async fn save_deposit(
        &self,
        investor_id: InvestorId,
        deposit: &Deposit,
    ) -> RepositoryResult<()> {
        let mut deposits = self.deposits.write().expect("RwLock poisoned");
        let id = deposit.id().to_string();
        if deposits.contains_key(&id) {
            return Err(duplicate_key("deposit"));
        }
        deposits.insert(
            id.clone(),
            DepositRow {
                id,
                investor_id: investor_id.to_string(),
            },
        );
        Ok(())
    }

    async fn save_pot(&self, deposit_id: DepositId, pot: &Pot) -> RepositoryResult<()> {
        let mut pots = self.pots.write().expect("RwLock poisoned");
        let id = pot.id().to_string();
        if pots.iter().any(|row| row.id == id) {
            return Err(duplicate_key("pot"));
        }
        pots.push(PotRow {
            id,
            deposit_id: deposit_id.to_string(),
            name: pot.name().to_string(),
        });
        Ok(())
    }

    async fn save_account(&self, pot_id: PotId, account: &Account) -> RepositoryResult<()> {
        let mut accounts = self.accounts.write().expect("RwLock poisoned");
        let id = account.id().to_string();
        if accounts.iter().any(|row| row.id == id) {
            return Err(duplicate_key("account"));
        }
        accounts.push(AccountRow {
            id,
            pot_id: pot_id.to_string(),
            wrapper_type: account.wrapper_type().as_i32(),
            nominal_amount: account.nominal_amount().into(),
            total_allocated_amount: account.total_allocated_amount().into(),
        });
        Ok(())
    }

    async fn get_full_deposit(&self, deposit_id: DepositId) -> RepositoryResult<Deposit> {
        let deposits = self.deposits.read().expect("RwLock poisoned");
        let pots = self.pots.read().expect("RwLock poisoned");
        let accounts = self.accounts.read().expect("RwLock poisoned");

        let deposit_row = deposits
            .get(&deposit_id.to_string())
            .ok_or(RepositoryError::DepositNotFound(deposit_id))?;

        let mut deposit =
            Deposit::parse(&deposit_row.id).map_err(RepositoryError::CorruptedRow)?;

        for pot_row in pots.iter().filter(|row| row.deposit_id == deposit_row.id) {
            let account_rows: Vec<_> = accounts
                .iter()
                .filter(|row| row.pot_id == pot_row.id)
                .collect();
            // Inner-join semantics: a pot contributes to the aggregate only
            // through its accounts, so a pot without accounts is invisible.
            if account_rows.is_empty() {
                continue;
            }

            let mut pot =
                Pot::parse(&pot_row.id, &pot_row.name).map_err(RepositoryError::CorruptedRow)?;

            for account_row in account_rows {
                let account = Account::parse(
                    &account_row.id,
                    account_row.wrapper_type,
                    account_row.nominal_amount,
                    account_row.total_allocated_amount,
                )
                .map_err(RepositoryError::CorruptedRow)?;
                pot.add_account(account)
                    .map_err(RepositoryError::CorruptedRow)?;
            }

            deposit.add_pot(pot);
        }

        // The join produced no rows at all; the header alone is not a
        // retrievable aggregate.
        if deposit.pots().is_empty() {
            return Err(RepositoryError::DepositNotFound(deposit_id));
        }

        Ok(deposit)
    }
}

#[async_trait]
impl AccountRepository for InMemoryStore {
    async fn get_account(&self, account_id: AccountId) -> RepositoryResult<Account> {
        let accounts = self.accounts.read().expect("RwLock poisoned");
        let id = account_id.to_string();
        let row = accounts
            .iter()
            .find(|row| row.id == id)
            .ok_or(RepositoryError::AccountNotFound(account_id))?;

        Account::parse(
            &row.id,
            row.wrapper_type,
            row.nominal_amount,
            row.total_allocated_amount,
        )
        .map_err(RepositoryError::CorruptedRow)
    }

    async fn update_account(&self, account: &Account) -> RepositoryResult<()> {
        let mut accounts = self.accounts.write().expect("RwLock poisoned");
        let id = account.id().to_string();
        let row = accounts
            .iter_mut()
            .find(|row| row.id == id)
            .ok_or(RepositoryError::AccountNotFound(account.id()))?;

        row.wrapper_type = account.wrapper_type().as_i32();
        row.nominal_amount = account.nominal_amount().into();
        row.total_allocated_amount = account.total_allocated_amount().into();
        Ok(())
    }

    async fn save_receipt(
        &self,
        account_id: AccountId,
        receipt: &Receipt,
    ) -> RepositoryResult<()> {
        let mut receipts = self.receipts.write().expect("RwLock poisoned");
        let id = receipt.id().to_string();
        if receipts.iter().any(|row| row.id == id) {
            return Err(duplicate_key("receipt"));
        }
        receipts.push(ReceiptRow {
            id,
            account_id: account_id.to_string(),
            allocated_amount: receipt.allocated_amount().into(),
        });
        Ok(())
    }
}

#[async_trait]
impl InvestorRepository for InMemoryStore {
    async fn save_investor(&self, investor: &Investor) -> RepositoryResult<()> {
        let mut investors = self.investors.write().expect("RwLock poisoned");
        let id = investor.id().to_string();
        if investors.contains_key(&id) {
            return Err(duplicate_key("investor"));
        }
        investors.insert(id, investor.name().to_string());
        Ok(())
    }
}
