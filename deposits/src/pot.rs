//! Pots: named groupings of at most one account per wrapper type.

use serde::Serialize;

use crate::account::Account;
use crate::errors::{DomainError, DomainResult};
use crate::types::{PotId, PotName};

/// A named collection of accounts inside a deposit.
///
/// # Invariants
///
/// No two accounts in the same pot share a wrapper type. The scan in
/// [`Pot::add_account`] is exhaustive over at most three possible wrapper
/// types, so the check is bounded and never probabilistic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pot {
    id: PotId,
    name: PotName,
    accounts: Vec<Account>,
}

impl Pot {
    /// Creates a new pot with a fresh identifier and no accounts.
    pub fn new(name: PotName) -> Self {
        Self {
            id: PotId::generate(),
            name,
            accounts: Vec::new(),
        }
    }

    /// Reconstructs a pot from persisted state, with no accounts attached.
    ///
    /// # Errors
    ///
    /// Returns a [`DomainError`] if the identifier is malformed or the name
    /// is blank.
    pub fn parse(id: &str, name: &str) -> DomainResult<Self> {
        Ok(Self {
            id: PotId::parse(id)?,
            name: PotName::try_new(name)?,
            accounts: Vec::new(),
        })
    }

    /// Adds an account to this pot.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::WrapperTypeExistsInPot`] if the pot already
    /// holds an account of the same wrapper type; the pot is unchanged.
    pub fn add_account(&mut self, account: Account) -> DomainResult<()> {
        if self
            .accounts
            .iter()
            .any(|existing| existing.wrapper_type() == account.wrapper_type())
        {
            return Err(DomainError::WrapperTypeExistsInPot {
                wrapper_type: account.wrapper_type().as_i32(),
            });
        }

        self.accounts.push(account);
        Ok(())
    }

    /// The pot's unique identifier.
    pub const fn id(&self) -> PotId {
        self.id
    }

    /// The pot's display name.
    pub const fn name(&self) -> &PotName {
        &self.name
    }

    /// The pot's accounts, in insertion order.
    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }
}
