//! The deposit aggregate root.

use serde::Serialize;

use crate::errors::DomainResult;
use crate::pot::Pot;
use crate::types::DepositId;

/// An identified collection of pots; the root of the aggregate.
///
/// A deposit is owned by exactly one investor, but the ownership is recorded
/// only as a foreign association at persistence time, never embedded here.
/// Pots are appended, never removed. No cross-pot invariant exists at this
/// level: duplicate pot names and empty pot lists are both permitted
/// (wrapper-type uniqueness is per pot, enforced by
/// [`Pot::add_account`](crate::pot::Pot::add_account)).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Deposit {
    id: DepositId,
    pots: Vec<Pot>,
}

impl Deposit {
    /// Creates a new deposit with a fresh identifier and no pots.
    pub fn new() -> Self {
        Self {
            id: DepositId::generate(),
            pots: Vec::new(),
        }
    }

    /// Reconstructs a deposit from persisted state, with no pots attached.
    ///
    /// # Errors
    ///
    /// Returns a [`DomainError`](crate::errors::DomainError) if the
    /// identifier is malformed.
    pub fn parse(id: &str) -> DomainResult<Self> {
        Ok(Self {
            id: DepositId::parse(id)?,
            pots: Vec::new(),
        })
    }

    /// Appends a pot to this deposit. Unconditional.
    pub fn add_pot(&mut self, pot: Pot) {
        self.pots.push(pot);
    }

    /// The deposit's unique identifier.
    pub const fn id(&self) -> DepositId {
        self.id
    }

    /// The deposit's pots, in insertion order.
    pub fn pots(&self) -> &[Pot] {
        &self.pots
    }
}

impl Default for Deposit {
    fn default() -> Self {
        Self::new()
    }
}
