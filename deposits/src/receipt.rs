//! Receipts: immutable records of a single incoming allocation.

use serde::Serialize;

use crate::errors::DomainResult;
use crate::types::{AllocatedAmount, ReceiptId};

/// An immutable record of one amount allocated to an account.
///
/// A receipt does not know its target account: the association is recorded by
/// the service layer when the receipt is persisted, after
/// [`Account::add_receipt`](crate::account::Account::add_receipt) has
/// accepted it. Once created, a receipt is never mutated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Receipt {
    id: ReceiptId,
    allocated_amount: AllocatedAmount,
}

impl Receipt {
    /// Creates a new receipt with a fresh identifier.
    pub fn new(allocated_amount: AllocatedAmount) -> Self {
        Self {
            id: ReceiptId::generate(),
            allocated_amount,
        }
    }

    /// Reconstructs a receipt from persisted state.
    ///
    /// # Errors
    ///
    /// Returns a [`DomainError`](crate::errors::DomainError) if the
    /// identifier is malformed or the amount is negative.
    pub fn parse(id: &str, allocated_amount: i64) -> DomainResult<Self> {
        Ok(Self {
            id: ReceiptId::parse(id)?,
            allocated_amount: AllocatedAmount::try_new(allocated_amount)?,
        })
    }

    /// The receipt's unique identifier.
    pub const fn id(&self) -> ReceiptId {
        self.id
    }

    /// The amount this receipt allocates.
    pub const fn allocated_amount(&self) -> AllocatedAmount {
        self.allocated_amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::DomainError;

    #[test]
    fn new_receipt_carries_the_given_amount() {
        let receipt = Receipt::new(AllocatedAmount::try_new(1_500).unwrap());
        let amount: i64 = receipt.allocated_amount().into();
        assert_eq!(amount, 1_500);
    }

    #[test]
    fn parse_rejects_negative_amounts() {
        let id = ReceiptId::generate().to_string();
        let result = Receipt::parse(&id, -1);
        assert!(matches!(
            result,
            Err(DomainError::NegativeAmount {
                amount: "allocated"
            })
        ));
    }

    #[test]
    fn parse_rejects_malformed_ids() {
        assert!(matches!(
            Receipt::parse("not-a-uuid", 100),
            Err(DomainError::InvalidId { .. })
        ));
    }

    #[test]
    fn parse_roundtrips_a_new_receipt() {
        let receipt = Receipt::new(AllocatedAmount::try_new(42).unwrap());
        let parsed = Receipt::parse(&receipt.id().to_string(), 42).unwrap();
        assert_eq!(receipt, parsed);
    }
}
