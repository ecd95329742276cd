//! Wrapper-typed accounts and the allocation ceiling rule.
//!
//! An account accumulates receipts against a nominal allocation limit whose
//! enforcement depends on the account's tax-wrapper type: GIA accounts are
//! uncapped, ISA and SIPP accounts may never exceed their nominal amount.

use serde::Serialize;

use crate::errors::{DomainError, DomainResult};
use crate::receipt::Receipt;
use crate::types::{AccountId, NominalAmount, TotalAllocatedAmount};

/// The tax-treatment category of an account.
///
/// The wire representation is a small integer; zero is deliberately unmapped
/// so that an unset wrapper type is always rejected at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum WrapperType {
    /// General investment account: no allocation ceiling.
    Gia = 1,
    /// Individual savings account: capped at the nominal amount.
    Isa = 2,
    /// Self-invested personal pension: capped at the nominal amount.
    Sipp = 3,
}

impl WrapperType {
    /// The wire integer for this wrapper type.
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    /// Whether allocations into this wrapper type are capped at the
    /// account's nominal amount.
    pub const fn is_capped(self) -> bool {
        matches!(self, Self::Isa | Self::Sipp)
    }
}

impl TryFrom<i32> for WrapperType {
    type Error = DomainError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Gia),
            2 => Ok(Self::Isa),
            3 => Ok(Self::Sipp),
            other => Err(DomainError::InvalidWrapperType(other)),
        }
    }
}

impl std::fmt::Display for WrapperType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gia => write!(f, "GIA"),
            Self::Isa => write!(f, "ISA"),
            Self::Sipp => write!(f, "SIPP"),
        }
    }
}

/// A wrapper-typed holder of a nominal limit and a running allocated total.
///
/// # Invariants
///
/// - `total_allocated_amount <= nominal_amount` at all times for capped
///   wrapper types (ISA/SIPP); GIA has no upper bound.
/// - The total starts at zero and only increases; there is no reversal.
///
/// Fields are private so the ceiling rule in [`Account::add_receipt`] is the
/// only way the total changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Account {
    id: AccountId,
    wrapper_type: WrapperType,
    nominal_amount: NominalAmount,
    total_allocated_amount: TotalAllocatedAmount,
    receipts: Vec<Receipt>,
}

impl Account {
    /// Creates a new account with a fresh identifier and a zero total.
    pub fn new(wrapper_type: WrapperType, nominal_amount: NominalAmount) -> Self {
        Self {
            id: AccountId::generate(),
            wrapper_type,
            nominal_amount,
            total_allocated_amount: TotalAllocatedAmount::zero(),
            receipts: Vec::new(),
        }
    }

    /// Reconstructs an account from persisted state.
    ///
    /// Performs the same validation as construction, plus re-checks the
    /// persisted total against the ceiling rule, so corrupted or
    /// manually-edited storage rows are rejected on load rather than trusted
    /// silently. Receipts are not rehydrated; the persisted total is the
    /// authoritative running sum.
    ///
    /// # Errors
    ///
    /// Returns a [`DomainError`] if the identifier is malformed, the wrapper
    /// type integer is unmapped, either amount is negative, or a capped
    /// account's total exceeds its nominal amount.
    pub fn parse(
        id: &str,
        wrapper_type: i32,
        nominal_amount: i64,
        total_allocated_amount: i64,
    ) -> DomainResult<Self> {
        let id = AccountId::parse(id)?;
        let wrapper_type = WrapperType::try_from(wrapper_type)?;
        let nominal_amount = NominalAmount::try_new(nominal_amount)?;
        let total_allocated_amount = TotalAllocatedAmount::try_new(total_allocated_amount)?;

        let total: i64 = total_allocated_amount.into();
        let nominal: i64 = nominal_amount.into();
        if wrapper_type.is_capped() && total > nominal {
            return Err(DomainError::NominalExceeded {
                nominal,
                candidate: total,
            });
        }

        Ok(Self {
            id,
            wrapper_type,
            nominal_amount,
            total_allocated_amount,
            receipts: Vec::new(),
        })
    }

    /// Applies a receipt to this account.
    ///
    /// The check runs against the prospective total, not the receipt amount
    /// alone, so a sequence of small receipts is rejected once their sum
    /// would exceed the ceiling even if no single receipt does. The check
    /// and the apply are a single step: on rejection the account is
    /// unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::NominalExceeded`] if this account is capped
    /// (ISA/SIPP) and the prospective total exceeds the nominal amount, or
    /// [`DomainError::TotalOverflow`] if the prospective total is not
    /// representable.
    pub fn add_receipt(&mut self, receipt: Receipt) -> DomainResult<()> {
        let current: i64 = self.total_allocated_amount.into();
        let amount: i64 = receipt.allocated_amount().into();
        let candidate = current
            .checked_add(amount)
            .ok_or(DomainError::TotalOverflow { current, amount })?;

        let nominal: i64 = self.nominal_amount.into();
        if self.wrapper_type.is_capped() && candidate > nominal {
            return Err(DomainError::NominalExceeded { nominal, candidate });
        }

        self.total_allocated_amount = TotalAllocatedAmount::try_new(candidate)?;
        self.receipts.push(receipt);
        Ok(())
    }

    /// The account's unique identifier.
    pub const fn id(&self) -> AccountId {
        self.id
    }

    /// The account's tax-wrapper type.
    pub const fn wrapper_type(&self) -> WrapperType {
        self.wrapper_type
    }

    /// The configured contribution ceiling.
    pub const fn nominal_amount(&self) -> NominalAmount {
        self.nominal_amount
    }

    /// The running sum of all applied receipts.
    pub const fn total_allocated_amount(&self) -> TotalAllocatedAmount {
        self.total_allocated_amount
    }

    /// The receipts applied to this account in this process, in application
    /// order.
    pub fn receipts(&self) -> &[Receipt] {
        &self.receipts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AllocatedAmount;
    use proptest::prelude::*;

    fn account(wrapper_type: WrapperType, nominal: i64) -> Account {
        Account::new(wrapper_type, NominalAmount::try_new(nominal).unwrap())
    }

    fn receipt(amount: i64) -> Receipt {
        Receipt::new(AllocatedAmount::try_new(amount).unwrap())
    }

    #[test]
    fn wrapper_type_rejects_zero_and_out_of_range_integers() {
        assert!(matches!(
            WrapperType::try_from(0),
            Err(DomainError::InvalidWrapperType(0))
        ));
        assert!(WrapperType::try_from(4).is_err());
        assert!(WrapperType::try_from(-1).is_err());
    }

    #[test]
    fn wrapper_type_maps_defined_integers() {
        assert_eq!(WrapperType::try_from(1).unwrap(), WrapperType::Gia);
        assert_eq!(WrapperType::try_from(2).unwrap(), WrapperType::Isa);
        assert_eq!(WrapperType::try_from(3).unwrap(), WrapperType::Sipp);
        assert_eq!(WrapperType::Sipp.as_i32(), 3);
    }

    #[test]
    fn new_account_starts_with_zero_total_and_no_receipts() {
        let account = account(WrapperType::Isa, 20_000);
        let total: i64 = account.total_allocated_amount().into();
        assert_eq!(total, 0);
        assert!(account.receipts().is_empty());
    }

    #[test]
    fn isa_account_accepts_receipts_up_to_the_nominal_amount() {
        let mut account = account(WrapperType::Isa, 20_000);

        account.add_receipt(receipt(18_000)).unwrap();
        let total: i64 = account.total_allocated_amount().into();
        assert_eq!(total, 18_000);

        // Exactly at the ceiling is still allowed.
        account.add_receipt(receipt(2_000)).unwrap();
        let total: i64 = account.total_allocated_amount().into();
        assert_eq!(total, 20_000);
    }

    #[test]
    fn isa_account_rejects_a_receipt_that_would_exceed_the_nominal_amount() {
        let mut account = account(WrapperType::Isa, 20_000);
        account.add_receipt(receipt(18_000)).unwrap();

        let result = account.add_receipt(receipt(3_000));
        assert!(matches!(
            result,
            Err(DomainError::NominalExceeded {
                nominal: 20_000,
                candidate: 21_000,
            })
        ));

        // The rejected call left the account unchanged.
        let total: i64 = account.total_allocated_amount().into();
        assert_eq!(total, 18_000);
        assert_eq!(account.receipts().len(), 1);
    }

    #[test]
    fn gia_account_has_no_ceiling() {
        let mut account = account(WrapperType::Gia, 10_000);
        account.add_receipt(receipt(100_000)).unwrap();
        let total: i64 = account.total_allocated_amount().into();
        assert_eq!(total, 100_000);
    }

    #[test]
    fn add_receipt_rejects_an_unrepresentable_total() {
        let mut account = account(WrapperType::Gia, 10_000);
        account.add_receipt(receipt(i64::MAX)).unwrap();

        let result = account.add_receipt(receipt(1));
        assert!(matches!(
            result,
            Err(DomainError::TotalOverflow {
                current: i64::MAX,
                amount: 1,
            })
        ));

        // The rejected call left the account unchanged.
        let total: i64 = account.total_allocated_amount().into();
        assert_eq!(total, i64::MAX);
        assert_eq!(account.receipts().len(), 1);
    }

    #[test]
    fn parse_rejects_a_capped_total_above_the_nominal_amount() {
        let id = AccountId::generate().to_string();
        let result = Account::parse(&id, WrapperType::Sipp.as_i32(), 40_000, 40_001);
        assert!(matches!(result, Err(DomainError::NominalExceeded { .. })));
    }

    #[test]
    fn parse_accepts_a_gia_total_above_the_nominal_amount() {
        let id = AccountId::generate().to_string();
        let account = Account::parse(&id, WrapperType::Gia.as_i32(), 10_000, 250_000).unwrap();
        let total: i64 = account.total_allocated_amount().into();
        assert_eq!(total, 250_000);
    }

    #[test]
    fn parse_rejects_unmapped_wrapper_types() {
        let id = AccountId::generate().to_string();
        assert!(matches!(
            Account::parse(&id, 0, 1_000, 0),
            Err(DomainError::InvalidWrapperType(0))
        ));
    }

    #[test]
    fn parse_rejects_negative_amounts() {
        let id = AccountId::generate().to_string();
        assert!(Account::parse(&id, 2, -1, 0).is_err());
        assert!(Account::parse(&id, 2, 1_000, -1).is_err());
    }

    proptest! {
        /// For capped wrapper types, no sequence of receipts can push the
        /// total past the nominal amount; rejected receipts leave the total
        /// unchanged.
        #[test]
        fn capped_total_never_exceeds_nominal(
            capped in prop_oneof![Just(WrapperType::Isa), Just(WrapperType::Sipp)],
            nominal in 0i64..1_000_000,
            amounts in proptest::collection::vec(0i64..500_000, 0..20),
        ) {
            let mut account = Account::new(capped, NominalAmount::try_new(nominal).unwrap());

            for amount in amounts {
                let before: i64 = account.total_allocated_amount().into();
                let result = account.add_receipt(receipt(amount));
                let after: i64 = account.total_allocated_amount().into();

                if result.is_ok() {
                    prop_assert_eq!(after, before + amount);
                } else {
                    prop_assert_eq!(after, before);
                }
                prop_assert!(after <= nominal);
            }
        }

        /// GIA accounts accept any non-negative receipt regardless of the
        /// nominal amount.
        #[test]
        fn gia_accepts_any_non_negative_sequence(
            nominal in 0i64..1_000_000,
            amounts in proptest::collection::vec(0i64..500_000, 0..20),
        ) {
            let mut account = Account::new(
                WrapperType::Gia,
                NominalAmount::try_new(nominal).unwrap(),
            );

            let mut expected = 0i64;
            for amount in amounts {
                account.add_receipt(receipt(amount)).unwrap();
                expected += amount;
            }
            let total: i64 = account.total_allocated_amount().into();
            prop_assert_eq!(total, expected);
        }
    }
}
