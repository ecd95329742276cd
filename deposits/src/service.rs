//! Service-layer orchestration of the create and receive-receipt workflows.

use thiserror::Error;
use tracing::{info, instrument};

use crate::deposit::Deposit;
use crate::errors::{DomainError, RepositoryError};
use crate::investor::Investor;
use crate::receipt::Receipt;
use crate::repository::{AccountRepository, DepositRepository, InvestorRepository};
use crate::types::{AccountId, DepositId, InvestorId};

/// A convenient `Result` alias for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Failures surfaced by the services.
///
/// Domain rejections propagate unchanged so callers can map them to "bad
/// request" responses; repository faults surface as internal failures.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A domain rule rejected the request. The affected entities are
    /// unchanged, in memory and in storage.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The underlying store failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Orchestrates the transactional creation of deposits and the
/// receive-receipt workflow.
///
/// The service performs no re-validation on create: the in-memory [`Deposit`]
/// already satisfies every domain invariant by construction, so this layer
/// only sequences the persistence calls. Writes are best-effort and ordered;
/// a failure part-way leaves earlier rows persisted (see the crate docs on
/// atomicity).
pub struct DepositsService<D, A> {
    deposits: D,
    accounts: A,
}

impl<D, A> DepositsService<D, A>
where
    D: DepositRepository,
    A: AccountRepository,
{
    /// Creates a service over the given repositories.
    pub const fn new(deposits: D, accounts: A) -> Self {
        Self { deposits, accounts }
    }

    /// Persists a full deposit aggregate: the deposit header, then each pot
    /// in order, then each pot's accounts in order.
    ///
    /// # Errors
    ///
    /// Returns the first repository failure; earlier rows stay persisted and
    /// no compensating rollback is attempted at this layer.
    #[instrument(skip(self, deposit), fields(deposit_id = %deposit.id(), investor_id = %investor_id))]
    pub async fn create(&self, investor_id: InvestorId, deposit: &Deposit) -> ServiceResult<()> {
        self.deposits.save_deposit(investor_id, deposit).await?;

        for pot in deposit.pots() {
            self.deposits.save_pot(deposit.id(), pot).await?;

            for account in pot.accounts() {
                self.deposits.save_account(pot.id(), account).await?;
            }
        }

        info!(
            pots = deposit.pots().len(),
            "deposit aggregate persisted"
        );
        Ok(())
    }

    /// Loads the fully reassembled deposit aggregate.
    ///
    /// # Errors
    ///
    /// Returns a repository failure if the deposit does not exist or a row
    /// fails domain validation on load.
    #[instrument(skip(self))]
    pub async fn get(&self, deposit_id: DepositId) -> ServiceResult<Deposit> {
        let deposit = self.deposits.get_full_deposit(deposit_id).await?;
        Ok(deposit)
    }

    /// Applies a receipt to an account and persists the result.
    ///
    /// The account is loaded fresh from the repository so the ceiling check
    /// runs against the latest persisted total, not a stale in-memory copy.
    /// On acceptance the receipt row is written first, then the account's
    /// updated total.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::NominalExceeded`] (wrapped) if the account is
    /// capped and the prospective total exceeds its nominal amount; nothing
    /// is persisted in that case. Otherwise returns the first repository
    /// failure.
    #[instrument(skip(self, receipt), fields(receipt_id = %receipt.id()))]
    pub async fn receive_receipt(
        &self,
        account_id: AccountId,
        receipt: Receipt,
    ) -> ServiceResult<Receipt> {
        let mut account = self.accounts.get_account(account_id).await?;

        account.add_receipt(receipt.clone())?;

        self.accounts.save_receipt(account_id, &receipt).await?;
        self.accounts.update_account(&account).await?;

        info!(
            total = %account.total_allocated_amount(),
            "receipt applied"
        );
        Ok(receipt)
    }
}

/// Onboards investors.
pub struct InvestorsService<R> {
    repository: R,
}

impl<R> InvestorsService<R>
where
    R: InvestorRepository,
{
    /// Creates a service over the given repository.
    pub const fn new(repository: R) -> Self {
        Self { repository }
    }

    /// Persists a pre-validated investor.
    ///
    /// The only validation (non-blank name) already happened when the
    /// [`Investor`] was constructed.
    ///
    /// # Errors
    ///
    /// Returns the repository failure if the write fails.
    #[instrument(skip(self, investor), fields(investor_id = %investor.id()))]
    pub async fn onboard(&self, investor: &Investor) -> ServiceResult<()> {
        self.repository.save_investor(investor).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{Account, WrapperType};
    use crate::errors::RepositoryResult;
    use crate::pot::Pot;
    use crate::types::{AllocatedAmount, NominalAmount, PotId, PotName};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records every repository call and fails once a configured call count
    /// is reached, for probing the ordered best-effort create workflow.
    #[derive(Default)]
    struct RecordingRepository {
        calls: Mutex<Vec<String>>,
        fail_on_call: Option<usize>,
        stored_account: Mutex<Option<Account>>,
    }

    impl RecordingRepository {
        fn failing_on(call: usize) -> Self {
            Self {
                fail_on_call: Some(call),
                ..Self::default()
            }
        }

        fn with_account(account: Account) -> Self {
            Self {
                stored_account: Mutex::new(Some(account)),
                ..Self::default()
            }
        }

        fn record(&self, call: impl Into<String>) -> RepositoryResult<()> {
            let mut calls = self.calls.lock().unwrap();
            calls.push(call.into());
            if Some(calls.len()) == self.fail_on_call {
                return Err(RepositoryError::SaveFailed {
                    entity: "test",
                    source: "induced failure".into(),
                });
            }
            Ok(())
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl DepositRepository for &RecordingRepository {
        async fn save_deposit(
            &self,
            _investor_id: InvestorId,
            deposit: &Deposit,
        ) -> RepositoryResult<()> {
            self.record(format!("deposit:{}", deposit.id()))
        }

        async fn save_pot(&self, _deposit_id: DepositId, pot: &Pot) -> RepositoryResult<()> {
            self.record(format!("pot:{}", pot.name()))
        }

        async fn save_account(&self, _pot_id: PotId, account: &Account) -> RepositoryResult<()> {
            self.record(format!("account:{}", account.wrapper_type()))
        }

        async fn get_full_deposit(&self, deposit_id: DepositId) -> RepositoryResult<Deposit> {
            Err(RepositoryError::DepositNotFound(deposit_id))
        }
    }

    #[async_trait]
    impl AccountRepository for &RecordingRepository {
        async fn get_account(&self, account_id: AccountId) -> RepositoryResult<Account> {
            self.stored_account
                .lock()
                .unwrap()
                .clone()
                .ok_or(RepositoryError::AccountNotFound(account_id))
        }

        async fn update_account(&self, account: &Account) -> RepositoryResult<()> {
            self.record(format!("update:{}", account.total_allocated_amount()))
        }

        async fn save_receipt(
            &self,
            _account_id: AccountId,
            _receipt: &Receipt,
        ) -> RepositoryResult<()> {
            self.record("receipt")
        }
    }

    fn sample_deposit() -> Deposit {
        let mut deposit = Deposit::new();
        let mut pot_a = Pot::new(PotName::try_new("Pot A").unwrap());
        pot_a
            .add_account(Account::new(
                WrapperType::Gia,
                NominalAmount::try_new(5_000).unwrap(),
            ))
            .unwrap();
        pot_a
            .add_account(Account::new(
                WrapperType::Isa,
                NominalAmount::try_new(20_000).unwrap(),
            ))
            .unwrap();
        let mut pot_b = Pot::new(PotName::try_new("Pot B").unwrap());
        pot_b
            .add_account(Account::new(
                WrapperType::Sipp,
                NominalAmount::try_new(40_000).unwrap(),
            ))
            .unwrap();
        deposit.add_pot(pot_a);
        deposit.add_pot(pot_b);
        deposit
    }

    #[tokio::test]
    async fn create_persists_the_aggregate_in_nesting_order() {
        let repo = RecordingRepository::default();
        let service = DepositsService::new(&repo, &repo);
        let deposit = sample_deposit();

        service
            .create(InvestorId::generate(), &deposit)
            .await
            .unwrap();

        let calls = repo.calls();
        assert_eq!(calls.len(), 6);
        assert!(calls[0].starts_with("deposit:"));
        assert_eq!(calls[1], "pot:Pot A");
        assert_eq!(calls[2], "account:GIA");
        assert_eq!(calls[3], "account:ISA");
        assert_eq!(calls[4], "pot:Pot B");
        assert_eq!(calls[5], "account:SIPP");
    }

    #[tokio::test]
    async fn create_aborts_on_the_first_failure() {
        // Fail while saving the first pot: the deposit header is already
        // persisted, nothing after the failure is attempted.
        let repo = RecordingRepository::failing_on(2);
        let service = DepositsService::new(&repo, &repo);

        let result = service
            .create(InvestorId::generate(), &sample_deposit())
            .await;

        assert!(matches!(
            result,
            Err(ServiceError::Repository(RepositoryError::SaveFailed { .. }))
        ));
        assert_eq!(repo.calls().len(), 2);
    }

    #[tokio::test]
    async fn receive_receipt_saves_the_receipt_before_the_account() {
        let account = Account::new(WrapperType::Isa, NominalAmount::try_new(20_000).unwrap());
        let account_id = account.id();
        let repo = RecordingRepository::with_account(account);
        let service = DepositsService::new(&repo, &repo);

        let receipt = Receipt::new(AllocatedAmount::try_new(18_000).unwrap());
        let returned = service
            .receive_receipt(account_id, receipt.clone())
            .await
            .unwrap();

        assert_eq!(returned, receipt);
        assert_eq!(repo.calls(), vec!["receipt", "update:18000"]);
    }

    #[tokio::test]
    async fn receive_receipt_rejects_a_ceiling_breach_without_persisting() {
        let mut account = Account::new(WrapperType::Isa, NominalAmount::try_new(20_000).unwrap());
        account
            .add_receipt(Receipt::new(AllocatedAmount::try_new(18_000).unwrap()))
            .unwrap();
        let account_id = account.id();
        let repo = RecordingRepository::with_account(account);
        let service = DepositsService::new(&repo, &repo);

        let result = service
            .receive_receipt(
                account_id,
                Receipt::new(AllocatedAmount::try_new(3_000).unwrap()),
            )
            .await;

        assert!(matches!(
            result,
            Err(ServiceError::Domain(DomainError::NominalExceeded {
                nominal: 20_000,
                candidate: 21_000,
            }))
        ));
        // Neither the receipt nor the account update was written.
        assert!(repo.calls().is_empty());
    }

    #[tokio::test]
    async fn receive_receipt_for_a_missing_account_is_an_error() {
        let repo = RecordingRepository::default();
        let service = DepositsService::new(&repo, &repo);

        let result = service
            .receive_receipt(
                AccountId::generate(),
                Receipt::new(AllocatedAmount::try_new(100).unwrap()),
            )
            .await;

        assert!(matches!(
            result,
            Err(ServiceError::Repository(
                RepositoryError::AccountNotFound(_)
            ))
        ));
    }
}
