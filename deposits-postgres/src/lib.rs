//! PostgreSQL adapter for the deposits allocation domain.
//!
//! Implements the repository traits from the `deposits` crate over the
//! four-table relational layout (deposits, pots, accounts, receipts) plus
//! investors. Each contract operation executes as a single statement in its
//! own implicit transaction; the create workflow's multi-row save is
//! therefore not atomic across rows, matching the documented behavior of the
//! service layer.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use deposits::errors::{RepositoryError, RepositoryResult};
use deposits::repository::{AccountRepository, DepositRepository, InvestorRepository};
use deposits::types::{AccountId, DepositId, InvestorId, PotId};
use deposits::{Account, Deposit, Investor, Pot, Receipt};
use nutype::nutype;
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, Pool, Postgres};
use thiserror::Error;
use tracing::instrument;
use uuid::Uuid;

/// Failures setting up the store itself, before any repository operation.
#[derive(Debug, Error)]
pub enum PostgresStoreError {
    /// The connection pool could not be created.
    #[error("failed to create postgres connection pool")]
    ConnectionFailed(#[source] sqlx::Error),

    /// Schema migrations failed to apply.
    #[error("failed to run postgres migrations")]
    MigrationFailed(#[source] sqlx::migrate::MigrateError),
}

/// Maximum number of database connections in the pool. At least 1, enforced
/// by the `NonZeroU32` underlying type.
#[nutype(derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRef, Into))]
pub struct MaxConnections(std::num::NonZeroU32);

/// Configuration for the [`PostgresStore`] connection pool.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Maximum number of connections in the pool (default: 10).
    pub max_connections: MaxConnections,
    /// Timeout for acquiring a connection from the pool (default: 30s).
    pub acquire_timeout: Duration,
    /// Idle timeout for pooled connections (default: 10 minutes).
    pub idle_timeout: Duration,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        const DEFAULT_MAX_CONNECTIONS: std::num::NonZeroU32 = match std::num::NonZeroU32::new(10)
        {
            Some(v) => v,
            None => unreachable!(),
        };

        Self {
            max_connections: MaxConnections::new(DEFAULT_MAX_CONNECTIONS),
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
        }
    }
}

/// PostgreSQL-backed implementation of every repository trait.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: Pool<Postgres>,
}

impl PostgresStore {
    /// Creates a store with the default pool configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PostgresStoreError::ConnectionFailed`] if the pool cannot
    /// be created.
    pub async fn new<S: Into<String>>(connection_string: S) -> Result<Self, PostgresStoreError> {
        Self::with_config(connection_string, PostgresConfig::default()).await
    }

    /// Creates a store with a custom pool configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PostgresStoreError::ConnectionFailed`] if the pool cannot
    /// be created.
    pub async fn with_config<S: Into<String>>(
        connection_string: S,
        config: PostgresConfig,
    ) -> Result<Self, PostgresStoreError> {
        let connection_string = connection_string.into();
        let max_connections: std::num::NonZeroU32 = config.max_connections.into();
        let pool = PgPoolOptions::new()
            .max_connections(max_connections.get())
            .acquire_timeout(config.acquire_timeout)
            .idle_timeout(config.idle_timeout)
            .connect(&connection_string)
            .await
            .map_err(PostgresStoreError::ConnectionFailed)?;
        Ok(Self { pool })
    }

    /// Creates a store from an existing connection pool.
    ///
    /// Use this when the pool is shared across components or needs settings
    /// beyond [`PostgresConfig`].
    pub const fn from_pool(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Applies the embedded schema migrations.
    ///
    /// # Errors
    ///
    /// Returns [`PostgresStoreError::MigrationFailed`] if any migration
    /// fails to apply.
    pub async fn migrate(&self) -> Result<(), PostgresStoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(PostgresStoreError::MigrationFailed)
    }
}

fn save_failed(entity: &'static str) -> impl FnOnce(sqlx::Error) -> RepositoryError {
    move |source| RepositoryError::SaveFailed {
        entity,
        source: Box::new(source),
    }
}

fn load_failed(entity: &'static str) -> impl FnOnce(sqlx::Error) -> RepositoryError {
    move |source| RepositoryError::LoadFailed {
        entity,
        source: Box::new(source),
    }
}

#[derive(Debug, FromRow)]
struct AccountRow {
    id: Uuid,
    wrapper_type: i32,
    nominal_amount: i64,
    total_allocated_amount: i64,
}

/// One row of the denormalized deposit/pot/account join.
#[derive(Debug, FromRow)]
struct FullDepositRow {
    deposit_id: Uuid,
    pot_id: Uuid,
    pot_name: String,
    account_id: Uuid,
    wrapper_type: i32,
    nominal_amount: i64,
    total_allocated_amount: i64,
}

/// Rebuilds the nested aggregate from flat join rows.
///
/// Rows are grouped by pot id preserving first-seen pot order; each group's
/// accounts are attached in row order. Every row passes through the domain
/// `parse` constructors, so corrupted rows are rejected rather than loaded.
fn assemble_deposit(rows: &[FullDepositRow]) -> RepositoryResult<Deposit> {
    let first = rows
        .first()
        .expect("assemble_deposit requires at least one row");
    let mut deposit =
        Deposit::parse(&first.deposit_id.to_string()).map_err(RepositoryError::CorruptedRow)?;

    let mut pot_indexes: HashMap<Uuid, usize> = HashMap::new();
    let mut pots: Vec<Pot> = Vec::new();

    for row in rows {
        let index = match pot_indexes.get(&row.pot_id) {
            Some(index) => *index,
            None => {
                let pot = Pot::parse(&row.pot_id.to_string(), &row.pot_name)
                    .map_err(RepositoryError::CorruptedRow)?;
                pot_indexes.insert(row.pot_id, pots.len());
                pots.push(pot);
                pots.len() - 1
            }
        };

        let account = Account::parse(
            &row.account_id.to_string(),
            row.wrapper_type,
            row.nominal_amount,
            row.total_allocated_amount,
        )
        .map_err(RepositoryError::CorruptedRow)?;

        pots[index]
            .add_account(account)
            .map_err(RepositoryError::CorruptedRow)?;
    }

    for pot in pots {
        deposit.add_pot(pot);
    }

    Ok(deposit)
}

#[async_trait]
impl DepositRepository for PostgresStore {
    async fn save_deposit(
        &self,
        investor_id: InvestorId,
        deposit: &Deposit,
    ) -> RepositoryResult<()> {
        sqlx::query("INSERT INTO deposits (id, investor_id) VALUES ($1, $2)")
            .bind(deposit.id().into_uuid())
            .bind(investor_id.into_uuid())
            .execute(&self.pool)
            .await
            .map_err(save_failed("deposit"))?;
        Ok(())
    }

    async fn save_pot(&self, deposit_id: DepositId, pot: &Pot) -> RepositoryResult<()> {
        sqlx::query("INSERT INTO pots (id, deposit_id, name) VALUES ($1, $2, $3)")
            .bind(pot.id().into_uuid())
            .bind(deposit_id.into_uuid())
            .bind(pot.name().to_string())
            .execute(&self.pool)
            .await
            .map_err(save_failed("pot"))?;
        Ok(())
    }

    async fn save_account(&self, pot_id: PotId, account: &Account) -> RepositoryResult<()> {
        sqlx::query(
            "INSERT INTO accounts \
             (id, pot_id, wrapper_type, nominal_amount, total_allocated_amount) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(account.id().into_uuid())
        .bind(pot_id.into_uuid())
        .bind(account.wrapper_type().as_i32())
        .bind(i64::from(account.nominal_amount()))
        .bind(i64::from(account.total_allocated_amount()))
        .execute(&self.pool)
        .await
        .map_err(save_failed("account"))?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_full_deposit(&self, deposit_id: DepositId) -> RepositoryResult<Deposit> {
        let rows: Vec<FullDepositRow> = sqlx::query_as(
            "SELECT d.id AS deposit_id, \
                    p.id AS pot_id, \
                    p.name AS pot_name, \
                    a.id AS account_id, \
                    a.wrapper_type AS wrapper_type, \
                    a.nominal_amount AS nominal_amount, \
                    a.total_allocated_amount AS total_allocated_amount \
             FROM deposits d \
             JOIN pots p ON d.id = p.deposit_id \
             JOIN accounts a ON p.id = a.pot_id \
             WHERE d.id = $1",
        )
        .bind(deposit_id.into_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(load_failed("deposit"))?;

        if rows.is_empty() {
            return Err(RepositoryError::DepositNotFound(deposit_id));
        }

        assemble_deposit(&rows)
    }
}

#[async_trait]
impl AccountRepository for PostgresStore {
    #[instrument(skip(self))]
    async fn get_account(&self, account_id: AccountId) -> RepositoryResult<Account> {
        let row: Option<AccountRow> = sqlx::query_as(
            "SELECT id, wrapper_type, nominal_amount, total_allocated_amount \
             FROM accounts WHERE id = $1",
        )
        .bind(account_id.into_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(load_failed("account"))?;

        let row = row.ok_or(RepositoryError::AccountNotFound(account_id))?;

        Account::parse(
            &row.id.to_string(),
            row.wrapper_type,
            row.nominal_amount,
            row.total_allocated_amount,
        )
        .map_err(RepositoryError::CorruptedRow)
    }

    async fn update_account(&self, account: &Account) -> RepositoryResult<()> {
        sqlx::query(
            "UPDATE accounts \
             SET wrapper_type = $2, nominal_amount = $3, total_allocated_amount = $4 \
             WHERE id = $1",
        )
        .bind(account.id().into_uuid())
        .bind(account.wrapper_type().as_i32())
        .bind(i64::from(account.nominal_amount()))
        .bind(i64::from(account.total_allocated_amount()))
        .execute(&self.pool)
        .await
        .map_err(save_failed("account"))?;
        Ok(())
    }

    async fn save_receipt(
        &self,
        account_id: AccountId,
        receipt: &Receipt,
    ) -> RepositoryResult<()> {
        sqlx::query("INSERT INTO receipts (id, account_id, allocated_amount) VALUES ($1, $2, $3)")
            .bind(receipt.id().into_uuid())
            .bind(account_id.into_uuid())
            .bind(i64::from(receipt.allocated_amount()))
            .execute(&self.pool)
            .await
            .map_err(save_failed("receipt"))?;
        Ok(())
    }
}

#[async_trait]
impl InvestorRepository for PostgresStore {
    async fn save_investor(&self, investor: &Investor) -> RepositoryResult<()> {
        sqlx::query("INSERT INTO investors (id, name) VALUES ($1, $2)")
            .bind(investor.id().into_uuid())
            .bind(investor.name().to_string())
            .execute(&self.pool)
            .await
            .map_err(save_failed("investor"))?;
        Ok(())
    }
}
