use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::contract::model::{Merch, Purchase, Transaction, TransferEntry, User};

/// A user row together with its stored password hash.
/// Never leaves the domain layer.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: String,
}

/// Fully-formed user row; the service computes hash, balance and timestamp.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub coin_balance: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum InsertUserError {
    #[error("username already taken")]
    UsernameTaken,
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Port for user identity persistence.
#[async_trait]
pub trait UsersRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<User>>;
    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<UserCredentials>>;
    /// Insert relying on the store's unique constraint on `username`.
    async fn insert(&self, new_user: NewUser) -> Result<User, InsertUserError>;
}

/// Failure of an atomic ledger mutation. Nothing was committed.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds { requested: i64, available: i64 },
    #[error("user {0} not found")]
    UserNotFound(i64),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Inventory record written in the same unit as a purchase debit.
#[derive(Debug, Clone)]
pub struct PurchaseLine {
    pub merch: Merch,
    pub quantity: i32,
}

#[derive(Debug, Clone)]
pub struct Debit {
    pub transaction: Transaction,
    pub purchase: Option<Purchase>,
}

/// Port for the only code path allowed to change balances.
///
/// Every mutating call is one database transaction: lock the involved user rows,
/// re-check the payer balance, write balances and audit rows, commit.
#[async_trait]
pub trait LedgerRepository: Send + Sync {
    async fn transfer(
        &self,
        from: i64,
        to: i64,
        amount: i64,
        at: DateTime<Utc>,
    ) -> Result<Transaction, LedgerError>;

    async fn debit(
        &self,
        payer: i64,
        amount: i64,
        at: DateTime<Utc>,
        line: Option<PurchaseLine>,
    ) -> Result<Debit, LedgerError>;

    /// Transfers received by `user`, newest first.
    async fn incoming(&self, user: i64) -> anyhow::Result<Vec<TransferEntry>>;

    /// Transfers sent by `user`, newest first.
    async fn outgoing(&self, user: i64) -> anyhow::Result<Vec<TransferEntry>>;
}

/// Read-only merch reference data.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn find_by_name(&self, name: &str) -> anyhow::Result<Option<Merch>>;
}

#[async_trait]
pub trait PurchasesRepository: Send + Sync {
    async fn list_by_user(&self, user: i64) -> anyhow::Result<Vec<Purchase>>;
}
