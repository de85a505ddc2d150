use async_trait::async_trait;

use crate::contract::{
    error::CompanyStoreError,
    model::{Purchase, Transaction, TransferHistory, User, Wallet},
};

/// Public API trait for the company_store module that other modules can use
#[async_trait]
pub trait CompanyStoreApi: Send + Sync {
    /// Log in, creating the account on first use. Returns a bearer token.
    async fn authenticate(&self, username: &str, password: &str)
        -> Result<String, CompanyStoreError>;

    /// Resolve a bearer token to the current user.
    async fn resolve(&self, token: &str) -> Result<User, CompanyStoreError>;

    /// Move coins from `from` to the user named `to_username`.
    async fn send_coin(
        &self,
        from: &User,
        to_username: &str,
        amount: i64,
    ) -> Result<Transaction, CompanyStoreError>;

    /// Buy one unit of the named merch item.
    async fn buy(&self, user: &User, item: &str) -> Result<Purchase, CompanyStoreError>;

    async fn list_transfers(&self, user: &User) -> Result<TransferHistory, CompanyStoreError>;

    async fn list_purchases(&self, user: &User) -> Result<Vec<Purchase>, CompanyStoreError>;

    /// Balance, inventory and transfer history in one call.
    async fn wallet(&self, user: &User) -> Result<Wallet, CompanyStoreError>;
}
