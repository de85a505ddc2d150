use async_trait::async_trait;
use std::sync::Arc;

use crate::contract::{
    client::CompanyStoreApi,
    error::CompanyStoreError,
    model::{Purchase, Transaction, TransferHistory, User, Wallet},
};
use crate::domain::service::Service;

/// Local implementation of the CompanyStoreApi trait that delegates to the domain service
pub struct CompanyStoreLocalClient {
    service: Arc<Service>,
}

impl CompanyStoreLocalClient {
    pub fn new(service: Arc<Service>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl CompanyStoreApi for CompanyStoreLocalClient {
    async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<String, CompanyStoreError> {
        self.service
            .authenticate(username, password)
            .await
            .map_err(Into::into)
    }

    async fn resolve(&self, token: &str) -> Result<User, CompanyStoreError> {
        self.service.resolve(token).await.map_err(Into::into)
    }

    async fn send_coin(
        &self,
        from: &User,
        to_username: &str,
        amount: i64,
    ) -> Result<Transaction, CompanyStoreError> {
        self.service
            .send_coin(from, to_username, amount)
            .await
            .map_err(Into::into)
    }

    async fn buy(&self, user: &User, item: &str) -> Result<Purchase, CompanyStoreError> {
        self.service.buy(user, item).await.map_err(Into::into)
    }

    async fn list_transfers(&self, user: &User) -> Result<TransferHistory, CompanyStoreError> {
        self.service.list_transfers(user).await.map_err(Into::into)
    }

    async fn list_purchases(&self, user: &User) -> Result<Vec<Purchase>, CompanyStoreError> {
        self.service.list_purchases(user).await.map_err(Into::into)
    }

    async fn wallet(&self, user: &User) -> Result<Wallet, CompanyStoreError> {
        self.service.wallet(user).await.map_err(Into::into)
    }
}
