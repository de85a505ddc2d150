use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, instrument};

use crate::contract::model::{
    InventoryItem, Purchase, Transaction, TransferHistory, User, Wallet,
};
use crate::domain::auth::AuthService;
use crate::domain::catalog::Catalog;
use crate::domain::error::DomainError;
use crate::domain::ledger::Ledger;
use crate::domain::repo::{
    CatalogRepository, LedgerRepository, PurchasesRepository, UsersRepository,
};
use crate::domain::shop::Shop;
use crate::domain::token::TokenCodec;

/// Configuration for the domain service
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub initial_balance: i64,
    pub jwt_secret: String,
    pub token_ttl: Duration,
    pub transaction_timeout: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            initial_balance: 1000,
            jwt_secret: crate::config::DEFAULT_JWT_SECRET.to_string(),
            token_ttl: Duration::from_secs(24 * 60 * 60),
            transaction_timeout: Duration::from_secs(5),
        }
    }
}

/// Storage ports the service is built from.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UsersRepository>,
    pub ledger: Arc<dyn LedgerRepository>,
    pub catalog: Arc<dyn CatalogRepository>,
    pub purchases: Arc<dyn PurchasesRepository>,
}

/// Use-case facade. Every operation on behalf of a user takes that user explicitly.
#[derive(Clone)]
pub struct Service {
    users: Arc<dyn UsersRepository>,
    auth: AuthService,
    ledger: Ledger,
    shop: Shop,
}

impl Service {
    pub fn new(repos: Repositories, config: ServiceConfig) -> Self {
        let tokens = TokenCodec::new(config.jwt_secret.as_bytes(), config.token_ttl);
        let auth = AuthService::new(repos.users.clone(), tokens, config.initial_balance);
        let ledger = Ledger::new(repos.ledger, config.transaction_timeout);
        let catalog = Catalog::new(repos.catalog);
        let shop = Shop::new(catalog, ledger.clone(), repos.purchases);
        Self {
            users: repos.users,
            auth,
            ledger,
            shop,
        }
    }

    pub async fn authenticate(&self, username: &str, password: &str) -> Result<String, DomainError> {
        self.auth.authenticate(username, password).await
    }

    pub async fn resolve(&self, token: &str) -> Result<User, DomainError> {
        self.auth.resolve(token).await
    }

    #[instrument(
        name = "company_store.service.send_coin",
        skip(self, from),
        fields(from_user = from.id)
    )]
    pub async fn send_coin(
        &self,
        from: &User,
        to_username: &str,
        amount: i64,
    ) -> Result<Transaction, DomainError> {
        if to_username.trim().is_empty() {
            return Err(DomainError::validation("toUser", "must not be empty"));
        }
        if amount <= 0 {
            return Err(DomainError::validation("amount", "must be positive"));
        }

        let recipient = self
            .users
            .find_by_username(to_username)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?
            .ok_or_else(|| DomainError::recipient_not_found(to_username))?;

        self.ledger.transfer(from.id, recipient.user.id, amount).await
    }

    pub async fn buy(&self, user: &User, item: &str) -> Result<Purchase, DomainError> {
        if item.trim().is_empty() {
            return Err(DomainError::validation("item", "must not be empty"));
        }
        let purchase = self.shop.purchase(user, item).await?;
        info!(user_id = user.id, merch = %purchase.merch_name, "item bought");
        Ok(purchase)
    }

    pub async fn list_transfers(&self, user: &User) -> Result<TransferHistory, DomainError> {
        self.ledger.list_transfers(user.id).await
    }

    pub async fn list_purchases(&self, user: &User) -> Result<Vec<Purchase>, DomainError> {
        self.shop.list_purchases(user).await
    }

    /// Fresh balance, inventory aggregated per item name, and transfer history.
    #[instrument(name = "company_store.service.wallet", skip(self, user), fields(user_id = user.id))]
    pub async fn wallet(&self, user: &User) -> Result<Wallet, DomainError> {
        let load_user = async {
            self.users
                .find_by_id(user.id)
                .await
                .map_err(|e| DomainError::database(e.to_string()))?
                .ok_or_else(|| DomainError::user_not_found(user.id))
        };

        let (current, purchases, history) = futures::try_join!(
            load_user,
            self.shop.list_purchases(user),
            self.ledger.list_transfers(user.id),
        )?;

        let inventory = aggregate_inventory(&purchases);
        debug!(items = inventory.len(), "wallet assembled");

        Ok(Wallet {
            coins: current.coin_balance,
            inventory,
            history,
        })
    }
}

/// Sum quantities per merch name, ordered by name.
pub fn aggregate_inventory(purchases: &[Purchase]) -> Vec<InventoryItem> {
    let mut totals: BTreeMap<&str, i64> = BTreeMap::new();
    for p in purchases {
        *totals.entry(p.merch_name.as_str()).or_default() += i64::from(p.quantity);
    }
    totals
        .into_iter()
        .map(|(name, quantity)| InventoryItem {
            name: name.to_owned(),
            quantity,
        })
        .collect()
}
