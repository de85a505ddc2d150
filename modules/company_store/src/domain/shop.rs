use std::sync::Arc;

use tracing::{debug, instrument};

use crate::contract::model::{Purchase, User};
use crate::domain::catalog::Catalog;
use crate::domain::error::DomainError;
use crate::domain::ledger::Ledger;
use crate::domain::repo::PurchasesRepository;

/// Buying merch: catalog lookup, then one atomic debit plus inventory record.
#[derive(Clone)]
pub struct Shop {
    catalog: Catalog,
    ledger: Ledger,
    purchases: Arc<dyn PurchasesRepository>,
}

impl Shop {
    pub fn new(catalog: Catalog, ledger: Ledger, purchases: Arc<dyn PurchasesRepository>) -> Self {
        Self {
            catalog,
            ledger,
            purchases,
        }
    }

    /// One unit per call.
    #[instrument(
        name = "company_store.shop.purchase",
        skip(self, user),
        fields(user_id = user.id)
    )]
    pub async fn purchase(&self, user: &User, merch_name: &str) -> Result<Purchase, DomainError> {
        let merch = self.catalog.get_by_name(merch_name).await?;
        let (_, purchase) = self.ledger.settle_purchase(user.id, &merch, 1).await?;
        Ok(purchase)
    }

    #[instrument(
        name = "company_store.shop.list_purchases",
        skip(self, user),
        fields(user_id = user.id)
    )]
    pub async fn list_purchases(&self, user: &User) -> Result<Vec<Purchase>, DomainError> {
        let rows = self
            .purchases
            .list_by_user(user.id)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;
        debug!(count = rows.len(), "loaded purchases");
        Ok(rows)
    }
}
