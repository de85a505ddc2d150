use std::sync::Arc;

use tracing::instrument;

use crate::contract::model::Merch;
use crate::domain::error::DomainError;
use crate::domain::repo::CatalogRepository;

#[derive(Clone)]
pub struct Catalog {
    repo: Arc<dyn CatalogRepository>,
}

impl Catalog {
    pub fn new(repo: Arc<dyn CatalogRepository>) -> Self {
        Self { repo }
    }

    /// Exact, case-sensitive match on the merch name.
    #[instrument(name = "company_store.catalog.get_by_name", skip(self))]
    pub async fn get_by_name(&self, name: &str) -> Result<Merch, DomainError> {
        self.repo
            .find_by_name(name)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?
            .ok_or_else(|| DomainError::merch_not_found(name))
    }
}
