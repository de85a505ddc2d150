use std::sync::Arc;

use axum::Router;
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tracing::{debug, info, warn};

use crate::api::rest::routes;
use crate::config::StoreConfig;
use crate::contract::client::CompanyStoreApi;
use crate::domain::service::{Repositories, Service, ServiceConfig};
use crate::gateways::local::CompanyStoreLocalClient;
use crate::infra::storage::{
    migrations::Migrator, SeaOrmCatalogRepository, SeaOrmLedgerRepository,
    SeaOrmPurchasesRepository, SeaOrmUsersRepository,
};

/// Wiring for the store: config → repositories → service → routes.
#[derive(Clone)]
pub struct CompanyStore {
    db: DatabaseConnection,
    service: Arc<Service>,
}

impl CompanyStore {
    pub fn init(db: DatabaseConnection, cfg: &StoreConfig) -> anyhow::Result<Self> {
        info!("Initializing company_store module");
        cfg.validate()?;
        if cfg.uses_default_secret() {
            warn!("jwt_secret is the built-in development value; set modules.company_store.jwt_secret");
        }
        debug!(
            initial_balance = cfg.initial_balance,
            token_ttl_secs = cfg.token_ttl.as_secs(),
            transaction_timeout_ms = cfg.transaction_timeout.as_millis() as u64,
            "Loaded company_store config"
        );

        let repos = Repositories {
            users: Arc::new(SeaOrmUsersRepository::new(db.clone())),
            ledger: Arc::new(SeaOrmLedgerRepository::new(db.clone())),
            catalog: Arc::new(SeaOrmCatalogRepository::new(db.clone())),
            purchases: Arc::new(SeaOrmPurchasesRepository::new(db.clone())),
        };
        let service = Arc::new(Service::new(repos, ServiceConfig::from(cfg)));

        Ok(Self { db, service })
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        info!("Running company_store database migrations");
        Migrator::up(&self.db, None).await?;
        info!("company_store migrations completed");
        Ok(())
    }

    pub fn service(&self) -> Arc<Service> {
        self.service.clone()
    }

    pub fn client(&self) -> Arc<dyn CompanyStoreApi> {
        Arc::new(CompanyStoreLocalClient::new(self.service.clone()))
    }

    /// REST routes, unprefixed; the server nests them under `/api`.
    pub fn router(&self) -> Router {
        info!("Registering company_store REST routes");
        routes::register_routes(Router::new(), self.service.clone())
    }
}
