use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use axum::Router;
use clap::{Parser, Subcommand};
use company_store::{config::StoreConfig, CompanyStore};
use runtime::{AppConfig, DatabaseConfig, Overrides, ServerConfig};
use store_db::{redact_credentials, sqlite::absolutize_sqlite_dsn, ConnectOpts, DbHandle};
use tower_http::{
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
};

mod health;
mod request_id;

use health::HealthState;

const MODULE_NAME: &str = "company_store";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const BODY_LIMIT_BYTES: usize = 16 * 1024 * 1024;

/// Company Store Server - coins, transfers and merch for employees
#[derive(Parser)]
#[command(name = "store-server")]
#[command(about = "Company Store Server - coins, transfers and merch for employees")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port for HTTP server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print current configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Use an in-memory SQLite database
    #[arg(long)]
    mock: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Check configuration
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // home_dir is normalized and created while loading
    let mut config = AppConfig::load(cli.config.as_deref())?;
    config.apply_overrides(&Overrides {
        port: cli.port,
        verbose: cli.verbose,
    });

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    let logging_config = config.logging.clone().unwrap_or_default();
    runtime::logging::init_logging_from_config(&logging_config, Path::new(&config.server.home_dir));
    tracing::info!("Company Store Server starting");

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config, cli.mock).await,
        Commands::Check => check_config(&config, cli.mock),
    }
}

/// Final DSN: in-memory under `--mock`, relative SQLite paths rooted at `home_dir`.
fn resolve_dsn(db: &DatabaseConfig, home_dir: &Path, mock: bool) -> Result<String> {
    if mock {
        return Ok("sqlite::memory:".to_string());
    }
    let dsn = db.url.trim();
    if dsn.is_empty() {
        return Err(anyhow!("Database URL not configured"));
    }
    DbHandle::detect(dsn)?;
    if dsn.starts_with("sqlite") {
        return absolutize_sqlite_dsn(dsn, home_dir)
            .with_context(|| format!("Invalid SQLite DSN '{dsn}'"));
    }
    Ok(dsn.to_string())
}

/// `--mock` works without a `database` section.
fn database_config(config: &AppConfig, mock: bool) -> Option<DatabaseConfig> {
    match (&config.database, mock) {
        (Some(db), _) => Some(db.clone()),
        (None, true) => Some(DatabaseConfig::in_memory()),
        (None, false) => None,
    }
}

fn connect_opts(db: &DatabaseConfig) -> ConnectOpts {
    ConnectOpts {
        max_conns: db.max_conns.or(Some(10)),
        acquire_timeout: Some(Duration::from_secs(5)),
        sqlite_busy_timeout: db.busy_timeout(),
        statement_timeout: db.statement_timeout(),
        create_sqlite_dirs: true,
        ..Default::default()
    }
}

fn request_timeout(server: &ServerConfig) -> Duration {
    match server.timeout_sec {
        0 => Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        n => Duration::from_secs(n),
    }
}

/// Probes at the root, store routes under `/api`, shared middleware around both.
///
/// Each `layer` call wraps everything added before it, so the stack reads
/// innermost first. Outermost to innermost: body limit, CORS, timeout,
/// trace, set request id, propagate request id.
fn build_router(store: &CompanyStore, health: Arc<HealthState>, server: &ServerConfig) -> Router {
    let x_request_id = request_id::header();

    let mut router = Router::new()
        .nest("/api", store.router())
        .merge(health::routes(health));

    // echo the request id back on the response
    router = router.layer(PropagateRequestIdLayer::new(x_request_id.clone()));
    // mint one when the client sent none
    router = router.layer(SetRequestIdLayer::new(x_request_id, request_id::MakeReqId));
    router = router.layer(request_id::create_trace_layer());
    router = router.layer(TimeoutLayer::new(request_timeout(server)));
    if server.cors_enabled {
        router = router.layer(CorsLayer::permissive());
    }
    router.layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES))
}

async fn run_server(config: AppConfig, mock: bool) -> Result<()> {
    let home_dir = PathBuf::from(&config.server.home_dir);
    let db_config = database_config(&config, mock)
        .ok_or_else(|| anyhow!("No database configuration found"))?;

    let dsn = resolve_dsn(&db_config, &home_dir, mock)?;
    tracing::info!("Connecting to database: {}", redact_credentials(&dsn));
    let db = DbHandle::connect(&dsn, connect_opts(&db_config)).await?;
    tracing::info!("Connected DB backend: {:?}", db.engine());

    let store_config: StoreConfig = config.module_config(MODULE_NAME)?;
    let store = CompanyStore::init(db.sea(), &store_config)?;

    let health = Arc::new(HealthState::default());
    let app = build_router(&store, health.clone(), &config.server);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| {
            format!(
                "Invalid listen address {}:{}",
                config.server.host, config.server.port
            )
        })?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("HTTP server bound on {}", listener.local_addr()?);

    // Traffic is accepted right away; /ready reports 503 until the schema is in place.
    let migrations = {
        let store = store.clone();
        let health = health.clone();
        tokio::spawn(async move {
            match store.migrate().await {
                Ok(()) => {
                    health.mark_ready();
                    tracing::info!("Service ready");
                }
                Err(e) => tracing::error!(error = %e, "Database migration failed; staying not ready"),
            }
        })
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(health))
        .await
        .map_err(|e| anyhow!(e))?;

    migrations.abort();
    db.close().await;
    tracing::info!("Company Store Server stopped");
    Ok(())
}

async fn shutdown_signal(health: Arc<HealthState>) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    health.mark_draining();
    tracing::info!("HTTP server shutting down gracefully");
}

fn check_config(config: &AppConfig, mock: bool) -> Result<()> {
    tracing::info!("Checking configuration...");

    let home_dir = Path::new(&config.server.home_dir);
    match database_config(config, mock) {
        Some(db) => {
            let dsn = resolve_dsn(&db, home_dir, mock)?;
            println!("Database: {}", redact_credentials(&dsn));
        }
        None => println!("Database: not configured"),
    }

    let store_config: StoreConfig = config.module_config(MODULE_NAME)?;
    store_config.validate()?;
    if store_config.uses_default_secret() {
        println!("Warning: modules.{MODULE_NAME}.jwt_secret uses the development default");
    }

    tracing::info!("Configuration is valid");
    println!("Configuration check passed");
    println!("{}", config.to_yaml()?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn db_config(url: &str) -> DatabaseConfig {
        DatabaseConfig {
            url: url.to_string(),
            max_conns: None,
            busy_timeout_ms: Some(250),
            statement_timeout_ms: Some(1500),
        }
    }

    #[test]
    fn mock_forces_memory_database() {
        let dsn = resolve_dsn(&db_config("postgres://u:p@h/db"), Path::new("/tmp"), true).unwrap();
        assert_eq!(dsn, "sqlite::memory:");
    }

    #[test]
    fn relative_sqlite_paths_are_rooted_at_home() {
        let dsn = resolve_dsn(&db_config("sqlite://database/store.db"), Path::new("/srv/store"), false)
            .unwrap();
        assert_eq!(dsn, "sqlite:///srv/store/database/store.db");
    }

    #[test]
    fn empty_and_unknown_dsns_fail() {
        assert!(resolve_dsn(&db_config("  "), Path::new("/tmp"), false).is_err());
        assert!(resolve_dsn(&db_config("mysql://h/db"), Path::new("/tmp"), false).is_err());
    }

    #[test]
    fn connect_opts_carry_timeouts() {
        let opts = connect_opts(&db_config("sqlite::memory:"));
        assert_eq!(opts.max_conns, Some(10));
        assert_eq!(opts.sqlite_busy_timeout, Some(Duration::from_millis(250)));
        assert_eq!(opts.statement_timeout, Some(Duration::from_millis(1500)));
    }

    #[test]
    fn zero_timeout_means_default() {
        let mut server = ServerConfig::default();
        assert_eq!(request_timeout(&server), Duration::from_secs(30));
        server.timeout_sec = 5;
        assert_eq!(request_timeout(&server), Duration::from_secs(5));
    }

    #[tokio::test]
    async fn router_serves_probes_and_api_with_request_ids() {
        let db = DbHandle::connect("sqlite::memory:", ConnectOpts::default())
            .await
            .unwrap();
        let store = CompanyStore::init(db.sea(), &StoreConfig::default()).unwrap();
        let health = Arc::new(HealthState::default());
        let app = build_router(&store, health.clone(), &ServerConfig::default());

        let resp = app
            .clone()
            .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(resp.headers().contains_key("x-request-id"));

        store.migrate().await.unwrap();
        health.mark_ready();

        let resp = app
            .clone()
            .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = app
            .clone()
            .oneshot(
                Request::get("/api/info")
                    .header("x-request-id", "req-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(resp.headers()["x-request-id"], "req-123");
    }

    #[tokio::test]
    async fn middleware_limits_bodies_and_mints_request_ids() {
        let db = DbHandle::connect("sqlite::memory:", ConnectOpts::default())
            .await
            .unwrap();
        let store = CompanyStore::init(db.sea(), &StoreConfig::default()).unwrap();
        store.migrate().await.unwrap();
        let server = ServerConfig {
            cors_enabled: true,
            ..Default::default()
        };
        let app = build_router(&store, Arc::new(HealthState::default()), &server);

        let resp = app
            .clone()
            .oneshot(Request::get("/live").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let minted = resp.headers()["x-request-id"].to_str().unwrap();
        assert_eq!(minted.len(), 21);

        let oversized = vec![b' '; BODY_LIMIT_BYTES + 1];
        let resp = app
            .clone()
            .oneshot(
                Request::post("/api/auth")
                    .header("content-type", "application/json")
                    .header("content-length", oversized.len())
                    .body(Body::from(oversized))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);

        let resp = app
            .oneshot(
                Request::get("/api/info")
                    .header("origin", "http://example.test")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert!(resp.headers().contains_key("access-control-allow-origin"));
    }
}
