use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use axum::{Router, routing::get};
use clap::Parser;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

mod api_types;
mod auth;
mod authz;
mod config;
mod db;
mod middleware;
mod models;
mod observability;
mod routes;
mod services;

#[cfg(test)]
mod tests;

/// Config file looked up in the working directory when `--config` is absent.
const DEFAULT_CONFIG_FILE: &str = "alumni-portal.toml";

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<config::PortalConfig>,
    pub db: Arc<db::DbPool>,
    pub services: services::Services,
    pub google: auth::SharedGoogleVerifier,
    pub tokens: Arc<auth::TokenIssuer>,
}

impl AppState {
    pub fn new(config: config::PortalConfig, db: Arc<db::DbPool>) -> Result<Self, reqwest::Error> {
        let http_client = config.server.http_client.build_client()?;
        let google = Arc::new(auth::GoogleIdTokenVerifier::new(
            config.auth.google.clone(),
            http_client,
        ));
        let tokens = Arc::new(auth::TokenIssuer::new(&config.auth.tokens));

        Ok(Self {
            config: Arc::new(config),
            services: services::Services::new(db.clone()),
            db,
            google,
            tokens,
        })
    }
}

/// Assemble the full router: operational endpoints, public sign-in routes and
/// the session-protected API, wrapped in the shared middleware stack.
pub fn build_app(state: AppState) -> Router {
    let config = state.config.clone();

    let mut app = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/health/live", get(routes::health::liveness))
        .route("/health/ready", get(routes::health::readiness));

    if let Some(path) = config.observability.metrics.scrape_path() {
        app = app.route(path, get(routes::health::metrics));
    }

    app = app
        .merge(routes::public_routes())
        .merge(routes::protected_routes(state.clone()))
        .layer(axum::middleware::from_fn_with_state(
            Duration::from_secs(config.server.timeout_secs),
            middleware::timeout_middleware,
        ))
        .layer(axum::middleware::from_fn(
            middleware::http_metrics_middleware,
        ))
        .layer(axum::middleware::from_fn(middleware::request_id_middleware));

    // Layers run outside-in, so CORS sees preflight requests before anything else
    if let Some(cors_layer) = config.server.cors.clone().into_layer() {
        app = app.layer(cors_layer);
    }

    app.layer(TraceLayer::new_for_http())
        .layer(RequestBodyLimitLayer::new(config.server.body_limit_bytes))
        .with_state(state)
}

#[derive(Parser, Debug)]
#[command(version, about = "Alumni portal API server", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to config file (defaults to ./alumni-portal.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Start the HTTP server (default)
    Serve,
    /// Run database migrations and exit
    Migrate,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let config_path = args
        .config
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    let config = load_config(&config_path);

    if let Err(e) = observability::init_tracing(&config.observability) {
        eprintln!("Failed to initialize tracing: {e}");
        std::process::exit(1);
    }

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => run_server(config, &config_path).await,
        Command::Migrate => run_migrate(config, &config_path).await,
    }
}

fn load_config(path: &Path) -> config::PortalConfig {
    match config::PortalConfig::from_file(path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config from {}: {e}", path.display());
            std::process::exit(1);
        }
    }
}

async fn connect_database(config: &config::PortalConfig) -> db::DbPool {
    if config.database.is_none() {
        tracing::error!("No [database] section configured");
        std::process::exit(1);
    }
    match db::DbPool::from_config(&config.database).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!(error = %e, "Failed to connect to database");
            std::process::exit(1);
        }
    }
}

async fn run_migrate(config: config::PortalConfig, config_path: &Path) {
    tracing::info!(config_file = %config_path.display(), "Running database migrations");

    let pool = connect_database(&config).await;
    if let Err(e) = pool.run_migrations().await {
        tracing::error!(error = %e, "Migration failed");
        std::process::exit(1);
    }
    tracing::info!("Migrations complete");
}

async fn run_server(config: config::PortalConfig, config_path: &Path) {
    if let Err(e) = observability::metrics::init_metrics(&config.observability.metrics) {
        tracing::warn!(error = %e, "Metrics disabled");
    }

    let pool = connect_database(&config).await;
    let migrate_on_start = match &config.database {
        config::DatabaseConfig::Sqlite(sqlite) => sqlite.run_migrations,
        config::DatabaseConfig::None => false,
    };
    if migrate_on_start && let Err(e) = pool.run_migrations().await {
        tracing::error!(error = %e, "Migration failed");
        std::process::exit(1);
    }

    let addr = std::net::SocketAddr::new(config.server.host, config.server.port);
    let state = match AppState::new(config, Arc::new(pool)) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build HTTP client");
            std::process::exit(1);
        }
    };
    let app = build_app(state);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, address = %addr, "Failed to bind");
            std::process::exit(1);
        }
    };

    tracing::info!(
        address = %addr,
        config_file = %config_path.display(),
        version = env!("CARGO_PKG_VERSION"),
        "Alumni portal listening"
    );

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }
    tracing::info!("Shutdown complete");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
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

    tracing::info!("Shutdown signal received, draining in-flight requests");
}
