use axum::Router;
use migration::MigratorTrait;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::todo::api::v1::TodoState;

pub mod api;

/// Lifetime given to the only connection of an in-memory database.
const IN_MEMORY_CONNECTION_LIFETIME: Duration = Duration::from_secs(u32::MAX as u64);

/// Pool options for `db_url`.
///
/// In-memory SQLite databases live and die with a single connection, so the
/// pool holds exactly one and never recycles it.
pub fn connect_options(db_url: &str) -> ConnectOptions {
    let mut options = ConnectOptions::new(db_url);
    if db_url.contains(":memory:") {
        options
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(IN_MEMORY_CONNECTION_LIFETIME)
            .max_lifetime(IN_MEMORY_CONNECTION_LIFETIME);
    }
    options.sqlx_logging(false);
    options
}

/// Connects to the database at `db_url` and applies all pending migrations.
#[tracing::instrument(skip(db_url))]
pub async fn connect_database(db_url: &str) -> anyhow::Result<DatabaseConnection> {
    let db = Database::connect(connect_options(db_url)).await?;
    migration::Migrator::up(&db, None).await?;
    tracing::info!("Database migrations applied successfully");
    Ok(db)
}

/// Turns a configured base path into the form routes are nested under:
/// a leading slash, no trailing slash, and empty for the root.
pub fn normalize_base_path(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}

/// Builds the application router: the JSON API under `base_path` plus the
/// health check at the root.
pub fn create_app(db: DatabaseConnection, base_path: &str) -> Router {
    let base_path = normalize_base_path(base_path);
    let todo_state = Arc::new(TodoState {
        db: Arc::new(db),
        base_path: base_path.clone(),
    });
    let api_router = api::create_api_router(todo_state);

    let routes = if base_path.is_empty() {
        api_router
    } else {
        Router::new().nest(&base_path, api_router)
    };

    Router::new()
        .route("/health", axum::routing::get(health_check_handler))
        .merge(routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

#[tracing::instrument(skip(config))]
pub async fn start_web_server(config: Config) -> anyhow::Result<()> {
    let db = connect_database(&config.db_url).await?;
    let app = create_app(db, &config.base_path);

    let server_address = format!("0.0.0.0:{}", &config.port);
    let listener = tokio::net::TcpListener::bind(&server_address).await?;
    tracing::info!("Web server running on http://{}", server_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("Web server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

#[tracing::instrument]
pub async fn health_check_handler() -> &'static str {
    "OK"
}
