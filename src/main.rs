//! Server entry point: load config, prepare the database, serve the book API.

use book_catalog::{app, apply_migrations, config, ensure_database_exists, new_pool, AppState, Models};
use std::time::Duration;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let config = config::load()?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("book_catalog=info,tower_http=info"));
    if config.is_production() {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    ensure_database_exists(&config.db.dsn).await?;
    let pool = new_pool(&config.db).await?;
    tracing::info!("database connection pool established");
    apply_migrations(&pool).await?;

    let models = Models::new(pool.clone(), Duration::from_secs(config.query_timeout_secs));
    let port = config.port;
    let env = config.env.clone();
    let state = AppState::new(models, config).with_pool(pool);

    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!(addr = %listener.local_addr()?, env = %env, "starting server");
    axum::serve(listener, app(state)).await?;
    Ok(())
}
