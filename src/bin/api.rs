use anyhow::Result;
use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use gcs_index_server::config::{ApiArgs, READER_POOL_SIZE};
use gcs_index_server::db::Database;
use gcs_index_server::errors::IndexError;
use gcs_index_server::routes;
use gcs_index_server::services::index_service::IndexService;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = ApiArgs::parse();

    let db = Database::connect(&args.database_url, READER_POOL_SIZE).await?;
    if !db.ping_table().await? {
        return Err(IndexError::Fatal(
            "database has not been initialized; run the seeder first".to_string(),
        )
        .into());
    }

    let store = IndexService::new(db.pool.clone());
    let app = routes::routes::routes().with_state(store);

    let addr = format!("0.0.0.0:{}", args.port);
    tracing::info!("starting server on {addr}");

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutting down");
}
