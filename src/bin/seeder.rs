use anyhow::Result;
use clap::Parser;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

use gcs_index_server::config::{SeederArgs, WRITER_POOL_SIZE};
use gcs_index_server::db::Database;
use gcs_index_server::gcp::storage::StorageClient;
use gcs_index_server::services::index_service::IndexService;
use gcs_index_server::services::seed_service::SeedService;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = SeederArgs::parse();
    tracing::info!(bucket = %args.bucket_id, database = %args.database_url, "starting seeding service");

    let db = Database::connect(&args.database_url, WRITER_POOL_SIZE).await?;
    db.create_tables().await?;

    let client = StorageClient::from_env();
    client.bucket_attrs(&args.bucket_id).await?;

    let seeder = SeedService::new(IndexService::new(db.pool.clone()));

    let start = Instant::now();
    let report = seeder.run(client.list_objects(&args.bucket_id)).await?;

    // Indexes and compaction are deferred until the data is in so the
    // bulk inserts stay linear.
    db.create_indexes().await?;

    tracing::info!(
        inserted = report.inserted,
        conflicts = report.conflicts,
        "seeding completed in {:?}",
        start.elapsed()
    );
    Ok(())
}
