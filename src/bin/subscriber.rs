use anyhow::Result;
use clap::Parser;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use gcs_index_server::config::{SubscriberArgs, WRITER_POOL_SIZE};
use gcs_index_server::db::Database;
use gcs_index_server::errors::IndexError;
use gcs_index_server::gcp::pubsub::PubSubClient;
use gcs_index_server::services::index_service::IndexService;
use gcs_index_server::services::subscribe_service::{Disposition, SubscriberService};

const MAX_PULL_MESSAGES: usize = 100;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = SubscriberArgs::parse();
    tracing::info!(
        project = %args.project_id,
        subscription = %args.subscription_id,
        database = %args.database_url,
        "starting subscriber service"
    );

    let db = Database::connect(&args.database_url, WRITER_POOL_SIZE).await?;
    if !db.ping_table().await? {
        return Err(IndexError::Fatal(
            "database has not been initialized; run the seeder first".to_string(),
        )
        .into());
    }

    let service = SubscriberService::new(IndexService::new(db.pool.clone()));
    let client = PubSubClient::from_env(&args.project_id, &args.subscription_id);

    // Messages are applied one at a time; combined with the single-
    // connection write pool this keeps exactly one write transaction in
    // flight per index.
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutting down");
                break;
            }
            pulled = client.pull(MAX_PULL_MESSAGES) => match pulled {
                Ok(messages) if messages.is_empty() => {
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
                Ok(messages) => {
                    let mut acks = Vec::new();
                    let mut nacks = Vec::new();
                    for message in messages {
                        match service.consume(&message.attributes, &message.data).await {
                            Disposition::Ack => acks.push(message.ack_id),
                            Disposition::Nack => nacks.push(message.ack_id),
                        }
                    }
                    if let Err(err) = client.acknowledge(&acks).await {
                        tracing::warn!(error = %err, "failed to acknowledge messages");
                    }
                    if let Err(err) = client.nack(&nacks).await {
                        tracing::warn!(error = %err, "failed to nack messages");
                    }
                }
                Err(err) => {
                    tracing::warn!(error = %err, "error receiving messages");
                    tokio::time::sleep(Duration::from_secs(5)).await;
                }
            }
        }
    }

    Ok(())
}
