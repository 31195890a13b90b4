//! Command-line configuration for the three binaries.
//!
//! Each binary takes only flags; emulator endpoints and credentials for
//! the external APIs come from the conventional environment variables
//! read by the `gcp` clients.

use clap::Parser;

/// Read pool size for the query API.
pub const READER_POOL_SIZE: u32 = 5;

/// Writers keep a single connection so only one write transaction is
/// ever in flight per index.
pub const WRITER_POOL_SIZE: u32 = 1;

/// HTTP query service over an existing index.
#[derive(Parser, Debug)]
#[command(name = "api", about = "Query API over the metadata index")]
pub struct ApiArgs {
    /// Port for the API to listen on
    #[arg(short, long)]
    pub port: u16,

    /// Database URL holding the index
    #[arg(short, long)]
    pub database_url: String,
}

/// One-shot bulk bootstrap of a fresh index.
#[derive(Parser, Debug)]
#[command(
    name = "seeder",
    about = "Initialise the schema and seed the index from a bucket",
    after_help = "A cancelled seed leaves a partial index; discard the database file and rerun."
)]
pub struct SeederArgs {
    /// Bucket ID to fetch metadata from
    #[arg(short, long)]
    pub bucket_id: String,

    /// Database URL in which to store metadata
    #[arg(short, long)]
    pub database_url: String,
}

/// Long-running reconciler consuming bucket change notifications.
#[derive(Parser, Debug)]
#[command(name = "subscriber", about = "Apply bucket change events to the index")]
pub struct SubscriberArgs {
    /// Project ID where the subscription resides
    #[arg(short, long)]
    pub project_id: String,

    /// Subscription ID to fetch change events from
    #[arg(short, long)]
    pub subscription_id: String,

    /// Database URL in which to store metadata
    #[arg(short, long)]
    pub database_url: String,
}
