//! Read-path views: directory listings and per-tier summaries.

use serde::Serialize;

/// One entry of a directory listing, either an immediate sub-directory
/// (aggregated size and count, empty storage class) or a direct child
/// object (own size, `count` 0, storage class set).
#[derive(Serialize, Clone, Debug)]
pub struct Item {
    pub name: String,

    pub parent: String,

    /// Empty for directories.
    #[serde(rename = "storageClass")]
    pub storage_class: String,

    /// Aggregate bytes for directories, object bytes otherwise.
    pub size: i64,

    /// Descendant object count for directories, 0 for objects.
    pub count: i64,

    /// Estimated USD/month at the default location.
    pub cost: f64,
}

/// Bytes held in each storage tier.
#[derive(Serialize, Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct TierSizes {
    pub standard: i64,
    pub nearline: i64,
    pub coldline: i64,
    pub archive: i64,
}

/// Estimated USD/month per storage tier.
#[derive(Serialize, Clone, Copy, Default, Debug)]
pub struct TierCosts {
    pub standard: f64,
    pub nearline: f64,
    pub coldline: f64,
    pub archive: f64,
}

/// Per-tier totals of a single directory. A path with no directory row
/// summarises to zero rather than an error.
#[derive(Serialize, Clone, Debug)]
pub struct Summary {
    pub path: String,
    pub size: TierSizes,
    pub cost: TierCosts,
}
