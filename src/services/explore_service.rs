//! Read path: directory listings and per-tier summaries.
//!
//! Listings are a single prefix scan over both tables. A queried path is
//! always normalised to end in `/`; for prefix matching, root becomes
//! the empty string so matching starts at the bucket origin.

use sqlx::FromRow;
use std::str::FromStr;

use crate::errors::IndexError;
use crate::models::explore::{Item, Summary, TierSizes};
use crate::models::metadata::StorageClass;
use crate::pricing::{self, DEFAULT_LOCATION};
use crate::services::index_service::IndexService;

/// Metric a listing is ranked by.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortBy {
    Size,
    Count,
}

impl SortBy {
    pub fn parse(s: &str) -> Option<SortBy> {
        match s {
            "size" => Some(SortBy::Size),
            "count" => Some(SortBy::Count),
            _ => None,
        }
    }

    fn column(self) -> &'static str {
        match self {
            SortBy::Size => "size",
            SortBy::Count => "count",
        }
    }
}

/// Read-side capability of the index store.
pub trait ExploreStore {
    /// Immediate children of `path` — sub-directories with nonzero totals
    /// and direct-child objects — ranked by the chosen metric descending,
    /// ties broken by shorter name, truncated to the top 100.
    fn list_contents(
        &self,
        path: &str,
        sort: SortBy,
    ) -> impl std::future::Future<Output = Result<Vec<Item>, IndexError>> + Send;

    /// Per-tier totals and costs of the directory at `path`. A path with
    /// no directory row yields a zeroed summary.
    fn summarize_path(
        &self,
        path: &str,
    ) -> impl std::future::Future<Output = Result<Summary, IndexError>> + Send;
}

#[derive(FromRow)]
struct ContentRow {
    name: String,
    size_standard: i64,
    size_nearline: i64,
    size_coldline: i64,
    size_archive: i64,
    size: i64,
    count: i64,
    storage_class: String,
    parent: String,
}

#[derive(FromRow)]
struct SummaryRow {
    size_standard: i64,
    size_nearline: i64,
    size_coldline: i64,
    size_archive: i64,
}

impl ExploreStore for IndexService {
    async fn list_contents(&self, path: &str, sort: SortBy) -> Result<Vec<Item>, IndexError> {
        // Root prefix-matches from the bucket origin.
        let prefix = if path == "/" { "" } else { path };

        // Directories one level below the prefix with nonzero totals,
        // plus objects directly below it. The prefix itself and the root
        // row are never their own children.
        let sql = format!(
            "SELECT
                name,
                LENGTH(name) AS name_length,
                size_standard,
                size_nearline,
                size_coldline,
                size_archive,
                (size_standard +
                 size_nearline +
                 size_coldline +
                 size_archive) AS size,
                count,
                '' AS storage_class,
                parent
            FROM directory
            WHERE
                name LIKE $1 || '%' AND
                name <> $1 AND
                name <> '/' AND
                NOT name LIKE $1 || '%/%/' AND
                (size_standard + size_nearline + size_coldline + size_archive) > 0
            UNION ALL
            SELECT
                name,
                LENGTH(name) AS name_length,
                0 AS size_standard,
                0 AS size_nearline,
                0 AS size_coldline,
                0 AS size_archive,
                size,
                0 AS count,
                storage_class,
                '' AS parent
            FROM metadata
            WHERE
                name LIKE $1 || '%' AND
                name <> $1 AND
                NOT name LIKE $1 || '%/%'
            ORDER BY {} DESC, name_length
            LIMIT 100",
            sort.column()
        );

        let rows = sqlx::query_as::<_, ContentRow>(&sql)
            .bind(prefix)
            .fetch_all(&*self.db)
            .await?;

        rows.into_iter().map(Item::try_from).collect()
    }

    async fn summarize_path(&self, path: &str) -> Result<Summary, IndexError> {
        let row = sqlx::query_as::<_, SummaryRow>(
            "SELECT size_standard, size_nearline, size_coldline, size_archive
             FROM directory
             WHERE name = $1",
        )
        .bind(path)
        .fetch_optional(&*self.db)
        .await?;

        let size = row
            .map(|r| TierSizes {
                standard: r.size_standard,
                nearline: r.size_nearline,
                coldline: r.size_coldline,
                archive: r.size_archive,
            })
            .unwrap_or_default();

        Ok(Summary {
            path: path.to_string(),
            cost: pricing::tier_costs(DEFAULT_LOCATION, &size),
            size,
        })
    }
}

impl TryFrom<ContentRow> for Item {
    type Error = IndexError;

    fn try_from(row: ContentRow) -> Result<Item, IndexError> {
        let cost = if row.storage_class.is_empty() {
            // directory: cost over its per-tier breakdown
            let sizes = TierSizes {
                standard: row.size_standard,
                nearline: row.size_nearline,
                coldline: row.size_coldline,
                archive: row.size_archive,
            };
            pricing::directory_cost(DEFAULT_LOCATION, &sizes)
        } else {
            let class = StorageClass::from_str(&row.storage_class)?;
            pricing::object_cost(DEFAULT_LOCATION, class, row.size)
        };

        Ok(Item {
            name: row.name,
            parent: row.parent,
            storage_class: row.storage_class,
            size: row.size,
            count: row.count,
            cost,
        })
    }
}
