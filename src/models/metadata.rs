//! Represents the metadata record of a single live object in the bucket.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

use crate::errors::IndexError;
use crate::models::directory::parent;

/// Storage tier of an object. Determines which per-tier size accumulator
/// a directory rollup lands in, and the price applied per GiB-month.
#[derive(Serialize, Deserialize, sqlx::Type, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum StorageClass {
    Standard,
    Nearline,
    Coldline,
    Archive,
}

impl StorageClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageClass::Standard => "STANDARD",
            StorageClass::Nearline => "NEARLINE",
            StorageClass::Coldline => "COLDLINE",
            StorageClass::Archive => "ARCHIVE",
        }
    }

    /// Name of the directory column accumulating bytes for this tier.
    pub fn size_column(&self) -> &'static str {
        match self {
            StorageClass::Standard => "size_standard",
            StorageClass::Nearline => "size_nearline",
            StorageClass::Coldline => "size_coldline",
            StorageClass::Archive => "size_archive",
        }
    }
}

impl fmt::Display for StorageClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageClass {
    type Err = IndexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "STANDARD" => Ok(StorageClass::Standard),
            "NEARLINE" => Ok(StorageClass::Nearline),
            "COLDLINE" => Ok(StorageClass::Coldline),
            "ARCHIVE" => Ok(StorageClass::Archive),
            other => Err(IndexError::Validation(format!(
                "unknown storage class `{other}`"
            ))),
        }
    }
}

/// One row per live object, keyed by `(bucket, name)`.
///
/// `updated` is the sole ordering key: the reconciler drops any incoming
/// event whose `updated` is older than the stored record's.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug)]
pub struct ObjectRecord {
    /// Bucket holding the object.
    pub bucket: String,

    /// Full flat key. `/` is significant only as the separator used to
    /// derive the ancestor chain.
    pub name: String,

    /// Immediate virtual directory of `name`.
    pub parent: String,

    /// Size in bytes.
    pub size: i64,

    /// Storage tier of the object.
    #[serde(rename = "storageClass")]
    pub storage_class: StorageClass,

    /// Creation timestamp reported by the source of truth.
    pub created: DateTime<Utc>,

    /// Last-update timestamp reported by the source of truth.
    pub updated: DateTime<Utc>,
}

impl ObjectRecord {
    /// Build a record from source attributes, deriving `parent` from the name.
    pub fn new(
        bucket: impl Into<String>,
        name: impl Into<String>,
        size: i64,
        storage_class: StorageClass,
        created: DateTime<Utc>,
        updated: DateTime<Utc>,
    ) -> Self {
        let name = name.into();
        let parent = parent(&name);
        Self {
            bucket: bucket.into(),
            name,
            parent,
            size,
            storage_class,
            created,
            updated,
        }
    }
}
