//! One-shot bulk bootstrap of the index from a bucket enumeration.

use futures::{pin_mut, Stream, TryStreamExt};
use tracing::warn;

use crate::errors::IndexError;
use crate::models::metadata::ObjectRecord;
use crate::services::index_service::{DirectoryStore, ObjectStore};

/// Counters reported after a completed seed.
#[derive(Debug, Default, Clone, Copy)]
pub struct SeedReport {
    pub inserted: u64,
    pub conflicts: u64,
}

/// Folds a lazy enumeration of live objects into an empty index.
///
/// The run is not resumable: a partial seed leaves no watermark and must
/// be discarded. Index creation and compaction are deferred to the
/// caller so inserts stay linear.
pub struct SeedService<S> {
    store: S,
}

impl<S> SeedService<S>
where
    S: ObjectStore + DirectoryStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Insert every record the stream yields and fold it into the
    /// rollup. A duplicate record is logged and skipped (source data
    /// anomaly); any other store failure aborts the run.
    pub async fn run<O>(&self, objects: O) -> Result<SeedReport, IndexError>
    where
        O: Stream<Item = Result<ObjectRecord, IndexError>>,
    {
        let mut report = SeedReport::default();

        pin_mut!(objects);
        while let Some(obj) = objects.try_next().await? {
            match self.store.insert_object(&obj).await {
                Ok(()) => report.inserted += 1,
                Err(IndexError::Conflict(msg)) => {
                    warn!(object = %obj.name, "skipping duplicate record: {msg}");
                    report.conflicts += 1;
                }
                Err(err) => return Err(err),
            }

            self.store
                .upsert_ancestors(&obj.bucket, &obj.name, obj.size, 1, obj.storage_class)
                .await?;
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::metadata::StorageClass;
    use crate::services::index_service::IndexService;
    use chrono::{TimeZone, Utc};
    use futures::stream;

    async fn memory_store() -> IndexService {
        let db = Database::connect("sqlite::memory:", 1).await.unwrap();
        db.create_tables().await.unwrap();
        IndexService::new(db.pool.clone())
    }

    fn obj(name: &str, size: i64, class: StorageClass) -> ObjectRecord {
        let at = Utc.timestamp_opt(1, 0).unwrap();
        ObjectRecord::new("mock", name, size, class, at, at)
    }

    async fn root_totals(store: &IndexService) -> (i64, i64, i64, i64, i64) {
        sqlx::query_as(
            "SELECT count, size_standard, size_nearline, size_coldline, size_archive
             FROM directory WHERE name = '/'",
        )
        .fetch_one(&*store.db)
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn seeds_bucket_enumeration_into_rollup() {
        let store = memory_store().await;
        let seeder = SeedService::new(store.clone());

        let objects = stream::iter(vec![
            Ok(obj("a/b/f1", 1, StorageClass::Standard)),
            Ok(obj("a/b/f2", 2, StorageClass::Nearline)),
            Ok(obj("f3", 3, StorageClass::Coldline)),
        ]);

        let report = seeder.run(objects).await.unwrap();
        assert_eq!(report.inserted, 3);
        assert_eq!(report.conflicts, 0);

        let (count, standard, nearline, coldline, archive) = root_totals(&store).await;
        assert_eq!(count, 3);
        assert_eq!(standard, 1);
        assert_eq!(nearline, 2);
        assert_eq!(coldline, 3);
        assert_eq!(archive, 0);
    }

    #[tokio::test]
    async fn duplicate_records_are_skipped_not_fatal() {
        let store = memory_store().await;
        let seeder = SeedService::new(store.clone());

        let objects = stream::iter(vec![
            Ok(obj("f", 1, StorageClass::Standard)),
            Ok(obj("f", 1, StorageClass::Standard)),
        ]);

        let report = seeder.run(objects).await.unwrap();
        assert_eq!(report.inserted, 1);
        assert_eq!(report.conflicts, 1);
    }

    #[tokio::test]
    async fn enumeration_failure_aborts_the_run() {
        let store = memory_store().await;
        let seeder = SeedService::new(store);

        let objects = stream::iter(vec![
            Ok(obj("f", 1, StorageClass::Standard)),
            Err(IndexError::Fatal("listing page failed".to_string())),
        ]);

        let err = seeder.run(objects).await.unwrap_err();
        assert!(matches!(err, IndexError::Fatal(_)));
    }
}
