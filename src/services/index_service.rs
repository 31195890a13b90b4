//! The index store and its write-side capability traits.
//!
//! `IndexService` is the single backing store shared by every subsystem.
//! Writers reach it through two narrow traits: [`ObjectStore`] for
//! per-object mutations (each bundled with its ancestor rollup in one
//! transaction) and [`DirectoryStore`] for the bare ancestor-walk
//! primitives the seeder drives directly.
//!
//! The rollup invariant: for every directory and tier, the per-tier size
//! equals the summed sizes of live descendant objects in that tier, and
//! `count` equals their number. Every method here restores the invariant
//! before committing.

use sqlx::{SqliteConnection, SqlitePool};
use std::sync::Arc;

use crate::errors::IndexError;
use crate::models::directory::{ancestors, parent};
use crate::models::metadata::{ObjectRecord, StorageClass};

/// Read/write access to object records. Each `*_object` mutation commits
/// the object row and its ancestor rollup atomically.
pub trait ObjectStore {
    fn get_object(
        &self,
        bucket: &str,
        name: &str,
    ) -> impl std::future::Future<Output = Result<Option<ObjectRecord>, IndexError>> + Send;

    /// Insert the object row only, without touching directories. Used by
    /// the seeder, which drives the ancestor walk itself.
    fn insert_object(
        &self,
        obj: &ObjectRecord,
    ) -> impl std::future::Future<Output = Result<(), IndexError>> + Send;

    /// Insert a new object and increment its ancestors by `(size, 1)`.
    fn create_object(
        &self,
        obj: &ObjectRecord,
    ) -> impl std::future::Future<Output = Result<(), IndexError>> + Send;

    /// Overwrite an existing object and shift its ancestors' tier size
    /// by `size_delta`; counts stay untouched.
    fn update_object(
        &self,
        obj: &ObjectRecord,
        size_delta: i64,
    ) -> impl std::future::Future<Output = Result<(), IndexError>> + Send;

    /// Move an object's bytes from `previous` to its current tier.
    fn reclass_object(
        &self,
        obj: &ObjectRecord,
        previous: StorageClass,
    ) -> impl std::future::Future<Output = Result<(), IndexError>> + Send;

    /// Remove the stored object and decrement its ancestors by
    /// `(existing.size, 1)` in the stored record's tier.
    fn delete_object(
        &self,
        existing: &ObjectRecord,
    ) -> impl std::future::Future<Output = Result<(), IndexError>> + Send;
}

/// The ancestor-walk primitives, each one transaction over the whole
/// chain from the object's parent up to root.
pub trait DirectoryStore {
    fn upsert_ancestors(
        &self,
        bucket: &str,
        object_name: &str,
        size_delta: i64,
        count_delta: i64,
        class: StorageClass,
    ) -> impl std::future::Future<Output = Result<(), IndexError>> + Send;

    fn upsert_ancestors_reclass(
        &self,
        bucket: &str,
        object_name: &str,
        from: StorageClass,
        to: StorageClass,
        bytes: i64,
    ) -> impl std::future::Future<Output = Result<(), IndexError>> + Send;
}

/// SQLite-backed store satisfying all capability traits.
#[derive(Clone)]
pub struct IndexService {
    /// Shared connection pool. Writers hold a pool of one connection.
    pub db: Arc<SqlitePool>,
}

impl IndexService {
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }
}

impl ObjectStore for IndexService {
    async fn get_object(
        &self,
        bucket: &str,
        name: &str,
    ) -> Result<Option<ObjectRecord>, IndexError> {
        let record = sqlx::query_as::<_, ObjectRecord>(
            "SELECT bucket, name, parent, size, storage_class, created, updated
             FROM metadata
             WHERE bucket = $1 AND name = $2",
        )
        .bind(bucket)
        .bind(name)
        .fetch_optional(&*self.db)
        .await?;
        Ok(record)
    }

    async fn insert_object(&self, obj: &ObjectRecord) -> Result<(), IndexError> {
        let mut conn = self.db.acquire().await?;
        insert_object_row(&mut *conn, obj).await
    }

    async fn create_object(&self, obj: &ObjectRecord) -> Result<(), IndexError> {
        let mut tx = self.db.begin().await?;
        insert_object_row(&mut *tx, obj).await?;
        walk_ancestors(&mut *tx, &obj.bucket, &obj.name, obj.size, 1, obj.storage_class).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn update_object(&self, obj: &ObjectRecord, size_delta: i64) -> Result<(), IndexError> {
        let mut tx = self.db.begin().await?;
        update_object_row(&mut *tx, obj).await?;
        walk_ancestors(&mut *tx, &obj.bucket, &obj.name, size_delta, 0, obj.storage_class).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn reclass_object(
        &self,
        obj: &ObjectRecord,
        previous: StorageClass,
    ) -> Result<(), IndexError> {
        let mut tx = self.db.begin().await?;
        update_object_row(&mut *tx, obj).await?;
        walk_ancestors_reclass(
            &mut *tx,
            &obj.bucket,
            &obj.name,
            previous,
            obj.storage_class,
            obj.size,
        )
        .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn delete_object(&self, existing: &ObjectRecord) -> Result<(), IndexError> {
        let mut tx = self.db.begin().await?;
        delete_object_row(&mut *tx, &existing.bucket, &existing.name).await?;
        walk_ancestors(
            &mut *tx,
            &existing.bucket,
            &existing.name,
            -existing.size,
            -1,
            existing.storage_class,
        )
        .await?;
        tx.commit().await?;
        Ok(())
    }
}

impl DirectoryStore for IndexService {
    async fn upsert_ancestors(
        &self,
        bucket: &str,
        object_name: &str,
        size_delta: i64,
        count_delta: i64,
        class: StorageClass,
    ) -> Result<(), IndexError> {
        let mut tx = self.db.begin().await?;
        walk_ancestors(&mut *tx, bucket, object_name, size_delta, count_delta, class).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn upsert_ancestors_reclass(
        &self,
        bucket: &str,
        object_name: &str,
        from: StorageClass,
        to: StorageClass,
        bytes: i64,
    ) -> Result<(), IndexError> {
        let mut tx = self.db.begin().await?;
        walk_ancestors_reclass(&mut *tx, bucket, object_name, from, to, bytes).await?;
        tx.commit().await?;
        Ok(())
    }
}

async fn insert_object_row(
    conn: &mut SqliteConnection,
    obj: &ObjectRecord,
) -> Result<(), IndexError> {
    if obj.bucket.is_empty() || obj.name.is_empty() {
        return Err(IndexError::Validation(
            "bucket or name argument is empty".to_string(),
        ));
    }

    let result = sqlx::query(
        "INSERT INTO metadata (bucket, name, size, parent, storage_class, created, updated)
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(&obj.bucket)
    .bind(&obj.name)
    .bind(obj.size)
    .bind(&obj.parent)
    .bind(obj.storage_class)
    .bind(obj.created)
    .bind(obj.updated)
    .execute(&mut *conn)
    .await;

    match result {
        Ok(_) => Ok(()),
        Err(err) if is_unique_violation(&err) => Err(IndexError::Conflict(format!(
            "object {} already indexed",
            obj.name
        ))),
        Err(err) => Err(IndexError::Store(err)),
    }
}

async fn update_object_row(
    conn: &mut SqliteConnection,
    obj: &ObjectRecord,
) -> Result<(), IndexError> {
    let result = sqlx::query(
        "UPDATE metadata
         SET storage_class = $1,
             size          = $2,
             updated       = $3
         WHERE bucket = $4 AND name = $5",
    )
    .bind(obj.storage_class)
    .bind(obj.size)
    .bind(obj.updated)
    .bind(&obj.bucket)
    .bind(&obj.name)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(IndexError::NotFound(format!("object {}", obj.name)));
    }
    Ok(())
}

async fn delete_object_row(
    conn: &mut SqliteConnection,
    bucket: &str,
    name: &str,
) -> Result<(), IndexError> {
    let result = sqlx::query("DELETE FROM metadata WHERE bucket = $1 AND name = $2")
        .bind(bucket)
        .bind(name)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(IndexError::NotFound(format!("object {name}")));
    }
    Ok(())
}

/// Apply `(size_delta, count_delta)` to every ancestor of `object_name`
/// within the caller's transaction.
///
/// Absent directory rows are created with the delta as their initial
/// tier size and a count floor of 1; the floor covers the seeding race
/// where a deeper directory lands before a shallower one, and later
/// events correct the rollup.
async fn walk_ancestors(
    conn: &mut SqliteConnection,
    bucket: &str,
    object_name: &str,
    size_delta: i64,
    count_delta: i64,
    class: StorageClass,
) -> Result<(), IndexError> {
    if bucket.is_empty() || object_name.is_empty() {
        return Err(IndexError::Validation(
            "bucket or name argument is empty".to_string(),
        ));
    }

    // Only the column identifier is interpolated; it comes from the
    // StorageClass enum, never from input. All values are bound.
    let col = class.size_column();
    let sql = format!(
        "INSERT INTO directory (bucket, name, parent, count, {col})
         VALUES ($1, $2, $3, $4, $5)
         ON CONFLICT (bucket, name)
         DO UPDATE
         SET count = count + $6,
             {col} = {col} + $7"
    );

    for dir in ancestors(object_name) {
        sqlx::query(&sql)
            .bind(bucket)
            .bind(&dir)
            .bind(parent(&dir))
            .bind(count_delta.max(1))
            .bind(size_delta)
            .bind(count_delta)
            .bind(size_delta)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

/// Move `bytes` from the `from` tier column to the `to` column on every
/// ancestor; counts are unchanged. Absent rows are created holding the
/// bytes in the target tier.
async fn walk_ancestors_reclass(
    conn: &mut SqliteConnection,
    bucket: &str,
    object_name: &str,
    from: StorageClass,
    to: StorageClass,
    bytes: i64,
) -> Result<(), IndexError> {
    if bucket.is_empty() || object_name.is_empty() {
        return Err(IndexError::Validation(
            "bucket or name argument is empty".to_string(),
        ));
    }

    let from_col = from.size_column();
    let to_col = to.size_column();
    let sql = format!(
        "INSERT INTO directory (bucket, name, parent, count, {to_col})
         VALUES ($1, $2, $3, 1, $4)
         ON CONFLICT (bucket, name)
         DO UPDATE
         SET {from_col} = {from_col} - $5,
             {to_col}   = {to_col} + $6"
    );

    for dir in ancestors(object_name) {
        sqlx::query(&sql)
            .bind(bucket)
            .bind(&dir)
            .bind(parent(&dir))
            .bind(bytes)
            .bind(bytes)
            .bind(bytes)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

/// Return true if the error indicates a primary-key/unique violation.
fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db_err) if db_err.message().to_ascii_lowercase().contains("unique")
    )
}
