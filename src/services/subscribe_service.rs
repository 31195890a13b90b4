//! Long-running reconciler applying change events to the index.
//!
//! Events arrive unordered and at-least-once. Ordering is resolved per
//! key by the payload's `updated` timestamp: an event older than the
//! stored record is dropped, an event with the same timestamp and no
//! class change is a no-op. Messages are processed one at a time and the
//! write pool holds a single connection, so at most one write
//! transaction is ever in flight.

use std::collections::HashMap;
use tracing::warn;

use crate::errors::IndexError;
use crate::models::event::ChangeEvent;
use crate::models::metadata::ObjectRecord;
use crate::services::index_service::ObjectStore;

/// What the delivery runtime should do with a consumed message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Disposition {
    /// Remove the message from the queue.
    Ack,
    /// Redeliver later.
    Nack,
}

/// Applies change events against an [`ObjectStore`].
pub struct SubscriberService<S> {
    store: S,
}

impl<S> SubscriberService<S>
where
    S: ObjectStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Decode and apply one message, mapping the outcome to a
    /// disposition. Failures are logged with the reason and nacked so
    /// the runtime redelivers.
    pub async fn consume(
        &self,
        attributes: &HashMap<String, String>,
        data: &[u8],
    ) -> Disposition {
        match self.process_message(attributes, data).await {
            Ok(()) => Disposition::Ack,
            Err(err) => {
                warn!(error = %err, "message not acknowledged");
                Disposition::Nack
            }
        }
    }

    /// Apply one decoded message. Events describing a superseded
    /// generation are dropped before any state change.
    pub async fn process_message(
        &self,
        attributes: &HashMap<String, String>,
        data: &[u8],
    ) -> Result<(), IndexError> {
        let Some(event) = ChangeEvent::from_message(attributes, data)? else {
            return Ok(());
        };

        match event {
            ChangeEvent::Finalize(obj) => self.handle_finalize(obj).await,
            ChangeEvent::Archive(obj) => self.handle_archive(obj).await,
            ChangeEvent::Delete(obj) => self.handle_delete(obj).await,
        }
    }

    /// Insert or overwrite the object, shifting ancestor totals by the
    /// size difference. A storage-class change is handled as a reclass.
    async fn handle_finalize(&self, incoming: ObjectRecord) -> Result<(), IndexError> {
        let existing = self
            .store
            .get_object(&incoming.bucket, &incoming.name)
            .await?;

        let Some(existing) = existing else {
            return self.store.create_object(&incoming).await;
        };

        if existing.updated > incoming.updated {
            return Ok(()); // stale
        }
        if existing.storage_class != incoming.storage_class {
            return self
                .store
                .reclass_object(&incoming, existing.storage_class)
                .await;
        }
        if existing.updated == incoming.updated {
            return Ok(()); // redelivery of the applied generation
        }

        let size_delta = incoming.size - existing.size;
        self.store.update_object(&incoming, size_delta).await
    }

    /// Move the object's bytes to its new tier; counts are unchanged.
    /// An archive of an unknown object is an ordinary insert.
    async fn handle_archive(&self, incoming: ObjectRecord) -> Result<(), IndexError> {
        let existing = self
            .store
            .get_object(&incoming.bucket, &incoming.name)
            .await?;

        let Some(existing) = existing else {
            return self.store.create_object(&incoming).await;
        };

        if existing.updated > incoming.updated {
            return Ok(()); // stale
        }
        if existing.storage_class == incoming.storage_class {
            return Ok(()); // already in the target class
        }

        self.store
            .reclass_object(&incoming, existing.storage_class)
            .await
    }

    /// Remove the object and decrement its ancestors by the stored
    /// record's size and tier. Deleting an unknown object is reported as
    /// not-found so the runtime redelivers: the matching finalize may
    /// still be in flight.
    async fn handle_delete(&self, incoming: ObjectRecord) -> Result<(), IndexError> {
        let existing = self
            .store
            .get_object(&incoming.bucket, &incoming.name)
            .await?
            .ok_or_else(|| IndexError::NotFound(format!("object {}", incoming.name)))?;

        if existing.updated > incoming.updated {
            return Ok(()); // stale
        }

        self.store.delete_object(&existing).await
    }
}
