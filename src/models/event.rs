//! Change events consumed by the reconciler.
//!
//! Each bucket notification carries an `eventType` attribute and a JSON
//! payload describing the affected object. The payload accepts both the
//! notification field casing (`Bucket`, `Name`, …) and the object
//! resource casing (`bucket`, `name`, `timeCreated`, …).

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;

use crate::errors::IndexError;
use crate::models::metadata::{ObjectRecord, StorageClass};

pub const ATTR_EVENT_TYPE: &str = "eventType";
pub const ATTR_OVERWRITTEN: &str = "overwrittenByGeneration";

pub const EVENT_FINALIZE: &str = "OBJECT_FINALIZE";
pub const EVENT_DELETE: &str = "OBJECT_DELETE";
pub const EVENT_ARCHIVE: &str = "OBJECT_ARCHIVE";

/// Wire payload of a change notification. `Size` arrives as a decimal
/// string and is parsed into bytes during conversion.
#[derive(Deserialize, Debug)]
struct EventPayload {
    #[serde(rename = "Bucket", alias = "bucket")]
    bucket: String,
    #[serde(rename = "Name", alias = "name")]
    name: String,
    #[serde(rename = "Size", alias = "size")]
    size: String,
    #[serde(rename = "StorageClass", alias = "storageClass")]
    storage_class: StorageClass,
    #[serde(rename = "Updated", alias = "updated")]
    updated: DateTime<Utc>,
    #[serde(rename = "Created", alias = "timeCreated")]
    created: DateTime<Utc>,
}

/// A change event, discriminated by the notification's `eventType`.
#[derive(Clone, Debug)]
pub enum ChangeEvent {
    Finalize(ObjectRecord),
    Delete(ObjectRecord),
    Archive(ObjectRecord),
}

impl ChangeEvent {
    /// Decode a notification into an event.
    ///
    /// Returns `Ok(None)` when the message carries `overwrittenByGeneration`:
    /// such events describe an immediately superseded version and must be
    /// acknowledged without any state change.
    pub fn from_message(
        attributes: &HashMap<String, String>,
        data: &[u8],
    ) -> Result<Option<ChangeEvent>, IndexError> {
        if attributes.contains_key(ATTR_OVERWRITTEN) {
            return Ok(None);
        }

        let event_type = attributes
            .get(ATTR_EVENT_TYPE)
            .ok_or_else(|| IndexError::Validation("missing eventType attribute".to_string()))?;

        let payload: EventPayload = serde_json::from_slice(data)
            .map_err(|err| IndexError::Validation(format!("malformed payload: {err}")))?;
        let object = payload.into_record()?;

        match event_type.as_str() {
            EVENT_FINALIZE => Ok(Some(ChangeEvent::Finalize(object))),
            EVENT_DELETE => Ok(Some(ChangeEvent::Delete(object))),
            EVENT_ARCHIVE => Ok(Some(ChangeEvent::Archive(object))),
            other => Err(IndexError::Validation(format!(
                "unknown event type: {other}"
            ))),
        }
    }

    pub fn object(&self) -> &ObjectRecord {
        match self {
            ChangeEvent::Finalize(obj) | ChangeEvent::Delete(obj) | ChangeEvent::Archive(obj) => {
                obj
            }
        }
    }
}

impl EventPayload {
    fn into_record(self) -> Result<ObjectRecord, IndexError> {
        if self.bucket.is_empty() || self.name.is_empty() {
            return Err(IndexError::Validation(
                "bucket or name field is empty".to_string(),
            ));
        }

        let size: i64 = self
            .size
            .parse()
            .map_err(|err| IndexError::Validation(format!("error parsing size: {err}")))?;

        Ok(ObjectRecord::new(
            self.bucket,
            self.name,
            size,
            self.storage_class,
            self.created,
            self.updated,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn decodes_finalize_event() {
        let data = br#"{
            "Bucket": "mock",
            "Name": "a/b/file",
            "Size": "1024",
            "StorageClass": "NEARLINE",
            "Updated": "2024-05-01T10:00:00Z",
            "Created": "2024-05-01T09:00:00Z"
        }"#;
        let event = ChangeEvent::from_message(&attrs(&[(ATTR_EVENT_TYPE, EVENT_FINALIZE)]), data)
            .unwrap()
            .unwrap();

        let obj = event.object();
        assert!(matches!(event, ChangeEvent::Finalize(_)));
        assert_eq!(obj.name, "a/b/file");
        assert_eq!(obj.parent, "a/b/");
        assert_eq!(obj.size, 1024);
        assert_eq!(obj.storage_class, StorageClass::Nearline);
    }

    #[test]
    fn decodes_object_resource_casing() {
        let data = br#"{
            "bucket": "mock",
            "name": "file",
            "size": "7",
            "storageClass": "STANDARD",
            "updated": "2024-05-01T10:00:00Z",
            "timeCreated": "2024-05-01T09:00:00Z"
        }"#;
        let event = ChangeEvent::from_message(&attrs(&[(ATTR_EVENT_TYPE, EVENT_DELETE)]), data)
            .unwrap()
            .unwrap();
        assert!(matches!(event, ChangeEvent::Delete(_)));
        assert_eq!(event.object().size, 7);
    }

    #[test]
    fn drops_superseded_generation() {
        let result = ChangeEvent::from_message(
            &attrs(&[
                (ATTR_EVENT_TYPE, EVENT_FINALIZE),
                (ATTR_OVERWRITTEN, "12345"),
            ]),
            b"not even json",
        )
        .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn rejects_unknown_event_type() {
        let data = br#"{
            "Bucket": "mock",
            "Name": "file",
            "Size": "1",
            "StorageClass": "STANDARD",
            "Updated": "2024-05-01T10:00:00Z",
            "Created": "2024-05-01T09:00:00Z"
        }"#;
        let err = ChangeEvent::from_message(&attrs(&[(ATTR_EVENT_TYPE, "OBJECT_METADATA_UPDATE")]), data)
            .unwrap_err();
        assert!(matches!(err, IndexError::Validation(_)));
    }

    #[test]
    fn rejects_malformed_size_and_empty_name() {
        let bad_size = br#"{
            "Bucket": "mock", "Name": "file", "Size": "many",
            "StorageClass": "STANDARD",
            "Updated": "2024-05-01T10:00:00Z", "Created": "2024-05-01T09:00:00Z"
        }"#;
        assert!(matches!(
            ChangeEvent::from_message(&attrs(&[(ATTR_EVENT_TYPE, EVENT_FINALIZE)]), bad_size),
            Err(IndexError::Validation(_))
        ));

        let empty_name = br#"{
            "Bucket": "mock", "Name": "", "Size": "1",
            "StorageClass": "STANDARD",
            "Updated": "2024-05-01T10:00:00Z", "Created": "2024-05-01T09:00:00Z"
        }"#;
        assert!(matches!(
            ChangeEvent::from_message(&attrs(&[(ATTR_EVENT_TYPE, EVENT_FINALIZE)]), empty_name),
            Err(IndexError::Validation(_))
        ));
    }
}
