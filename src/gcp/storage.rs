//! Bucket enumeration over the storage JSON API, used only by the
//! seeder. Listing pages are folded into one lazy stream of object
//! records.

use chrono::{DateTime, Utc};
use futures::{stream, Stream, TryStreamExt};
use serde::Deserialize;

use crate::errors::IndexError;
use crate::models::metadata::{ObjectRecord, StorageClass};

const DEFAULT_BASE_URL: &str = "https://storage.googleapis.com";
const EMULATOR_ENV: &str = "STORAGE_EMULATOR_HOST";

// Keep listing responses to the attributes the index stores.
const LIST_FIELDS: &str = "items(bucket,name,size,storageClass,timeCreated,updated),nextPageToken";

/// Attributes of one listed object. `size` arrives as a decimal string.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ObjectAttrs {
    pub bucket: String,
    pub name: String,
    pub size: String,
    pub storage_class: StorageClass,
    pub time_created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl ObjectAttrs {
    fn into_record(self) -> Result<ObjectRecord, IndexError> {
        let size: i64 = self
            .size
            .parse()
            .map_err(|err| IndexError::Validation(format!("error parsing size: {err}")))?;
        Ok(ObjectRecord::new(
            self.bucket,
            self.name,
            size,
            self.storage_class,
            self.time_created,
            self.updated,
        ))
    }
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct ObjectList {
    #[serde(default)]
    items: Vec<ObjectAttrs>,
    next_page_token: Option<String>,
}

/// Client for the storage JSON API.
pub struct StorageClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl StorageClient {
    /// Build a client against `STORAGE_EMULATOR_HOST` when set, the
    /// public endpoint otherwise.
    pub fn from_env() -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: super::base_url(EMULATOR_ENV, DEFAULT_BASE_URL),
            token: super::bearer_token(),
        }
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        let mut request = self.http.get(url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        request
    }

    /// Verify the bucket is reachable before enumerating it.
    pub async fn bucket_attrs(&self, bucket: &str) -> Result<(), IndexError> {
        let url = format!("{}/storage/v1/b/{bucket}", self.base_url);
        self.get(&url)
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(|err| IndexError::Fatal(format!("bucket {bucket} unreachable: {err}")))?;
        Ok(())
    }

    /// Lazily enumerate every live object in the bucket, one listing
    /// page at a time.
    pub fn list_objects<'a>(
        &'a self,
        bucket: &str,
    ) -> impl Stream<Item = Result<ObjectRecord, IndexError>> + 'a {
        let url = format!("{}/storage/v1/b/{bucket}/o", self.base_url);

        stream::try_unfold(Some(String::new()), move |token| {
            let url = url.clone();
            async move {
                let Some(token) = token else {
                    return Ok::<_, IndexError>(None);
                };

                let mut request = self.get(&url).query(&[("fields", LIST_FIELDS)]);
                if !token.is_empty() {
                    request = request.query(&[("pageToken", token.as_str())]);
                }

                let page: ObjectList = request
                    .send()
                    .await
                    .and_then(|resp| resp.error_for_status())
                    .map_err(transport)?
                    .json()
                    .await
                    .map_err(transport)?;

                let records = page.items.into_iter().map(ObjectAttrs::into_record);
                Ok(Some((stream::iter(records), page.next_page_token)))
            }
        })
        .try_flatten()
    }
}

fn transport(err: reqwest::Error) -> IndexError {
    IndexError::Fatal(format!("storage api: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listed_attributes_become_records() {
        let attrs: ObjectAttrs = serde_json::from_str(
            r#"{
                "bucket": "mock",
                "name": "a/b/file",
                "size": "2048",
                "storageClass": "ARCHIVE",
                "timeCreated": "2024-05-01T09:00:00Z",
                "updated": "2024-05-01T10:00:00Z"
            }"#,
        )
        .unwrap();

        let record = attrs.into_record().unwrap();
        assert_eq!(record.size, 2048);
        assert_eq!(record.parent, "a/b/");
        assert_eq!(record.storage_class, StorageClass::Archive);
    }

    #[test]
    fn non_numeric_size_is_rejected() {
        let attrs: ObjectAttrs = serde_json::from_str(
            r#"{
                "bucket": "mock",
                "name": "file",
                "size": "huge",
                "storageClass": "STANDARD",
                "timeCreated": "2024-05-01T09:00:00Z",
                "updated": "2024-05-01T10:00:00Z"
            }"#,
        )
        .unwrap();
        assert!(matches!(
            attrs.into_record(),
            Err(IndexError::Validation(_))
        ));
    }
}
