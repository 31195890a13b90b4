//! Defines routes for the metadata index query API.
//!
//! ## Structure
//! - **Explore endpoints**
//!   - `GET /explore`              — list the bucket root
//!   - `GET /explore/{*path}`      — list a directory (supports ?sort=size|count)
//!
//! - **Summary endpoints**
//!   - `GET /summary`              — per-tier totals of the root
//!   - `GET /summary/{*path}`      — per-tier totals of a directory
//!
//! The wildcard `*path` allows nested directories like `photos/2025/`.

use axum::{routing::get, Router};

use crate::handlers::{
    explore_handlers::{explore, explore_root, summary, summary_root},
    health_handlers::{healthz, readyz},
};
use crate::services::index_service::IndexService;

/// Build and return the router for all query routes.
///
/// The router carries shared state (`IndexService`) to all handlers.
pub fn routes() -> Router<IndexService> {
    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // explore
        .route("/explore", get(explore_root))
        .route("/explore/", get(explore_root))
        .route("/explore/{*path}", get(explore))
        // summary
        .route("/summary", get(summary_root))
        .route("/summary/", get(summary_root))
        .route("/summary/{*path}", get(summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::metadata::{ObjectRecord, StorageClass};
    use crate::services::index_service::ObjectStore;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::{TimeZone, Utc};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    async fn test_app() -> Router {
        let db = Database::connect("sqlite::memory:", 1).await.unwrap();
        db.create_tables().await.unwrap();
        let store = IndexService::new(db.pool.clone());

        let at = Utc.timestamp_opt(1, 0).unwrap();
        for (name, size, class) in [
            ("a/b/f1", 1, StorageClass::Standard),
            ("a/b/f2", 2, StorageClass::Nearline),
            ("f3", 3, StorageClass::Coldline),
        ] {
            store
                .create_object(&ObjectRecord::new("mock", name, size, class, at, at))
                .await
                .unwrap();
        }

        routes().with_state(store)
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn explore_root_defaults_to_size_sort() {
        let app = test_app().await;
        let (status, body) = get_json(app, "/explore").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["path"], "");

        let mut names: Vec<&str> = body["contents"]
            .as_array()
            .unwrap()
            .iter()
            .map(|item| item["name"].as_str().unwrap())
            .collect();
        names.sort();
        assert_eq!(names, ["a/", "f3"]);
    }

    #[tokio::test]
    async fn explore_echoes_requested_path_and_normalises() {
        let app = test_app().await;
        let (status, body) = get_json(app, "/explore/a/b?sort=count").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["path"], "a/b");
        assert_eq!(body["contents"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn invalid_sort_is_bad_request() {
        let app = test_app().await;
        let (status, _) = get_json(app, "/explore?sort=name").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn summary_reports_per_tier_sizes_and_costs() {
        let app = test_app().await;
        let (status, body) = get_json(app, "/summary/a").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["path"], "a/");
        assert_eq!(body["size"]["standard"], 1);
        assert_eq!(body["size"]["nearline"], 2);
        assert_eq!(body["size"]["coldline"], 0);
        assert!(body["cost"]["standard"].is_number());
    }

    #[tokio::test]
    async fn healthz_is_always_ok() {
        let app = test_app().await;
        let (status, body) = get_json(app, "/healthz").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }
}
