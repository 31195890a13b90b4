//! HTTP handlers for the explore and summary queries.
//!
//! Paths are normalised by appending `/` when missing; an absent path
//! segment means root. The response echoes the path exactly as
//! requested.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::explore::{Item, Summary};
use crate::services::explore_service::{ExploreStore, SortBy};
use crate::services::index_service::IndexService;

/// Query params accepted by the explore endpoint.
#[derive(Debug, Deserialize)]
pub struct ExploreQuery {
    pub sort: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ExploreResponse {
    pub path: String,
    pub contents: Vec<Item>,
}

/// GET `/explore` — list the bucket root.
pub async fn explore_root(
    State(store): State<IndexService>,
    Query(query): Query<ExploreQuery>,
) -> Result<Json<ExploreResponse>, AppError> {
    explore_path(store, String::new(), query).await
}

/// GET `/explore/{*path}` — list the immediate children of a directory.
pub async fn explore(
    State(store): State<IndexService>,
    Path(path): Path<String>,
    Query(query): Query<ExploreQuery>,
) -> Result<Json<ExploreResponse>, AppError> {
    explore_path(store, path, query).await
}

async fn explore_path(
    store: IndexService,
    raw_path: String,
    query: ExploreQuery,
) -> Result<Json<ExploreResponse>, AppError> {
    let sort = parse_sort(query.sort.as_deref())?;
    let path = normalize_path(&raw_path);

    let contents = store.list_contents(&path, sort).await?;
    Ok(Json(ExploreResponse {
        path: raw_path,
        contents,
    }))
}

/// GET `/summary` — per-tier totals of the bucket root.
pub async fn summary_root(
    State(store): State<IndexService>,
) -> Result<Json<Summary>, AppError> {
    summary_path(store, String::new()).await
}

/// GET `/summary/{*path}` — per-tier totals of a directory.
pub async fn summary(
    State(store): State<IndexService>,
    Path(path): Path<String>,
) -> Result<Json<Summary>, AppError> {
    summary_path(store, path).await
}

async fn summary_path(store: IndexService, raw_path: String) -> Result<Json<Summary>, AppError> {
    let path = normalize_path(&raw_path);
    let summary = store.summarize_path(&path).await?;
    Ok(Json(summary))
}

fn parse_sort(sort: Option<&str>) -> Result<SortBy, AppError> {
    match sort {
        None | Some("") => Ok(SortBy::Size),
        Some(value) => SortBy::parse(&value.to_ascii_lowercase()).ok_or_else(|| {
            AppError::new(
                StatusCode::BAD_REQUEST,
                "Invalid sort parameter, please use 'size' or 'count'",
            )
        }),
    }
}

fn normalize_path(raw: &str) -> String {
    if raw.is_empty() {
        "/".to_string()
    } else if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_normalise_to_trailing_slash() {
        assert_eq!(normalize_path(""), "/");
        assert_eq!(normalize_path("a/b"), "a/b/");
        assert_eq!(normalize_path("a/b/"), "a/b/");
    }

    #[test]
    fn sort_defaults_to_size_and_rejects_garbage() {
        assert_eq!(parse_sort(None).unwrap(), SortBy::Size);
        assert_eq!(parse_sort(Some("")).unwrap(), SortBy::Size);
        assert_eq!(parse_sort(Some("COUNT")).unwrap(), SortBy::Count);
        assert!(parse_sort(Some("name")).is_err());
    }
}
