//! Core data models for the metadata index.
//!
//! These entities represent object records, virtual directories, and the
//! change events that mutate them. They map cleanly to database rows via
//! `sqlx::FromRow` and serialize naturally as JSON via `serde`.

pub mod directory;
pub mod event;
pub mod explore;
pub mod metadata;
