//! Core data models for the recipe API.
//!
//! Each model owns the queries for its table. Rows map to structs via
//! `sqlx::FromRow` and serialize to JSON via `serde` using document-store
//! field names.

pub mod recipe;
pub mod user;
