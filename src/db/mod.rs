//! Database module: models and schema for persistent storage.
//!
//! Layout:
//! - `models.rs`: row struct mirroring the `items` table and its conversion
//! - `schema.rs`: SQL DDL for initializing the database (SQLite-first)
//! - `sqlite.rs`: `ItemStorage`, the sqlx-backed item store

pub mod models;
pub mod schema;
pub mod sqlite;

pub use models::DbItem;
pub use schema::SQLITE_INIT;
pub use sqlite::{ItemStorage, SqlitePool, connect, connect_in_memory};
