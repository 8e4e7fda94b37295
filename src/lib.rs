pub mod config;
pub mod error;
pub mod service;
pub mod router;
pub mod middleware;
pub mod db;
pub mod handlers;
pub mod types;

pub use error::TrackerError;
pub use types::{Item, ItemDraft};
