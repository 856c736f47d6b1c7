// Public fallible APIs in this crate share one concrete error contract (`CatalogError`).
// Repeating per-function `# Errors` boilerplate obscures behavior more than it clarifies.
#![allow(
    clippy::missing_errors_doc,
    reason = "crate-wide fallible API uses one explicit error type; per-item boilerplate would duplicate contract"
)]

pub mod aggregate;
pub mod catalog;
pub mod config;
pub mod error;
pub mod hierarchy;
pub mod models;
pub mod statistics;
pub mod status;
pub mod store;
pub mod taxonomy;

pub use catalog::Catalog;
pub use config::CatalogConfig;
pub use error::{CatalogError, Result};
pub use status::{StatusBand, StatusCode};
pub use store::{EntityStore, SqliteCatalogStore};
pub use taxonomy::format_taxonomic_index;
