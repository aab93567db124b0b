//! Catalog domain: CSV ingestion, the in-memory store, and backup serialization.

pub mod loader;
pub mod serializer;
pub mod store;

pub use loader::{detect_schema, load_catalog, CsvSchema};
pub use store::{CatalogStore, Pagination, Stats};
