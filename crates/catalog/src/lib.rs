#![warn(missing_docs)]
//! Catalog adapters: where the list of known objects comes from.
//!
//! The backend exposes `GET /get-objects`, returning a JSON array of
//! `{name, x, y, z}` records, and `POST /store-object` accepting one record.
//! [`HttpCatalogSource`] talks to it; [`FileCatalogSource`] and
//! [`StaticCatalogSource`] serve the same data offline.

mod error;
mod http;
mod source;
mod wire;

pub use error::CatalogError;
pub use http::{
    HttpCatalogSource, HttpSourceConfig, RetryPolicy, DEFAULT_CATALOG_URL, OBJECTS_PATH,
    STORE_PATH,
};
pub use source::{fetch_catalog_or_empty, fetch_names, FileCatalogSource, StaticCatalogSource};
pub use wire::{decode_catalog, ObjectRecord};

use async_trait::async_trait;
use ctrlf_core::Catalog;

/// Anything that can produce the session catalog.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetch the full catalog, surfacing transport and decode failures.
    async fn fetch_catalog(&self) -> Result<Catalog, CatalogError>;

    /// Short human-readable description for logs.
    fn describe(&self) -> String;
}
