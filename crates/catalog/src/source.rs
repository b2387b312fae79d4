//! Offline sources and the degrade-to-empty helpers.

use crate::error::CatalogError;
use crate::wire::decode_catalog;
use crate::CatalogSource;
use async_trait::async_trait;
use ctrlf_core::Catalog;
use std::path::PathBuf;
use tracing::warn;

/// Fetch a catalog, substituting an empty one on failure.
///
/// The failure is logged; the session treats an empty catalog as "nothing to
/// place yet".
pub async fn fetch_catalog_or_empty(source: &dyn CatalogSource) -> Catalog {
    match source.fetch_catalog().await {
        Ok(catalog) => catalog,
        Err(err) => {
            warn!(source = %source.describe(), %err, "Catalog unavailable, using empty catalog");
            Catalog::empty()
        }
    }
}

/// Distinct object names for search UIs; empty on failure.
pub async fn fetch_names(source: &dyn CatalogSource) -> Vec<String> {
    fetch_catalog_or_empty(source).await.names()
}

/// Reads a `/get-objects`-shaped JSON file from disk.
#[derive(Debug, Clone)]
pub struct FileCatalogSource {
    path: PathBuf,
}

impl FileCatalogSource {
    /// Source reading `path` on every fetch.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CatalogSource for FileCatalogSource {
    async fn fetch_catalog(&self) -> Result<Catalog, CatalogError> {
        let body = tokio::fs::read(&self.path).await?;
        decode_catalog(&body)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Serves a fixed catalog; used by tests and demos.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalogSource {
    catalog: Catalog,
}

impl StaticCatalogSource {
    /// Source always returning `catalog`.
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl CatalogSource for StaticCatalogSource {
    async fn fetch_catalog(&self) -> Result<Catalog, CatalogError> {
        Ok(self.catalog.clone())
    }

    fn describe(&self) -> String {
        format!("static catalog ({} entries)", self.catalog.len())
    }
}
