//! Shared catalogs and bodies used across tests and demos.

use ctrlf_core::{Catalog, CatalogEntry, DVec3};

/// `/get-objects` body as the backend returns it for a small desk scene.
pub const DESK_CATALOG_JSON: &str = r#"[
  {"id": 1, "name": "Keys", "x": 0.5, "y": 0.0, "z": -1.0, "timestamp": "Sat, 08 Feb 2025 10:00:00 GMT"},
  {"id": 2, "name": "cup", "x": -0.3, "y": 0.1, "z": -0.6, "timestamp": "Sat, 08 Feb 2025 10:00:02 GMT"},
  {"id": 3, "name": "laptop", "x": 0.0, "y": -0.2, "z": -1.5, "timestamp": "Sat, 08 Feb 2025 10:00:04 GMT"}
]"#;

/// Single-entry catalog: `Keys` at `(0.5, 0, -1)` from the anchor.
pub fn keys_catalog() -> Catalog {
    Catalog::new(vec![entry("Keys", 0.5, 0.0, -1.0)])
}

/// Two entries on separate axes, handy for selection filtering.
pub fn axis_catalog() -> Catalog {
    Catalog::new(vec![entry("A", 1.0, 0.0, 0.0), entry("B", 0.0, 1.0, 0.0)])
}

fn entry(name: &str, x: f64, y: f64, z: f64) -> CatalogEntry {
    CatalogEntry::new(name, DVec3::new(x, y, z)).expect("fixture entries are valid")
}
