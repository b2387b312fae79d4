use anyhow::Result;
use ctrlf_catalog::{HttpSourceConfig, RetryPolicy, DEFAULT_CATALOG_URL};
use ctrlf_session::SessionConfig;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, time::Duration};
use tracing::warn;

pub const DEFAULT_CONFIG_PATH: &str = "config/ctrlf.toml";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CtrlfConfig {
    /// Scheme, host and port of the object backend.
    pub catalog_url: String,
    /// Per-request timeout for the catalog fetch.
    pub request_timeout_ms: u64,
    /// Retries after the first failed fetch.
    pub max_retries: u32,
    /// Backoff before the first retry; doubles per retry.
    pub retry_base_ms: u64,
    pub session: SessionConfig,
}

impl Default for CtrlfConfig {
    fn default() -> Self {
        Self {
            catalog_url: DEFAULT_CATALOG_URL.to_string(),
            request_timeout_ms: 5_000,
            max_retries: 2,
            retry_base_ms: 250,
            session: SessionConfig::default(),
        }
    }
}

impl CtrlfConfig {
    /// Load configuration from an explicit path, falling back to defaults on errors.
    pub fn load_from_path(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<CtrlfConfig>(&contents) {
                Ok(cfg) => cfg,
                Err(err) => {
                    warn!("Failed to parse {}: {err}. Using defaults", path.display());
                    CtrlfConfig::default()
                }
            },
            Err(err) => {
                if path != Path::new(DEFAULT_CONFIG_PATH)
                    || err.kind() != std::io::ErrorKind::NotFound
                {
                    warn!("Failed to read {}: {err}. Using defaults", path.display());
                }
                CtrlfConfig::default()
            }
        }
    }

    /// Save configuration to an explicit path.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        let toml = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml)?;
        Ok(())
    }

    pub fn http_source(&self) -> HttpSourceConfig {
        HttpSourceConfig {
            base_url: self.catalog_url.clone(),
            timeout: Duration::from_millis(self.request_timeout_ms.max(1)),
            retry: RetryPolicy {
                max_retries: self.max_retries,
                base_delay: Duration::from_millis(self.retry_base_ms),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctrlf_core::{AnchorPolicy, DuplicatePolicy, MarkerPayload};
    use ctrlf_session::ScenePolicy;

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let cfg = CtrlfConfig::load_from_path(&dir.path().join("nope.toml"));
        assert_eq!(cfg, CtrlfConfig::default());
        assert_eq!(cfg.session.marker.as_str(), "ctrlF_app");
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("ctrlf.toml");
        fs::write(
            &path,
            r#"
catalog_url = "http://10.0.0.7:5000"

[session]
marker = "ctrlF app"
duplicate_policy = "first_match"

[session.anchor_policy]
mode = "min_displacement"
meters = 0.05
"#,
        )
        .expect("write config");

        let cfg = CtrlfConfig::load_from_path(&path);
        assert_eq!(cfg.catalog_url, "http://10.0.0.7:5000");
        assert_eq!(cfg.request_timeout_ms, 5_000);
        assert_eq!(cfg.session.marker, MarkerPayload::new("ctrlF app"));
        assert_eq!(cfg.session.duplicate_policy, DuplicatePolicy::FirstMatch);
        assert_eq!(cfg.session.scene_policy, ScenePolicy::UpdateInPlace);
        assert_eq!(
            cfg.session.anchor_policy,
            AnchorPolicy::MinDisplacement { meters: 0.05 }
        );
    }

    #[test]
    fn invalid_file_uses_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("ctrlf.toml");
        fs::write(&path, "catalog_url = [").expect("write config");
        assert_eq!(CtrlfConfig::load_from_path(&path), CtrlfConfig::default());
    }

    #[test]
    fn saved_config_loads_back() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("nested").join("ctrlf.toml");
        let mut cfg = CtrlfConfig::default();
        cfg.max_retries = 5;
        cfg.session.scene_policy = ScenePolicy::Rebuild;

        cfg.save_to_path(&path).expect("save");
        assert_eq!(CtrlfConfig::load_from_path(&path), cfg);
    }

    #[test]
    fn shipped_config_matches_defaults() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join(DEFAULT_CONFIG_PATH);
        assert_eq!(CtrlfConfig::load_from_path(&path), CtrlfConfig::default());
    }

    #[test]
    fn http_source_uses_configured_timing() {
        let cfg = CtrlfConfig {
            request_timeout_ms: 1_500,
            max_retries: 1,
            retry_base_ms: 100,
            ..CtrlfConfig::default()
        };
        let http = cfg.http_source();
        assert_eq!(http.timeout, Duration::from_millis(1_500));
        assert_eq!(http.retry.max_retries, 1);
        assert_eq!(http.retry.base_delay, Duration::from_millis(100));
    }
}
