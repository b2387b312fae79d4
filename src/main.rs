//! ctrlf - find-my-object placement runner
//!
//! Replays marker detections against the object catalog and prints where each
//! object's marker lands in world space.

mod config;
mod event_script;
mod headless;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use config::{CtrlfConfig, DEFAULT_CONFIG_PATH};
use ctrlf_catalog::{fetch_names, HttpCatalogSource, ObjectRecord};
use ctrlf_core::{CameraIntrinsics, DVec2, DVec3, DEFAULT_FOCAL_LENGTH_PX};
use headless::HeadlessConfig;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Place catalog objects relative to a scanned marker", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    /// Override the backend base URL from the config file
    #[arg(long, global = true)]
    catalog_url: Option<String>,
    /// Read the catalog from a local `/get-objects`-shaped JSON file instead of the backend
    #[arg(long, global = true)]
    catalog_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a session, optionally replaying an event script, and print the final placements
    Run {
        /// JSON event script with marker/select/reset steps
        #[arg(long)]
        script: Option<PathBuf>,
        /// Object name to search for; omit to place every object
        #[arg(long)]
        select: Option<String>,
        /// Write every placement snapshot to this JSONL file
        #[arg(long)]
        placement_log: Option<PathBuf>,
        /// Longest wait for the catalog after the script finishes, in milliseconds
        #[arg(long, default_value_t = 1_000)]
        settle_ms: u64,
    },
    /// Print the distinct object names in the catalog
    Names,
    /// Record one object position with the backend
    Store(StoreArgs),
    /// Write the effective configuration to a TOML file
    InitConfig {
        /// Destination; defaults to the --config path
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct StoreArgs {
    /// Object name, e.g. a detector class label
    name: String,
    /// Offset from the anchor in meters
    #[arg(
        long,
        num_args = 3,
        value_names = ["X", "Y", "Z"],
        allow_negative_numbers = true,
        conflicts_with = "pixel",
        required_unless_present = "pixel"
    )]
    offset: Option<Vec<f64>>,
    /// Bounding-box center in pixels, back-projected with --depth
    #[arg(long, num_args = 2, value_names = ["PX", "PY"], requires = "depth")]
    pixel: Option<Vec<f64>>,
    /// Estimated depth of the object in meters
    #[arg(long)]
    depth: Option<f64>,
    /// Detector image size in pixels
    #[arg(long, num_args = 2, value_names = ["W", "H"], default_values_t = [640.0, 480.0])]
    image_size: Vec<f64>,
    /// Detector camera focal length in pixels
    #[arg(long, default_value_t = DEFAULT_FOCAL_LENGTH_PX)]
    focal_length: f64,
}

impl StoreArgs {
    /// Offset to store: given directly, or back-projected from a pixel.
    fn offset(&self) -> Result<DVec3> {
        if let Some(&[x, y, z]) = self.offset.as_deref() {
            return Ok(DVec3::new(x, y, z));
        }
        let (Some(&[px, py]), Some(depth), &[width, height]) =
            (self.pixel.as_deref(), self.depth, self.image_size.as_slice())
        else {
            anyhow::bail!("pass either --offset X Y Z or --pixel PX PY --depth D");
        };
        let camera = CameraIntrinsics::new(self.focal_length, width, height)
            .context("focal length and image size must be positive")?;
        Ok(camera.screen_to_world(DVec2::new(px, py), depth))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    info!("Starting ctrlf v{}", env!("CARGO_PKG_VERSION"));

    let mut config = CtrlfConfig::load_from_path(&cli.config);
    if let Some(url) = cli.catalog_url {
        config.catalog_url = url;
    }

    match cli.command {
        Command::Run {
            script,
            select,
            placement_log,
            settle_ms,
        } => {
            let summary = headless::run(HeadlessConfig {
                config,
                catalog_file: cli.catalog_file,
                script,
                select,
                placement_log,
                settle: Duration::from_millis(settle_ms),
            })
            .await?;
            info!(
                revision = summary.revision,
                placed = summary.placements.len(),
                "Run complete"
            );
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Command::Names => {
            let source = headless::catalog_source(&config, cli.catalog_file)?;
            for name in fetch_names(source.as_ref()).await {
                println!("{name}");
            }
        }
        Command::Store(args) => {
            let record = ObjectRecord::new(args.name.clone(), args.offset()?);
            let source = HttpCatalogSource::new(config.http_source())
                .context("failed to build catalog HTTP client")?;
            source
                .store_object(&record)
                .await
                .with_context(|| format!("failed to store {}", record.name))?;
            println!("{}", serde_json::to_string(&record)?);
        }
        Command::InitConfig { out } => {
            let path = out.unwrap_or(cli.config);
            config.save_to_path(&path)?;
            info!(path = %path.display(), "Wrote configuration");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_run_with_global_flags() {
        let cli = Cli::try_parse_from([
            "ctrlf",
            "run",
            "--select",
            "keys",
            "--catalog-file",
            "objects.json",
            "--settle-ms",
            "250",
        ])
        .expect("valid args");

        assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG_PATH));
        assert_eq!(cli.catalog_file, Some(PathBuf::from("objects.json")));
        match cli.command {
            Command::Run {
                select, settle_ms, ..
            } => {
                assert_eq!(select.as_deref(), Some("keys"));
                assert_eq!(settle_ms, 250);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn store_accepts_a_direct_offset() {
        let cli = Cli::try_parse_from(["ctrlf", "store", "keys", "--offset", "0.5", "0", "-1"])
            .expect("valid args");
        let Command::Store(args) = cli.command else {
            panic!("expected store");
        };
        assert_eq!(args.name, "keys");
        assert_eq!(args.offset().expect("offset"), DVec3::new(0.5, 0.0, -1.0));
    }

    #[test]
    fn store_back_projects_a_pixel() {
        let cli = Cli::try_parse_from([
            "ctrlf", "store", "cup", "--pixel", "440", "180", "--depth", "2",
        ])
        .expect("valid args");
        let Command::Store(args) = cli.command else {
            panic!("expected store");
        };
        assert_eq!(args.offset().expect("offset"), DVec3::new(0.4, -0.2, 2.0));
    }

    #[test]
    fn store_needs_a_position() {
        assert!(Cli::try_parse_from(["ctrlf", "store", "cup"]).is_err());
        assert!(Cli::try_parse_from(["ctrlf", "store", "cup", "--pixel", "1", "2"]).is_err());
    }

    #[test]
    fn cli_requires_a_subcommand() {
        assert!(Cli::try_parse_from(["ctrlf"]).is_err());
    }
}
