use crate::config::CtrlfConfig;
use crate::event_script::EventScript;
use anyhow::{Context, Result};
use ctrlf_catalog::{CatalogSource, FileCatalogSource, HttpCatalogSource};
use ctrlf_core::{PlacementInstruction, Selection};
use ctrlf_session::{spawn_session_with_source, SessionHandle, SessionStatus};
use ctrlf_testkit::JsonlSink;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, sleep_until, Instant};
use tracing::{debug, info, warn};

/// Poll interval while waiting for the catalog fetch to land.
const CATALOG_POLL: Duration = Duration::from_millis(20);

pub struct HeadlessConfig {
    pub config: CtrlfConfig,
    pub catalog_file: Option<PathBuf>,
    pub script: Option<PathBuf>,
    pub select: Option<String>,
    pub placement_log: Option<PathBuf>,
    /// Longest wait for the catalog once the script has been replayed.
    pub settle: Duration,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub events_replayed: usize,
    pub revision: u64,
    pub catalog_entries: Option<usize>,
    pub placements: Vec<PlacementInstruction>,
    pub snapshots_logged: u64,
}

/// Pick the catalog source: a local file when given, the backend otherwise.
pub fn catalog_source(
    config: &CtrlfConfig,
    catalog_file: Option<PathBuf>,
) -> Result<Arc<dyn CatalogSource>> {
    let source: Arc<dyn CatalogSource> = match catalog_file {
        Some(path) => Arc::new(FileCatalogSource::new(path)),
        None => Arc::new(
            HttpCatalogSource::new(config.http_source())
                .context("failed to build catalog HTTP client")?,
        ),
    };
    Ok(source)
}

pub async fn run(cfg: HeadlessConfig) -> Result<RunSummary> {
    let script = match cfg.script.as_deref() {
        Some(path) => Some(
            EventScript::from_path(path)
                .with_context(|| format!("failed to load event script {}", path.display()))?,
        ),
        None => None,
    };

    let mut sink = match cfg.placement_log.as_deref() {
        Some(path) => Some(JsonlSink::create(path)?),
        None => None,
    };

    let source = catalog_source(&cfg.config, cfg.catalog_file)?;
    info!(source = %source.describe(), "Fetching catalog");
    let (handle, join) = spawn_session_with_source(cfg.config.session.clone(), source);

    let mut placements = handle.subscribe();
    let logger = tokio::spawn(async move {
        let mut logged = 0u64;
        while placements.changed().await.is_ok() {
            let snapshot = placements.borrow_and_update().clone();
            info!(
                revision = snapshot.revision,
                placed = snapshot.instructions.len(),
                added = snapshot.diff.added.len(),
                moved = snapshot.diff.moved.len(),
                removed = snapshot.diff.removed.len(),
                "Placements updated"
            );
            if let Some(writer) = sink.as_mut() {
                match writer.write("placements", &snapshot) {
                    Ok(_) => logged += 1,
                    Err(err) => {
                        warn!(%err, logged, "Failed to write placement log, closing it");
                        sink = None;
                    }
                }
            }
        }
        logged
    });

    if let Some(name) = cfg.select.as_deref() {
        handle.select(Selection::from_search(Some(name))).await?;
    }

    let events_replayed = match script {
        Some(script) => replay(&handle, script).await?,
        None => 0,
    };

    let status = wait_for_catalog(&handle, cfg.settle).await?;
    if status.catalog_entries.is_none() {
        warn!(
            settle_ms = cfg.settle.as_millis() as u64,
            "Catalog still pending at shutdown"
        );
    }
    let latest = handle.latest();

    handle.shutdown().await?;
    let session = join.await.context("session task panicked")?;
    debug!(markers = session.scene().len(), "Session joined");
    let snapshots_logged = logger.await.context("placement logger panicked")?;

    Ok(RunSummary {
        events_replayed,
        revision: status.revision,
        catalog_entries: status.catalog_entries,
        placements: latest.instructions,
        snapshots_logged,
    })
}

/// Feed script events to the session at their recorded offsets.
async fn replay(handle: &SessionHandle, mut script: EventScript) -> Result<usize> {
    let start = Instant::now();
    let mut sent = 0;
    while let Some(due) = script.next_due() {
        sleep_until(start + due).await;
        for event in script.drain_ready(start.elapsed()) {
            debug!(?event, "Replaying event");
            handle.send(event).await?;
            sent += 1;
        }
    }
    info!(events = sent, "Event script finished");
    Ok(sent)
}

async fn wait_for_catalog(handle: &SessionHandle, settle: Duration) -> Result<SessionStatus> {
    let deadline = Instant::now() + settle;
    loop {
        let status = handle.status().await?;
        if status.catalog_entries.is_some() || Instant::now() >= deadline {
            return Ok(status);
        }
        sleep(CATALOG_POLL).await;
    }
}
