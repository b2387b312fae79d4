//! Async session loop.
//!
//! One task owns the [`Session`]; everything else talks to it through a
//! [`SessionHandle`]. Events are applied strictly in arrival order and
//! placements are published on a `watch` channel holding the latest snapshot.

use crate::session::{PlacementSnapshot, Session, SessionConfig, SessionEvent, SessionStatus};
use ctrlf_catalog::{fetch_catalog_or_empty, CatalogSource};
use ctrlf_core::{Catalog, MarkerObservation, Selection};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Capacity of the command queue feeding the session task.
const COMMAND_QUEUE: usize = 256;

/// Errors returned by [`SessionHandle`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    /// The session task has stopped.
    #[error("session loop has shut down")]
    Closed,
}

enum SessionCommand {
    Event(SessionEvent),
    Status(oneshot::Sender<SessionStatus>),
    Shutdown,
}

/// Cloneable sender side of a running session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<SessionCommand>,
    placements: watch::Receiver<PlacementSnapshot>,
}

impl SessionHandle {
    /// Queue an event for the session task.
    pub async fn send(&self, event: SessionEvent) -> Result<(), SessionError> {
        self.commands
            .send(SessionCommand::Event(event))
            .await
            .map_err(|_| SessionError::Closed)
    }

    /// Report a decoded barcode.
    pub async fn observe_marker(&self, observation: MarkerObservation) -> Result<(), SessionError> {
        self.send(SessionEvent::AnchorObserved(observation)).await
    }

    /// Deliver a catalog (normally done by the fetch task).
    pub async fn catalog_loaded(&self, catalog: Catalog) -> Result<(), SessionError> {
        self.send(SessionEvent::CatalogLoaded(catalog)).await
    }

    /// Change which object is searched for.
    pub async fn select(&self, selection: Selection) -> Result<(), SessionError> {
        self.send(SessionEvent::SelectionChanged(selection)).await
    }

    /// Forget the anchor and clear placed markers.
    pub async fn reset(&self) -> Result<(), SessionError> {
        self.send(SessionEvent::Reset).await
    }

    /// State after every previously sent event has been applied.
    pub async fn status(&self) -> Result<SessionStatus, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(SessionCommand::Status(reply))
            .await
            .map_err(|_| SessionError::Closed)?;
        rx.await.map_err(|_| SessionError::Closed)
    }

    /// Latest published snapshot.
    pub fn latest(&self) -> PlacementSnapshot {
        self.placements.borrow().clone()
    }

    /// New receiver for placement snapshots.
    pub fn subscribe(&self) -> watch::Receiver<PlacementSnapshot> {
        self.placements.clone()
    }

    /// Ask the session task to stop after draining queued commands.
    pub async fn shutdown(&self) -> Result<(), SessionError> {
        self.commands
            .send(SessionCommand::Shutdown)
            .await
            .map_err(|_| SessionError::Closed)
    }
}

/// Spawn the session task with no catalog fetch; the caller delivers the
/// catalog through [`SessionHandle::catalog_loaded`].
///
/// The join handle yields the final [`Session`] once the loop stops.
pub fn spawn_session(config: SessionConfig) -> (SessionHandle, JoinHandle<Session>) {
    let (commands_tx, mut commands_rx) = mpsc::channel(COMMAND_QUEUE);
    let (placements_tx, placements_rx) = watch::channel(PlacementSnapshot::default());

    let join = tokio::spawn(async move {
        let mut session = Session::new(config);
        info!("Session started");

        while let Some(command) = commands_rx.recv().await {
            match command {
                SessionCommand::Event(event) => {
                    if let Some(snapshot) = session.apply(event) {
                        debug!(revision = snapshot.revision, "Publishing placements");
                        placements_tx.send_replace(snapshot);
                    }
                }
                SessionCommand::Status(reply) => {
                    let _ = reply.send(session.status());
                }
                SessionCommand::Shutdown => break,
            }
        }

        info!("Session stopped");
        session
    });

    let handle = SessionHandle {
        commands: commands_tx,
        placements: placements_rx,
    };
    (handle, join)
}

/// Spawn the session task and kick off a catalog fetch from `source`.
///
/// A failed fetch is logged and delivered as an empty catalog.
pub fn spawn_session_with_source(
    config: SessionConfig,
    source: Arc<dyn CatalogSource>,
) -> (SessionHandle, JoinHandle<Session>) {
    let (handle, join) = spawn_session(config);

    let fetch_handle = handle.clone();
    tokio::spawn(async move {
        let catalog = fetch_catalog_or_empty(source.as_ref()).await;
        if fetch_handle.catalog_loaded(catalog).await.is_err() {
            debug!("Session closed before the catalog arrived");
        }
    });

    (handle, join)
}
