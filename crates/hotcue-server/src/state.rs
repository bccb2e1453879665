use std::sync::Arc;

use hotcue_core::{SnapshotCell, TriggerSnapshot};
use tokio::sync::mpsc;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    /// Hand-off to the orchestrator; a full snapshot per config push.
    pub snapshot_tx: mpsc::Sender<TriggerSnapshot>,
    /// Read view of the snapshot currently in effect.
    pub snapshots: Arc<SnapshotCell>,
}

impl AppState {
    pub fn new(snapshot_tx: mpsc::Sender<TriggerSnapshot>, snapshots: Arc<SnapshotCell>) -> Self {
        Self {
            snapshot_tx,
            snapshots,
        }
    }
}
