//! The trigger ruleset currently in effect.
//!
//! A [`TriggerSnapshot`] is immutable once built. [`SnapshotCell`] publishes
//! snapshots by swapping an `Arc`, so a reader holds one complete snapshot for
//! as long as it needs it and never observes a partially applied update.

use serde::{Deserialize, Serialize, Serializer};
use std::sync::{Arc, PoisonError, RwLock};
use uuid::Uuid;

use crate::error::{HotcueError, Result};
use crate::trigger::Trigger;

/// Upper bound on a config push body.
pub const MAX_CONFIG_PAYLOAD_BYTES: usize = 4 << 20;

// ---------------------------------------------------------------------------
// TriggerSnapshot
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct TriggerSnapshot {
    id: Uuid,
    triggers: Vec<Arc<Trigger>>,
}

impl TriggerSnapshot {
    pub fn new(triggers: Vec<Trigger>) -> Self {
        Self {
            id: Uuid::new_v4(),
            triggers: triggers.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Parse a config push: exactly one JSON array of triggers, nothing after it.
    pub fn from_json(payload: &[u8]) -> Result<Self> {
        if payload.len() > MAX_CONFIG_PAYLOAD_BYTES {
            return Err(HotcueError::PayloadTooLarge {
                size: payload.len(),
                limit: MAX_CONFIG_PAYLOAD_BYTES,
            });
        }
        let mut de = serde_json::Deserializer::from_slice(payload);
        let triggers = Vec::<Trigger>::deserialize(&mut de).map_err(HotcueError::InvalidPayload)?;
        de.end().map_err(|_| HotcueError::TrailingData)?;
        Ok(Self::new(triggers))
    }

    /// Random id, used to correlate log lines with a config push.
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn triggers(&self) -> &[Arc<Trigger>] {
        &self.triggers
    }

    pub fn len(&self) -> usize {
        self.triggers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }
}

impl Default for TriggerSnapshot {
    fn default() -> Self {
        Self::empty()
    }
}

impl Serialize for TriggerSnapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.triggers.iter().map(|t| t.as_ref()))
    }
}

// ---------------------------------------------------------------------------
// SnapshotCell
// ---------------------------------------------------------------------------

/// Holder of the current snapshot. The lock only guards the pointer swap;
/// matching runs against the cloned `Arc` with no lock held.
#[derive(Debug, Default)]
pub struct SnapshotCell {
    current: RwLock<Arc<TriggerSnapshot>>,
}

impl SnapshotCell {
    pub fn new(initial: TriggerSnapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(initial)),
        }
    }

    /// The snapshot in effect right now.
    pub fn load(&self) -> Arc<TriggerSnapshot> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Publish `next` wholesale, returning the snapshot it replaced.
    pub fn replace(&self, next: TriggerSnapshot) -> Arc<TriggerSnapshot> {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, Arc::new(next))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
