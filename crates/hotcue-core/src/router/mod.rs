//! Multi-protocol delivery of action batches to downstream apps.
//!
//! A [`Router`] is built once from the configured [`AppTarget`]s and shared
//! read-only by every send. Each call to [`Router::send_actions`] is one
//! attempt: no retries, every await bounded by the target's timeout and by
//! the service [`Shutdown`] signal.
//!
//! The payload of every send is the owning trigger serialised as JSON, the
//! whole rule rather than only the actions in the batch.

mod error;
mod http;
mod osc;
mod target;
mod tcp;
mod udp;
mod wire;

pub use error::RouterError;
pub use target::{
    AppTarget, HttpTarget, OscTarget, Protocol, TcpTarget, UdpTarget, DEFAULT_HTTP_TIMEOUT,
    DEFAULT_OSC_PATH, DEFAULT_OSC_TIMEOUT, DEFAULT_TCP_TIMEOUT, DEFAULT_UDP_TIMEOUT,
};
pub use wire::payload;

use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;

use crate::shutdown::Shutdown;
use crate::trigger::ActionRef;
use crate::types::AppId;

pub type Result<T> = std::result::Result<T, RouterError>;

pub struct Router {
    targets: BTreeMap<AppId, AppTarget>,
    client: reqwest::Client,
}

impl Router {
    pub fn new(targets: BTreeMap<AppId, AppTarget>) -> Self {
        Self {
            targets,
            client: reqwest::Client::new(),
        }
    }

    pub fn target(&self, destination: &AppId) -> Option<&AppTarget> {
        self.targets.get(destination)
    }

    pub fn targets(&self) -> impl Iterator<Item = (&AppId, &AppTarget)> {
        self.targets.iter()
    }

    /// Deliver `actions` to `destination` with a single protocol send.
    pub async fn send_actions(
        &self,
        destination: &AppId,
        actions: &[ActionRef],
        shutdown: &Shutdown,
    ) -> Result<()> {
        let target = self
            .targets
            .get(destination)
            .ok_or_else(|| RouterError::NoTarget(destination.clone()))?;

        for action in actions {
            if action.app_id() != destination {
                return Err(RouterError::DestinationMismatch {
                    action: action.app_id().clone(),
                    destination: destination.clone(),
                });
            }
        }

        let owner = actions
            .first()
            .ok_or_else(|| RouterError::EmptyBatch(destination.clone()))?
            .trigger();
        let payload = payload(owner)?;

        tracing::debug!(
            destination = %destination,
            protocol = %target.protocol(),
            actions = actions.len(),
            bytes = payload.len(),
            "sending actions"
        );

        match target {
            AppTarget::Http(t) => http::send(&self.client, t, &payload, shutdown).await,
            AppTarget::Udp(t) => udp::send(t, &payload, shutdown).await,
            AppTarget::Tcp(t) => tcp::send(t, &payload, shutdown).await,
            AppTarget::Osc(t) => osc::send(t, payload, shutdown).await,
        }
    }
}

/// Race `fut` against `timeout` and the shutdown signal; whichever finishes
/// first decides the outcome. An already-fired shutdown always wins.
pub(crate) async fn bounded<T, F>(
    protocol: Protocol,
    timeout: Duration,
    shutdown: &Shutdown,
    fut: F,
) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        biased;
        _ = shutdown.cancelled() => Err(RouterError::Cancelled),
        res = tokio::time::timeout(timeout, fut) => {
            res.unwrap_or(Err(RouterError::Timeout { protocol, after: timeout }))
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
