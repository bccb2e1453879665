use std::time::Duration;
use thiserror::Error;

use super::target::Protocol;
use crate::types::AppId;

#[derive(Debug, Error)]
pub enum RouterError {
    // -- configuration / contract -------------------------------------------
    #[error("no target configured for appId={0:?}")]
    NoTarget(AppId),

    #[error("action appId {action:?} does not match target appId {destination:?}")]
    DestinationMismatch { action: AppId, destination: AppId },

    #[error("empty action batch for appId={0:?}")]
    EmptyBatch(AppId),

    #[error("invalid {protocol} target: {reason}")]
    InvalidTarget { protocol: Protocol, reason: String },

    // -- send ---------------------------------------------------------------
    #[error("failed to serialize payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("http {method}: {status}: {body}")]
    HttpStatus {
        method: String,
        status: u16,
        body: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("osc encode failed: {0}")]
    Osc(String),

    #[error("{protocol} send timeout after {after:?}")]
    Timeout { protocol: Protocol, after: Duration },

    #[error("send cancelled")]
    Cancelled,
}

impl RouterError {
    /// True for misconfiguration and contract violations; false for failures
    /// of the send itself.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::NoTarget(_)
                | Self::DestinationMismatch { .. }
                | Self::EmptyBatch(_)
                | Self::InvalidTarget { .. }
        )
    }

    pub(crate) fn invalid(protocol: Protocol, reason: impl Into<String>) -> Self {
        Self::InvalidTarget {
            protocol,
            reason: reason.into(),
        }
    }
}
