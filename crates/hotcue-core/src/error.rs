use thiserror::Error;

#[derive(Debug, Error)]
pub enum HotcueError {
    #[error("config not found: {0} (run 'hotcue-mesh init')")]
    ConfigNotFound(String),

    #[error("payload too large: {size} bytes exceeds the {limit} byte limit")]
    PayloadTooLarge { size: usize, limit: usize },

    #[error("invalid json payload: {0}")]
    InvalidPayload(#[source] serde_json::Error),

    #[error("payload must be a single json value")]
    TrailingData,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl HotcueError {
    /// True for errors caused by a rejected config push rather than by the
    /// service itself.
    pub fn is_payload_error(&self) -> bool {
        matches!(
            self,
            Self::PayloadTooLarge { .. } | Self::InvalidPayload(_) | Self::TrailingData
        )
    }
}

pub type Result<T> = std::result::Result<T, HotcueError>;
