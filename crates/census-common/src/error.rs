//! Error types for the census choropleth viewer.

use thiserror::Error;

/// Result type alias using ChoroplethError.
pub type ChoroplethResult<T> = Result<T, ChoroplethError>;

/// Primary error type for view resolution, classification and fetching.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChoroplethError {
    // === Render cycle errors ===
    #[error("No boundary level configured for zoom {zoom}")]
    LevelNotFound { zoom: u8 },

    #[error("Statistic '{stat_id}' is not defined for boundary level '{level}'")]
    UnknownStat { level: String, stat_id: String },

    #[error("No data returned for statistic '{stat_id}' at boundary level '{level}'")]
    NoData { level: String, stat_id: String },

    // === Document and configuration errors ===
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Invalid class breaks: {0}")]
    InvalidBreaks(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // === Transport errors ===
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Request timeout")]
    Timeout,
}

impl ChoroplethError {
    /// Stable code reported to the UI collaborator.
    pub fn kind(&self) -> &'static str {
        match self {
            ChoroplethError::LevelNotFound { .. } => "LevelNotFound",
            ChoroplethError::UnknownStat { .. } => "UnknownStat",
            ChoroplethError::NoData { .. } => "NoData",
            ChoroplethError::InvalidDocument(_) => "InvalidDocument",
            ChoroplethError::InvalidBreaks(_) => "InvalidBreaks",
            ChoroplethError::InvalidConfig(_) => "InvalidConfig",
            ChoroplethError::Transport(_) => "Transport",
            ChoroplethError::Timeout => "Timeout",
        }
    }

    /// Whether the error abandons the current render cycle.
    ///
    /// The map stays on its prior state; the next view change re-runs the pipeline.
    pub fn is_render_fatal(&self) -> bool {
        matches!(
            self,
            ChoroplethError::LevelNotFound { .. }
                | ChoroplethError::UnknownStat { .. }
                | ChoroplethError::NoData { .. }
                | ChoroplethError::InvalidDocument(_)
                | ChoroplethError::Transport(_)
                | ChoroplethError::Timeout
        )
    }
}

impl From<serde_json::Error> for ChoroplethError {
    fn from(err: serde_json::Error) -> Self {
        ChoroplethError::InvalidDocument(format!("JSON error: {}", err))
    }
}

impl From<std::io::Error> for ChoroplethError {
    fn from(err: std::io::Error) -> Self {
        ChoroplethError::InvalidConfig(err.to_string())
    }
}
