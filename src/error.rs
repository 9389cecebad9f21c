//! Error types for the frame id map.
//!
//! Resolution outcomes never surface here: an unresolvable frame yields
//! [`FrameIdPair::INVALID`](crate::types::FrameIdPair::INVALID). These errors
//! cover the plumbing around it.

use crate::types::FrameKey;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrameMapError {
    #[error("Owning thread unavailable: {0}")]
    OwnerUnavailable(String),

    #[error("Resolution for frame {0} was dropped before delivery")]
    ResolutionDropped(FrameKey),

    #[error("Invalid frame key: {0}")]
    InvalidKey(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for FrameMapError {
    fn from(err: config::ConfigError) -> Self {
        FrameMapError::ConfigError(err.to_string())
    }
}
