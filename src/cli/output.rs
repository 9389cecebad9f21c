//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::FrameMapError;

/// Map domain/service errors to a string for CLI output.
pub fn map_error(e: &FrameMapError) -> String {
    match e {
        FrameMapError::InvalidKey(msg) => format!("invalid argument: {}", msg),
        other => other.to_string(),
    }
}
