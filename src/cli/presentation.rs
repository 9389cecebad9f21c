//! CLI presentation: text and json formatters.

use crate::config::FrameMapConfig;
use crate::error::FrameMapError;
use crate::types::{FrameIdPair, FrameKey};
use serde::Serialize;

/// One callback invocation observed while resolving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Delivery {
    /// Position of the request on the command line
    pub request: usize,
    pub key: FrameKey,
    pub ids: FrameIdPair,
    /// True when the callback ran inside the resolve call itself
    pub synchronous: bool,
}

pub fn format_deliveries_text(deliveries: &[Delivery]) -> String {
    let mut lines = Vec::with_capacity(deliveries.len());
    for delivery in deliveries {
        lines.push(format!(
            "#{:<3} {:<12} frame_id={:<6} parent_frame_id={:<6} {}",
            delivery.request,
            delivery.key.to_string(),
            delivery.ids.frame_id,
            delivery.ids.parent_frame_id,
            if delivery.synchronous { "sync" } else { "async" }
        ));
    }
    lines.join("\n")
}

pub fn format_deliveries_json(deliveries: &[Delivery]) -> Result<String, FrameMapError> {
    serde_json::to_string_pretty(&serde_json::json!({ "deliveries": deliveries }))
        .map_err(|e| FrameMapError::ConfigError(format!("Failed to encode output: {}", e)))
}

pub fn format_config_toml(config: &FrameMapConfig) -> Result<String, FrameMapError> {
    toml::to_string_pretty(config)
        .map_err(|e| FrameMapError::ConfigError(format!("Failed to encode config: {}", e)))
}

pub fn format_config_json(config: &FrameMapConfig) -> Result<String, FrameMapError> {
    serde_json::to_string_pretty(config)
        .map_err(|e| FrameMapError::ConfigError(format!("Failed to encode config: {}", e)))
}
