//! Configuration System
//!
//! Layered configuration for the frame id map: built-in defaults, then the
//! global config file, then an explicit file, then `FRAME_ID_MAP_*` environment
//! variables. Validation reports every problem at once.

use crate::error::FrameMapError;
use crate::logging::LoggingConfig;
use config::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

mod merge;
mod sources;

pub use sources::global_file::global_config_path;

pub const DEFAULT_OWNER_THREAD_NAME: &str = "frame-id-owner";

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FrameMapConfig {
    /// Owning thread settings
    #[serde(default)]
    pub owner: OwnerConfig,

    /// Requesting-side dispatch settings
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnerConfig {
    /// Name given to the dedicated owning thread
    #[serde(default = "default_owner_thread_name")]
    pub thread_name: String,
}

fn default_owner_thread_name() -> String {
    DEFAULT_OWNER_THREAD_NAME.to_string()
}

impl Default for OwnerConfig {
    fn default() -> Self {
        Self {
            thread_name: default_owner_thread_name(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Most completions delivered by one non-blocking pump (0 = no limit)
    #[serde(default)]
    pub max_completions_per_pump: usize,
}

/// Configuration validation errors
#[derive(Debug, Clone)]
pub enum ValidationError {
    Owner(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Owner(msg) => write!(f, "Owner: {}", msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl OwnerConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.thread_name.trim().is_empty() {
            return Err("Thread name cannot be empty".to_string());
        }
        if self.thread_name.contains('\0') {
            return Err("Thread name cannot contain NUL bytes".to_string());
        }
        Ok(())
    }
}

impl FrameMapConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.owner.validate() {
            errors.push(ValidationError::Owner(e));
        }
        for e in self.logging.validate() {
            errors.push(ValidationError::Logging(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate, folding every problem into one error.
    pub fn ensure_valid(&self) -> Result<(), FrameMapError> {
        self.validate().map_err(|errors| {
            let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            FrameMapError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                messages.join("\n")
            ))
        })
    }
}

/// Loads [`FrameMapConfig`] from layered sources.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Defaults, global file, `config_path` if given, then environment overrides.
    pub fn load(config_path: Option<&Path>) -> Result<FrameMapConfig, ConfigError> {
        let mut builder = merge::merge_policy::builder_with_defaults()?;
        builder = sources::global_file::add_to_builder(builder)?;
        if let Some(path) = config_path {
            builder = sources::explicit_file::add_to_builder(builder, path)?;
        }
        builder = sources::environment::add_to_builder(builder);
        builder.build()?.try_deserialize()
    }

    /// Defaults overlaid with a single file; ignores the global file and environment.
    pub fn load_from_file(path: &Path) -> Result<FrameMapConfig, ConfigError> {
        let builder = merge::merge_policy::builder_with_defaults()?;
        sources::explicit_file::add_to_builder(builder, path)?
            .build()?
            .try_deserialize()
    }
}
