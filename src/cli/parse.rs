//! CLI parse: clap types for frame-id-map. No behavior; definitions only.

use crate::error::FrameMapError;
use crate::types::{FrameIdPair, FrameKey};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::str::FromStr;

/// frame-id-map - resolve frame keys to frame ids across threads
#[derive(Parser)]
#[command(name = "frame-id-map")]
#[command(about = "Resolve (process, routing) frame keys to frame ids through an owning thread")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path (layered over defaults and the global file)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Register frames on the owning thread and resolve keys through the map
    Resolve {
        /// Live frame, as <process>:<routing>=<frame>,<parent> (repeatable)
        #[arg(long = "frame")]
        frames: Vec<FrameRegistration>,

        /// Also seed the cache with each registered frame
        #[arg(long)]
        seed: bool,

        /// Frame destroyed before the requests are made (repeatable)
        #[arg(long = "destroy")]
        destroyed: Vec<FrameKey>,

        /// Keys to resolve, in request order, as <process>:<routing>
        #[arg(required = true, allow_hyphen_values = true)]
        keys: Vec<FrameKey>,

        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Show the effective configuration
    Config {
        /// Output format (toml or json)
        #[arg(long, default_value = "toml")]
        format: String,
    },
}

/// A frame announced on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRegistration {
    pub key: FrameKey,
    pub ids: FrameIdPair,
}

impl FromStr for FrameRegistration {
    type Err = FrameMapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key, ids) = s.split_once('=').ok_or_else(|| {
            FrameMapError::InvalidKey(format!(
                "expected <process>:<routing>=<frame>,<parent>, got '{}'",
                s
            ))
        })?;
        Ok(Self {
            key: key.parse()?,
            ids: ids.parse()?,
        })
    }
}
