//! Core identifiers: frame keys and the frame id pairs they resolve to.

use crate::error::FrameMapError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Frame id reported for frames that cannot be resolved.
pub const INVALID_FRAME_ID: i32 = -1;

/// Frame id of a top-level frame. Its parent id is [`INVALID_FRAME_ID`].
pub const TOP_FRAME_ID: i32 = 0;

/// Routing id meaning "no routing id assigned".
pub const ROUTING_NONE: i32 = -2;

/// Identifies a frame by its owning process and per-process routing id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FrameKey {
    pub process_id: i32,
    pub routing_id: i32,
}

impl FrameKey {
    /// Key that never names a frame.
    pub const NONE: FrameKey = FrameKey {
        process_id: -1,
        routing_id: ROUTING_NONE,
    };

    pub const fn new(process_id: i32, routing_id: i32) -> Self {
        Self {
            process_id,
            routing_id,
        }
    }

    /// True when either component is negative. Such keys resolve to
    /// [`FrameIdPair::INVALID`] without a thread hop.
    pub const fn is_sentinel(&self) -> bool {
        self.process_id < 0 || self.routing_id < 0
    }
}

impl fmt::Display for FrameKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.process_id, self.routing_id)
    }
}

impl FromStr for FrameKey {
    type Err = FrameMapError;

    /// Parses `"<process>:<routing>"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (process, routing) = s
            .trim()
            .split_once(':')
            .ok_or_else(|| FrameMapError::InvalidKey(format!("expected <process>:<routing>, got '{}'", s)))?;
        let process_id = process
            .trim()
            .parse::<i32>()
            .map_err(|e| FrameMapError::InvalidKey(format!("bad process id '{}': {}", process, e)))?;
        let routing_id = routing
            .trim()
            .parse::<i32>()
            .map_err(|e| FrameMapError::InvalidKey(format!("bad routing id '{}': {}", routing, e)))?;
        Ok(FrameKey::new(process_id, routing_id))
    }
}

/// Resolved identifiers for a frame and its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameIdPair {
    pub frame_id: i32,
    pub parent_frame_id: i32,
}

impl FrameIdPair {
    pub const INVALID: FrameIdPair = FrameIdPair {
        frame_id: INVALID_FRAME_ID,
        parent_frame_id: INVALID_FRAME_ID,
    };

    pub const fn new(frame_id: i32, parent_frame_id: i32) -> Self {
        Self {
            frame_id,
            parent_frame_id,
        }
    }

    /// Pair for a top-level frame.
    pub const fn top_level() -> Self {
        Self::new(TOP_FRAME_ID, INVALID_FRAME_ID)
    }

    pub const fn is_valid(&self) -> bool {
        self.frame_id != INVALID_FRAME_ID
    }
}

impl Default for FrameIdPair {
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Display for FrameIdPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "frame={} parent={}", self.frame_id, self.parent_frame_id)
    }
}

impl FromStr for FrameIdPair {
    type Err = FrameMapError;

    /// Parses `"<frame>,<parent>"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (frame, parent) = s
            .trim()
            .split_once(',')
            .ok_or_else(|| FrameMapError::InvalidKey(format!("expected <frame>,<parent>, got '{}'", s)))?;
        let frame_id = frame
            .trim()
            .parse::<i32>()
            .map_err(|e| FrameMapError::InvalidKey(format!("bad frame id '{}': {}", frame, e)))?;
        let parent_frame_id = parent
            .trim()
            .parse::<i32>()
            .map_err(|e| FrameMapError::InvalidKey(format!("bad parent frame id '{}': {}", parent, e)))?;
        Ok(FrameIdPair::new(frame_id, parent_frame_id))
    }
}
