//! Frame Id Map: Cross-Thread Frame Identifier Resolution
//!
//! Resolves `(process id, routing id)` frame keys to `(frame id, parent frame id)`
//! pairs. The authoritative answer lives on a single owning thread; requesting
//! threads share a cache and get their callbacks back in request order.

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod ledger;
pub mod logging;
pub mod map;
pub mod resolver;
pub mod task;
pub mod types;
