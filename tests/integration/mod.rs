//! Integration tests for the cross-thread frame id map

mod cli_smoke;
mod config_integration;
mod dispatch_ordering;
mod properties;
mod test_utils;
