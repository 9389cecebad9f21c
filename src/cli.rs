//! CLI domain: parse, route, output, and presentation only.
//! No domain orchestration beyond wiring a map to an owning thread.

mod output;
mod parse;
mod presentation;
mod route;

pub use output::map_error;
pub use parse::{Cli, Commands, FrameRegistration};
pub use presentation::{
    format_config_json, format_config_toml, format_deliveries_json, format_deliveries_text,
    Delivery,
};
pub use route::RunContext;
