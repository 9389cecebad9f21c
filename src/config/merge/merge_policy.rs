//! Merge rules: defaults and override order.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("owner.thread_name", crate::config::DEFAULT_OWNER_THREAD_NAME)?
        .set_default("dispatch.max_completions_per_pump", 0_i64)
}
