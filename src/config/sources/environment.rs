//! Environment overrides: FRAME_ID_MAP_<SECTION>__<KEY>, e.g. FRAME_ID_MAP_OWNER__THREAD_NAME.

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::Environment;

pub const ENV_PREFIX: &str = "FRAME_ID_MAP";

pub fn add_to_builder(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    )
}
