//! Environment variable source: DEPTREE__* prefix with __ separator

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::Environment;

pub const ENV_PREFIX: &str = "DEPTREE";

/// Add environment variable overlay to builder.
/// Uses DEPTREE__ prefix and __ as separator for nested keys,
/// e.g. `DEPTREE__CACHE__FRESHNESS_SECS=3600`.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .try_parsing(true),
    );
    Ok(builder)
}
