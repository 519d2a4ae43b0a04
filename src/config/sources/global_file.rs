//! Global config file source: $XDG_CONFIG_HOME/deptree/config.toml (optional)

use crate::config::xdg;
use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File, FileFormat};

/// Add the global config file when it exists. A missing HOME skips the source.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let path = match xdg::global_config_file() {
        Ok(path) => path,
        Err(e) => {
            tracing::debug!("Skipping global config file: {}", e);
            return Ok(builder);
        }
    };
    Ok(builder.add_source(
        File::from(path)
            .format(FileFormat::Toml)
            .required(false),
    ))
}
