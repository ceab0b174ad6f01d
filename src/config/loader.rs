use config::{Config, Environment, File};
use tracing::{debug, info};

use super::settings::MonitorConfig;
use crate::error::{MonitorError, Result};

/// Load configuration: defaults, then the optional TOML file, then
/// `LIQUIDITY__SECTION__KEY` environment overrides (`.env` is honoured).
pub fn load_config(path: &str) -> Result<MonitorConfig> {
    if dotenvy::dotenv().is_ok() {
        debug!("Loaded environment from .env");
    }

    let settings = Config::builder()
        .add_source(File::with_name(path).required(false))
        .add_source(
            Environment::with_prefix("LIQUIDITY")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let config: MonitorConfig = settings.try_deserialize()?;
    config.validate().map_err(MonitorError::InvalidConfig)?;

    info!(
        "Configuration loaded (horizon={}d, score window={}, db={})",
        config.general.delta_horizon, config.score.window, config.general.database_url
    );
    Ok(config)
}
