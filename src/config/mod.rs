pub mod types;

use std::path::Path;

use crate::error::{FlexstayError, Result};
use types::Config;

pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        tracing::info!(
            "Config file not found at {}, using defaults",
            path.display()
        );
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path).map_err(|e| {
        FlexstayError::Config(format!(
            "failed to read config file {}: {e}",
            path.display()
        ))
    })?;
    let config: Config = serde_yml::from_str(&content)?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.engine.max_navigation_attempts == 0 {
        return Err(FlexstayError::Config(
            "engine.max_navigation_attempts must be at least 1".into(),
        ));
    }
    if config.engine.max_quote_poll_attempts == 0 {
        return Err(FlexstayError::Config(
            "engine.max_quote_poll_attempts must be at least 1".into(),
        ));
    }
    if let Some(base) = &config.backend.api_base_url {
        url::Url::parse(base)?;
    }
    Ok(())
}
