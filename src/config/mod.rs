mod types;

pub use types::*;

use crate::{Error, Result};
use std::{
    env,
    path::{Path, PathBuf},
};
use tracing::debug;

/// Where the active configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    /// The file was absent; built-in defaults are in use.
    Defaults(PathBuf),
}

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: Config,
    pub source: ConfigSource,
}

pub async fn load() -> Result<LoadedConfig> {
    let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.yaml".to_string());
    load_from(&config_path).await
}

pub async fn load_from(config_path: impl AsRef<Path>) -> Result<LoadedConfig> {
    let config_path = config_path.as_ref();

    if !tokio::fs::try_exists(config_path).await? {
        return Ok(LoadedConfig {
            config: Config::default(),
            source: ConfigSource::Defaults(config_path.to_path_buf()),
        });
    }

    debug!("Loading configuration from: {}", config_path.display());

    let config_str = tokio::fs::read_to_string(config_path).await?;
    let config = parse(&config_str)?;

    Ok(LoadedConfig {
        config,
        source: ConfigSource::File(config_path.to_path_buf()),
    })
}

pub fn parse(config_str: &str) -> Result<Config> {
    // An empty document deserializes to null rather than an empty mapping
    let config: Config = if config_str.trim().is_empty() {
        Config::default()
    } else {
        serde_yaml::from_str(config_str)?
    };
    config.validate()?;
    Ok(config)
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.server.cors.allowed_origins.is_empty() {
            return Err(Error::config("server.cors.allowed_origins must not be empty"));
        }
        if self.server.max_message_bytes == 0 {
            return Err(Error::config("server.max_message_bytes must be positive"));
        }
        self.estimator.validate()
    }
}

impl EstimatorConfig {
    pub fn validate(&self) -> Result<()> {
        self.left_eye.validate("estimator.left_eye")?;
        self.right_eye.validate("estimator.right_eye")?;

        if !(0.0..=1.0).contains(&self.iris_fraction) {
            return Err(Error::config("estimator.iris_fraction must be within [0, 1]"));
        }
        if !(0.0 < self.right_threshold
            && self.right_threshold < self.left_threshold
            && self.left_threshold < 1.0)
        {
            return Err(Error::config(format!(
                "estimator thresholds must satisfy 0 < right ({}) < left ({}) < 1",
                self.right_threshold, self.left_threshold
            )));
        }
        if self.blink_ratio <= 0.0 {
            return Err(Error::config("estimator.blink_ratio must be positive"));
        }
        if self.calibration_frames == 0 {
            return Err(Error::config(
                "estimator.calibration_frames must be at least 1",
            ));
        }
        if self.min_pupil_pixels == 0 {
            return Err(Error::config("estimator.min_pupil_pixels must be positive"));
        }

        Ok(())
    }
}

impl EyeRegion {
    fn validate(&self, name: &str) -> Result<()> {
        let inside = self.x >= 0.0
            && self.y >= 0.0
            && self.width > 0.0
            && self.height > 0.0
            && self.x + self.width <= 1.0
            && self.y + self.height <= 1.0;

        if !inside {
            return Err(Error::config(format!(
                "{} must be a non-empty rectangle inside the unit square, got {:?}",
                name, self
            )));
        }
        Ok(())
    }
}
