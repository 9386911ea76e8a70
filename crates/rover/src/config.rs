//! Rover configuration
//!
//! Layered, lowest first: built-in defaults, an optional TOML file
//! (`rover.toml`, or the path in `ROVER_CONFIG`), then environment
//! variables such as `ROVER_CONTROL__OVERRIDE_RULE=time`.

use std::net::SocketAddr;
use std::path::PathBuf;

use actuation::ActuatorConfig;
use camera_capture::CameraConfig;
use serde::{Deserialize, Serialize};
use steering::ControlConfig;
use vision::VisionConfig;

use crate::RoverError;

/// Default config file, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "rover.toml";

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "ROVER_CONFIG";

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Max level: trace, debug, info, warn or error
    pub level: String,

    /// One JSON object per line instead of plain text
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Metrics configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Serve Prometheus metrics on this address when set
    pub listen: Option<SocketAddr>,
}

/// Complete rover configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RoverConfig {
    pub camera: CameraConfig,
    pub vision: VisionConfig,
    pub control: ControlConfig,
    pub actuator: ActuatorConfig,
    pub log: LogConfig,
    pub metrics: MetricsConfig,
}

impl RoverConfig {
    /// Load from the default locations
    pub fn load() -> Result<Self, RoverError> {
        match std::env::var_os(CONFIG_PATH_ENV) {
            Some(path) => Self::load_from(Some(PathBuf::from(path)), true),
            None => Self::load_from(Some(PathBuf::from(DEFAULT_CONFIG_FILE)), false),
        }
    }

    /// Load from `file` (if any) layered under `ROVER_*` environment variables
    pub fn load_from(file: Option<PathBuf>, required: bool) -> Result<Self, RoverError> {
        let mut builder = ::config::Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(::config::File::from(path).required(required));
        }
        let settings = builder
            .add_source(
                ::config::Environment::with_prefix("ROVER")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: RoverConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), RoverError> {
        if self.camera.width == 0 || self.camera.height == 0 {
            return Err(RoverError::Config(format!(
                "camera size {}x{} is empty",
                self.camera.width, self.camera.height
            )));
        }
        if self.camera.fps == 0 {
            return Err(RoverError::Config("camera.fps must be at least 1".into()));
        }
        self.vision.validate()?;
        self.control.validate()?;
        Ok(())
    }
}
