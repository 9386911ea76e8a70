//! Course rover
//!
//! Wires the stages together: frames from a [`FrameSource`], features from
//! the vision module, a steering command from the override machine or the
//! control policy, and motor commands on an [`Actuator`].

pub mod config;
pub mod frame_loop;
pub mod telemetry;

pub use config::{LogConfig, MetricsConfig, RoverConfig};
pub use frame_loop::{FrameLoop, FrameReport, LoopSummary, StopReason};
pub use telemetry::{init_logging, init_metrics};

pub use actuation::Actuator;
pub use camera_capture::FrameSource;

use camera_capture::CameraError;
use steering::SteeringError;
use thiserror::Error;
use vision::VisionError;

/// Rover error types
#[derive(Error, Debug)]
pub enum RoverError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),

    #[error("Camera error: {0}")]
    Camera(#[from] CameraError),

    #[error("Vision error: {0}")]
    Vision(#[from] VisionError),

    #[error("Steering error: {0}")]
    Steering(#[from] SteeringError),

    #[error("Logging setup failed: {0}")]
    Logging(String),

    #[error("Metrics setup failed: {0}")]
    Metrics(String),
}
