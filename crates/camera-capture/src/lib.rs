//! Camera Capture Library for the course rover
//!
//! Provides the frame type shared by every perception stage and the
//! sources that produce frames:
//! - Directory replay of recorded frames (PNG/JPEG/BMP)
//! - In-memory frame queue for tests and synthetic runs

pub mod frame;
pub mod source;

pub use frame::VideoFrame;
pub use source::{FrameQueue, FrameSource, ImageDirSource};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Camera error types
#[derive(Error, Debug)]
pub enum CameraError {
    #[error("Failed to open frame source: {0}")]
    Open(String),

    #[error("Invalid format: {0}")]
    Format(String),

    #[error("Failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Frame source exhausted")]
    Exhausted,
}

/// Camera configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Directory holding recorded frames, replayed in file-name order
    pub source_dir: PathBuf,
    /// Capture width
    pub width: u32,
    /// Capture height
    pub height: u32,
    /// Target FPS
    pub fps: u32,
    /// Start over from the first file once the directory is exhausted
    pub looping: bool,
    /// Delay before the first frame is requested (milliseconds)
    pub warmup_ms: u64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("frames"),
            width: 640,
            height: 480,
            fps: 30,
            looping: false,
            warmup_ms: 2000,
        }
    }
}

impl CameraConfig {
    /// Frame period in seconds (1 / fps)
    pub fn frame_period_s(&self) -> f64 {
        1.0 / self.fps.max(1) as f64
    }

    /// Frame period as a `Duration`
    pub fn frame_period(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(self.frame_period_s())
    }
}
