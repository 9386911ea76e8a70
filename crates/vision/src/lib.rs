//! Course perception
//!
//! Turns one RGB frame into the features the steering policy consumes:
//! - Colored blocks (red, green, blue, yellow) from HSV thresholds
//! - Orange and blue course lines near the bottom of the frame
//! - Wall proximity and angle from the largest dark region
//!
//! Detectors are stateless; every frame is analyzed on its own.

pub mod analysis;
pub mod blocks;
pub mod config;
pub mod contour;
pub mod hsv;
pub mod lines;
pub mod wall;

pub use analysis::{FeatureBundle, SteerHint};
pub use blocks::{BlockDetector, ColorClass, DetectedBlock};
pub use config::{ColorRemap, ColorThreshold, HsvRange, VisionConfig};
pub use contour::Point;
pub use lines::{LineDetector, LineReport, LineSegment};
pub use wall::{WallDetector, WallEstimate};

use camera_capture::VideoFrame;
use hsv::HsvFrame;
use thiserror::Error;
use tracing::debug;

/// Vision error types
#[derive(Error, Debug)]
pub enum VisionError {
    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    #[error("Invalid vision configuration: {0}")]
    Config(String),
}

/// All three detectors behind one call
pub struct VisionModule {
    wall_detector: WallDetector,
    line_detector: LineDetector,
    block_detector: BlockDetector,
}

impl VisionModule {
    /// Create new vision module
    pub fn new(config: VisionConfig) -> Result<Self, VisionError> {
        config.validate()?;
        Ok(Self {
            wall_detector: WallDetector::new(&config)?,
            line_detector: LineDetector::new(&config)?,
            block_detector: BlockDetector::new(&config)?,
        })
    }

    /// Analyze one frame
    pub fn analyze(&self, frame: &VideoFrame) -> Result<FeatureBundle, VisionError> {
        let wall = self.wall_detector.detect(frame)?;

        // HSV conversion is shared by the color detectors
        let hsv = HsvFrame::from_frame(frame)?;
        let lines = self.line_detector.detect_hsv(&hsv);
        let blocks = self.block_detector.detect_hsv(&hsv);

        debug!(
            "Frame {}: {} blocks, wall {:?}",
            frame.sequence,
            blocks.len(),
            wall.vertical_position
        );

        Ok(FeatureBundle {
            blocks,
            lines,
            wall,
            frame_width: frame.width,
            frame_height: frame.height,
            sequence: frame.sequence,
        })
    }
}
