//! Colored block detection (obstacle pillars)

use camera_capture::VideoFrame;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::BlockConfig;
use crate::contour::{bounding_box, external_contours, polygon_area, Point};
use crate::hsv::HsvFrame;
use crate::{VisionConfig, VisionError};

/// Block color class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorClass {
    Red,
    Green,
    Blue,
    Yellow,
}

impl ColorClass {
    /// Fixed iteration order of the detector
    pub const ALL: [ColorClass; 4] = [
        ColorClass::Red,
        ColorClass::Green,
        ColorClass::Blue,
        ColorClass::Yellow,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ColorClass::Red => "red",
            ColorClass::Green => "green",
            ColorClass::Blue => "blue",
            ColorClass::Yellow => "yellow",
        }
    }
}

/// Detected block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedBlock {
    /// Real-world color after remapping
    pub color: ColorClass,

    /// Color class as the camera saw it
    pub perceived: ColorClass,

    /// Bounding-box center (pixels)
    pub center: Point,

    /// Bounding-box size (width, height)
    pub size: (u32, u32),

    /// Contour area (px^2)
    pub area: f64,
}

/// Color-region detector
pub struct BlockDetector {
    config: BlockConfig,
}

impl BlockDetector {
    pub fn new(config: &VisionConfig) -> Result<Self, VisionError> {
        config.validate()?;
        Ok(Self {
            config: config.blocks.clone(),
        })
    }

    /// Detect blocks in frame
    pub fn detect(&self, frame: &VideoFrame) -> Result<Vec<DetectedBlock>, VisionError> {
        let hsv = HsvFrame::from_frame(frame)?;
        Ok(self.detect_hsv(&hsv))
    }

    /// Detect blocks on an already converted frame
    pub fn detect_hsv(&self, hsv: &HsvFrame) -> Vec<DetectedBlock> {
        let mut blocks = Vec::new();

        for perceived in ColorClass::ALL {
            let mask = hsv.mask(self.config.threshold(perceived));
            let color = self.config.remap.real(perceived);

            for contour in external_contours(&mask) {
                let area = polygon_area(&contour);
                if area <= self.config.min_area {
                    continue;
                }
                let Some(bbox) = bounding_box(&contour) else {
                    continue;
                };
                blocks.push(DetectedBlock {
                    color,
                    perceived,
                    center: bbox.center(),
                    size: (bbox.width, bbox.height),
                    area,
                });
            }
        }

        debug!("Detected {} blocks", blocks.len());
        blocks
    }
}
