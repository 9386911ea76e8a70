//! Vision configuration
//!
//! HSV bounds use the 8-bit OpenCV convention: hue in `[0, 180]`,
//! saturation and value in `[0, 255]`. Bounds are inclusive.

use serde::{Deserialize, Serialize};

use crate::blocks::ColorClass;
use crate::VisionError;

/// Inclusive HSV box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HsvRange {
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl HsvRange {
    pub const fn new(lower: [u8; 3], upper: [u8; 3]) -> Self {
        Self { lower, upper }
    }

    #[inline]
    pub fn contains(&self, hsv: [u8; 3]) -> bool {
        (0..3).all(|i| hsv[i] >= self.lower[i] && hsv[i] <= self.upper[i])
    }
}

/// Union of HSV boxes; classes that wrap the hue circle use two
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorThreshold {
    pub ranges: Vec<HsvRange>,
}

impl ColorThreshold {
    pub fn single(range: HsvRange) -> Self {
        Self { ranges: vec![range] }
    }

    pub fn union(ranges: impl IntoIterator<Item = HsvRange>) -> Self {
        Self {
            ranges: ranges.into_iter().collect(),
        }
    }

    #[inline]
    pub fn contains(&self, hsv: [u8; 3]) -> bool {
        self.ranges.iter().any(|r| r.contains(hsv))
    }

    fn validate(&self, name: &str) -> Result<(), VisionError> {
        if self.ranges.is_empty() {
            return Err(VisionError::Config(format!("{name}: no HSV ranges")));
        }
        for range in &self.ranges {
            if (0..3).any(|i| range.lower[i] > range.upper[i]) {
                return Err(VisionError::Config(format!(
                    "{name}: lower bound {:?} exceeds upper bound {:?}",
                    range.lower, range.upper
                )));
            }
        }
        Ok(())
    }
}

/// Camera-perceived class -> real-world block color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorRemap {
    pub red: ColorClass,
    pub green: ColorClass,
    pub blue: ColorClass,
    pub yellow: ColorClass,
}

impl Default for ColorRemap {
    fn default() -> Self {
        Self {
            red: ColorClass::Red,
            green: ColorClass::Green,
            blue: ColorClass::Blue,
            yellow: ColorClass::Yellow,
        }
    }
}

impl ColorRemap {
    /// Real-world identity of a perceived class
    pub fn real(&self, perceived: ColorClass) -> ColorClass {
        match perceived {
            ColorClass::Red => self.red,
            ColorClass::Green => self.green,
            ColorClass::Blue => self.blue,
            ColorClass::Yellow => self.yellow,
        }
    }
}

/// Color-region detector configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockConfig {
    pub red: ColorThreshold,
    pub green: ColorThreshold,
    pub blue: ColorThreshold,
    pub yellow: ColorThreshold,

    /// Contours at or below this area (px^2) are noise
    pub min_area: f64,

    pub remap: ColorRemap,
}

impl Default for BlockConfig {
    fn default() -> Self {
        Self {
            red: ColorThreshold::union([
                HsvRange::new([0, 100, 100], [10, 255, 255]),
                HsvRange::new([160, 100, 100], [180, 255, 255]),
            ]),
            green: ColorThreshold::single(HsvRange::new([40, 70, 70], [80, 255, 255])),
            blue: ColorThreshold::single(HsvRange::new([100, 150, 70], [130, 255, 255])),
            yellow: ColorThreshold::single(HsvRange::new([20, 100, 100], [35, 255, 255])),
            min_area: 100.0,
            remap: ColorRemap::default(),
        }
    }
}

impl BlockConfig {
    /// Threshold for a perceived class
    pub fn threshold(&self, class: ColorClass) -> &ColorThreshold {
        match class {
            ColorClass::Red => &self.red,
            ColorClass::Green => &self.green,
            ColorClass::Blue => &self.blue,
            ColorClass::Yellow => &self.yellow,
        }
    }
}

/// Course-line detector configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LineConfig {
    pub orange: ColorThreshold,
    pub blue: ColorThreshold,

    /// Rows examined, counting the bottom scanline
    pub scan_rows: u32,
}

impl Default for LineConfig {
    fn default() -> Self {
        Self {
            orange: ColorThreshold::single(HsvRange::new([8, 60, 60], [25, 255, 255])),
            blue: ColorThreshold::single(HsvRange::new([85, 40, 30], [130, 255, 255])),
            scan_rows: 9,
        }
    }
}

/// Wall detector configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WallConfig {
    /// Gray levels at or below this are wall
    pub dark_threshold: u8,
}

impl Default for WallConfig {
    fn default() -> Self {
        Self { dark_threshold: 40 }
    }
}

/// Vision configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionConfig {
    pub blocks: BlockConfig,
    pub lines: LineConfig,
    pub wall: WallConfig,
}

impl VisionConfig {
    /// Reject thresholds that can never match
    pub fn validate(&self) -> Result<(), VisionError> {
        for class in ColorClass::ALL {
            self.blocks
                .threshold(class)
                .validate(&format!("blocks.{}", class.as_str()))?;
        }
        self.lines.orange.validate("lines.orange")?;
        self.lines.blue.validate("lines.blue")?;
        if self.lines.scan_rows == 0 {
            return Err(VisionError::Config("lines.scan_rows must be at least 1".into()));
        }
        Ok(())
    }
}
