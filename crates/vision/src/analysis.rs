//! Per-frame perception results

use serde::{Deserialize, Serialize};

use crate::blocks::{ColorClass, DetectedBlock};
use crate::lines::LineReport;
use crate::wall::WallEstimate;

/// Informational left/right suggestion from a detector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SteerHint {
    Left,
    Right,
    Straight,
}

/// Everything the perception stage extracted from one frame
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeatureBundle {
    /// Blocks in detector order (class order, then contour order)
    pub blocks: Vec<DetectedBlock>,

    pub lines: LineReport,

    pub wall: WallEstimate,

    pub frame_width: u32,
    pub frame_height: u32,
    pub sequence: u32,
}

impl FeatureBundle {
    /// Blocks whose real-world color is `color`, in detector order
    pub fn blocks_of(&self, color: ColorClass) -> impl Iterator<Item = &DetectedBlock> {
        self.blocks.iter().filter(move |b| b.color == color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contour::Point;

    fn block(color: ColorClass, x: i32, y: i32) -> DetectedBlock {
        DetectedBlock {
            color,
            perceived: color,
            center: Point::new(x, y),
            size: (20, 20),
            area: 361.0,
        }
    }

    #[test]
    fn test_blocks_of_keeps_detector_order() {
        let bundle = FeatureBundle {
            blocks: vec![
                block(ColorClass::Green, 10, 300),
                block(ColorClass::Red, 50, 400),
                block(ColorClass::Green, 20, 350),
                block(ColorClass::Green, 30, 350),
            ],
            ..Default::default()
        };
        let green: Vec<_> = bundle.blocks_of(ColorClass::Green).map(|b| b.center).collect();
        assert_eq!(
            green,
            vec![Point::new(10, 300), Point::new(20, 350), Point::new(30, 350)]
        );
        assert_eq!(bundle.blocks_of(ColorClass::Red).count(), 1);
        assert_eq!(bundle.blocks_of(ColorClass::Yellow).count(), 0);
    }
}
