//! Course-line detection near the bottom of the frame
//!
//! Each tracked color is reduced to a segment between the leftmost and the
//! rightmost mask pixels found on the last few scanlines. This is not a line
//! fit; the two extremes are the whole model.

use camera_capture::VideoFrame;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analysis::SteerHint;
use crate::config::{ColorThreshold, LineConfig};
use crate::contour::Point;
use crate::hsv::HsvFrame;
use crate::{VisionConfig, VisionError};

/// Segment between two mask pixels of the same color
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineSegment {
    pub start: Point,
    pub end: Point,
}

impl LineSegment {
    pub fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }

    /// Absolute direction angle in degrees, in `[0, 180]`
    pub fn angle_degrees(&self) -> f64 {
        let dx = (self.end.x - self.start.x) as f64;
        let dy = (self.end.y - self.start.y) as f64;
        dy.atan2(dx).to_degrees().abs()
    }
}

/// Line detection result
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LineReport {
    pub orange: Option<LineSegment>,
    pub blue: Option<LineSegment>,
    pub orange_angle: Option<f64>,
    pub blue_angle: Option<f64>,

    /// Informational only; the policy runs its own corner test
    pub steer_hint: Option<SteerHint>,
    pub hint_reason: Option<String>,
}

/// Orange/blue course-line detector
pub struct LineDetector {
    config: LineConfig,
}

impl LineDetector {
    pub fn new(config: &VisionConfig) -> Result<Self, VisionError> {
        config.validate()?;
        Ok(Self {
            config: config.lines.clone(),
        })
    }

    /// Detect both course lines
    pub fn detect(&self, frame: &VideoFrame) -> Result<LineReport, VisionError> {
        let hsv = HsvFrame::from_frame(frame)?;
        Ok(self.detect_hsv(&hsv))
    }

    /// Detect both course lines on an already converted frame
    pub fn detect_hsv(&self, hsv: &HsvFrame) -> LineReport {
        let orange = scan_segment(hsv, &self.config.orange, self.config.scan_rows);
        let blue = scan_segment(hsv, &self.config.blue, self.config.scan_rows);
        let orange_angle = orange.map(|s| s.angle_degrees());
        let blue_angle = blue.map(|s| s.angle_degrees());

        let (steer_hint, hint_reason) = match (orange_angle, blue_angle) {
            (Some(o), Some(b)) if b < o => (
                Some(SteerHint::Left),
                Some(format!("blue_angle({b:.1}) < orange_angle({o:.1})")),
            ),
            (Some(o), Some(b)) if o < b => (
                Some(SteerHint::Right),
                Some(format!("orange_angle({o:.1}) < blue_angle({b:.1})")),
            ),
            (Some(_), Some(_)) => (None, Some("angles equal".to_string())),
            _ => (None, None),
        };

        debug!(
            "Lines: orange={:?} ({:?} deg), blue={:?} ({:?} deg)",
            orange, orange_angle, blue, blue_angle
        );

        LineReport {
            orange,
            blue,
            orange_angle,
            blue_angle,
            steer_hint,
            hint_reason,
        }
    }
}

/// Accumulate mask pixels from the bottom row upward until two are found,
/// then span the leftmost and rightmost of them.
fn scan_segment(hsv: &HsvFrame, threshold: &ColorThreshold, scan_rows: u32) -> Option<LineSegment> {
    if hsv.width == 0 || hsv.height == 0 {
        return None;
    }
    let bottom = hsv.height - 1;
    let mut points: Vec<Point> = Vec::new();

    for step in 0..scan_rows.min(hsv.height) {
        let y = bottom - step;
        points.extend(
            (0..hsv.width)
                .filter(|&x| threshold.contains(hsv.get(x, y)))
                .map(|x| Point::new(x as i32, y as i32)),
        );
        if points.len() >= 2 {
            break;
        }
    }

    if points.len() < 2 {
        return None;
    }
    points.sort_by_key(|p| p.x);
    Some(LineSegment::new(points[0], points[points.len() - 1]))
}
