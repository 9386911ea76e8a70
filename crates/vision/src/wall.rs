//! Wall proximity and angle estimation
//!
//! The wall is the largest dark region in the frame. Its border is reduced
//! to the corners of straight runs, and the topmost corner of each column
//! forms the upper envelope. The mean envelope height stands in for
//! distance and a least-squares fit gives its slope.

use std::collections::BTreeMap;

use camera_capture::VideoFrame;
use image::GrayImage;
use imageproc::contrast::{threshold, ThresholdType};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analysis::SteerHint;
use crate::contour::{compress_runs, external_contours, polygon_area, Point};
use crate::{VisionConfig, VisionError};

/// Wall estimate for one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WallEstimate {
    /// Mean envelope y (pixels); smaller means the wall fills more of the view
    pub vertical_position: Option<i32>,

    /// Slope of the fitted envelope line (degrees, image axes)
    pub angle_degrees: Option<f64>,

    /// Left/right heuristic from the envelope endpoints. Not used by the
    /// control policy.
    pub steer_hint: SteerHint,
    pub hint_reason: Option<String>,

    pub left_point: Option<Point>,
    pub right_point: Option<Point>,
}

impl Default for WallEstimate {
    fn default() -> Self {
        Self::none()
    }
}

impl WallEstimate {
    /// No wall in view
    pub fn none() -> Self {
        Self {
            vertical_position: None,
            angle_degrees: None,
            steer_hint: SteerHint::Straight,
            hint_reason: None,
            left_point: None,
            right_point: None,
        }
    }

    /// Estimate with only position and angle set, for feeding the policy directly
    pub fn at(vertical_position: i32, angle_degrees: f64) -> Self {
        Self {
            vertical_position: Some(vertical_position),
            angle_degrees: Some(angle_degrees),
            ..Self::none()
        }
    }

    pub fn is_detected(&self) -> bool {
        self.vertical_position.is_some()
    }
}

/// Dark-region wall detector
pub struct WallDetector {
    dark_threshold: u8,
}

impl WallDetector {
    pub fn new(config: &VisionConfig) -> Result<Self, VisionError> {
        Ok(Self {
            dark_threshold: config.wall.dark_threshold,
        })
    }

    /// Estimate wall position and angle
    pub fn detect(&self, frame: &VideoFrame) -> Result<WallEstimate, VisionError> {
        let gray = frame.to_gray_image().ok_or_else(|| {
            VisionError::InvalidFrame(format!(
                "{} bytes for {}x{} RGB",
                frame.data.len(),
                frame.width,
                frame.height
            ))
        })?;
        Ok(self.detect_gray(&gray))
    }

    /// Estimate on an already converted grayscale frame
    pub fn detect_gray(&self, gray: &GrayImage) -> WallEstimate {
        let mask = threshold(gray, self.dark_threshold, ThresholdType::BinaryInverted);

        // Largest area wins; on ties the first contour found is kept
        let mut largest: Option<(f64, Vec<Point>)> = None;
        for contour in external_contours(&mask) {
            let area = polygon_area(&contour);
            if largest.as_ref().map_or(true, |(best, _)| area > *best) {
                largest = Some((area, contour));
            }
        }
        let Some((_, contour)) = largest else {
            debug!("No wall contour");
            return WallEstimate::none();
        };

        let mut envelope: BTreeMap<i32, i32> = BTreeMap::new();
        for p in compress_runs(&contour) {
            envelope
                .entry(p.x)
                .and_modify(|y| *y = (*y).min(p.y))
                .or_insert(p.y);
        }
        if envelope.len() < 2 {
            debug!("Wall contour spans a single column");
            return WallEstimate::none();
        }

        let edge: Vec<Point> = envelope.into_iter().map(|(x, y)| Point::new(x, y)).collect();
        let left = edge[0];
        let right = edge[edge.len() - 1];

        let (steer_hint, hint_reason) = if left.y < right.y {
            (SteerHint::Right, "left_pt lower than right_pt")
        } else if right.y < left.y {
            (SteerHint::Left, "right_pt lower than left_pt")
        } else {
            (SteerHint::Straight, "edge y equal")
        };

        let (vx, vy) = fit_line(&edge);
        let angle = vy.atan2(vx).to_degrees();
        let sum_y: i64 = edge.iter().map(|p| p.y as i64).sum();
        let wall_y = (sum_y / edge.len() as i64) as i32;

        debug!(
            "Wall: y={} angle={:.2} hint={:?} ({} envelope points)",
            wall_y,
            angle,
            steer_hint,
            edge.len()
        );

        WallEstimate {
            vertical_position: Some(wall_y),
            angle_degrees: Some(angle),
            steer_hint,
            hint_reason: Some(hint_reason.to_string()),
            left_point: Some(left),
            right_point: Some(right),
        }
    }
}

/// Orthogonal least-squares line direction through `points`.
///
/// Returns the unit direction `(cos t, sin t)` with
/// `t = atan2(2 cov_xy, var_x - var_y) / 2`, so `t` lies in `[-90, 90]`
/// degrees and `vx` is never negative.
pub fn fit_line(points: &[Point]) -> (f64, f64) {
    let n = points.len() as f64;
    if points.is_empty() {
        return (1.0, 0.0);
    }

    let (mut sx, mut sy, mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0, 0.0, 0.0);
    for p in points {
        let (x, y) = (p.x as f64, p.y as f64);
        sx += x;
        sy += y;
        sxx += x * x;
        syy += y * y;
        sxy += x * y;
    }
    let (mx, my) = (sx / n, sy / n);
    let var_x = sxx / n - mx * mx;
    let var_y = syy / n - my * my;
    let cov_xy = sxy / n - mx * my;

    let t = (2.0 * cov_xy).atan2(var_x - var_y) / 2.0;
    (t.cos(), t.sin())
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: [u8; 3] = [230, 230, 230];
    const BLACK: [u8; 3] = [10, 10, 10];

    fn detector() -> WallDetector {
        WallDetector::new(&VisionConfig::default()).unwrap()
    }

    #[test]
    fn test_no_dark_region_means_no_wall() {
        let frame = VideoFrame::filled(120, 90, WHITE);
        let wall = detector().detect(&frame).unwrap();
        assert_eq!(wall, WallEstimate::none());
        assert_eq!(wall.steer_hint, SteerHint::Straight);
    }

    #[test]
    fn test_flat_wall() {
        let mut frame = VideoFrame::filled(120, 90, WHITE);
        frame.fill_rect(0, 0, 120, 30, BLACK);

        let wall = detector().detect(&frame).unwrap();
        // Top edge of a band touching the top border sits at y = 0
        assert_eq!(wall.vertical_position, Some(0));
        assert!(wall.angle_degrees.unwrap().abs() < 1e-6);
        assert_eq!(wall.steer_hint, SteerHint::Straight);
    }

    #[test]
    fn test_rising_wall_has_negative_angle() {
        let mut frame = VideoFrame::filled(200, 150, WHITE);
        // Dark below y = 100 - x/5: the near edge climbs toward the right
        for x in 0..200u32 {
            let top = 100 - x / 5;
            frame.fill_rect(x, top, 1, 150 - top, BLACK);
        }

        let wall = detector().detect(&frame).unwrap();
        let angle = wall.angle_degrees.unwrap();
        let expected = (-0.2f64).atan().to_degrees();
        assert!((angle - expected).abs() < 1.0, "angle {angle}");
        assert_eq!(wall.left_point, Some(Point::new(0, 100)));
        assert_eq!(wall.right_point, Some(Point::new(199, 61)));
        assert_eq!(wall.steer_hint, SteerHint::Left);

        let y = wall.vertical_position.unwrap();
        assert!((79..=81).contains(&y), "wall_y {y}");
    }

    #[test]
    fn test_largest_region_wins() {
        let mut frame = VideoFrame::filled(200, 150, WHITE);
        frame.fill_rect(10, 10, 20, 20, BLACK);
        frame.fill_rect(0, 100, 200, 50, BLACK);

        let wall = detector().detect(&frame).unwrap();
        assert_eq!(wall.vertical_position, Some(100));
    }

    #[test]
    fn test_full_width_wall_on_left_border() {
        let mut frame = VideoFrame::filled(640, 480, WHITE);
        frame.fill_rect(0, 300, 640, 100, BLACK);
        let wall = detector().detect(&frame).unwrap();
        assert_eq!(wall.vertical_position, Some(300));
        assert_eq!(wall.left_point, Some(Point::new(0, 300)));
        assert_eq!(wall.right_point, Some(Point::new(639, 300)));

        let mut frame = VideoFrame::filled(640, 480, WHITE);
        frame.fill_rect(0, 300, 300, 100, BLACK);
        let wall = detector().detect(&frame).unwrap();
        assert_eq!(wall.vertical_position, Some(300));
        assert_eq!(wall.left_point, Some(Point::new(0, 300)));
    }

    #[test]
    fn test_step_wall_weights_corners_not_run_length() {
        let mut frame = VideoFrame::filled(640, 480, WHITE);
        // Narrow pillar up to y = 100, the rest of the wall up to y = 250
        frame.fill_rect(0, 100, 100, 380, BLACK);
        frame.fill_rect(100, 250, 540, 230, BLACK);

        let wall = detector().detect(&frame).unwrap();
        // Envelope corners: (0,100) (99,100) (100,250) (639,250)
        assert_eq!(wall.vertical_position, Some(175));
        assert!(wall.vertical_position.unwrap() < 192);
        assert_eq!(wall.steer_hint, SteerHint::Right);
    }

    #[test]
    fn test_single_column_is_unknown() {
        let mut frame = VideoFrame::filled(50, 50, WHITE);
        frame.fill_rect(20, 5, 1, 40, BLACK);
        assert!(!detector().detect(&frame).unwrap().is_detected());
    }

    #[test]
    fn test_fit_line_axis_aligned() {
        let horizontal: Vec<Point> = (0..10).map(|x| Point::new(x, 5)).collect();
        let (vx, vy) = fit_line(&horizontal);
        assert!((vx - 1.0).abs() < 1e-12 && vy.abs() < 1e-12);

        let diagonal: Vec<Point> = (0..10).map(|x| Point::new(x, x)).collect();
        let (vx, vy) = fit_line(&diagonal);
        assert!((vy.atan2(vx).to_degrees() - 45.0).abs() < 1e-9);
    }
}
