//! Parabola corner gate
//!
//! A fixed curve near the bottom-center of the frame. A course line that
//! reaches below it is close enough to count as a corner.

use serde::{Deserialize, Serialize};
use vision::LineSegment;

use crate::config::ParabolaConfig;

/// `y = a (x - h)^2 + k` in image coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Parabola {
    pub h: f64,
    pub k: f64,
    pub a: f64,
}

impl Parabola {
    pub fn new(h: f64, k: f64, a: f64) -> Self {
        Self { h, k, a }
    }

    /// Gate for a frame size: vertex at the horizontal center, at the
    /// configured fraction of the height, both on whole pixels
    pub fn for_frame(width: u32, height: u32, config: &ParabolaConfig) -> Self {
        Self {
            h: (width / 2) as f64,
            k: (height as f64 * config.vertex_y_ratio).floor(),
            a: config.curvature,
        }
    }

    #[inline]
    pub fn y_at(&self, x: f64) -> f64 {
        self.a * (x - self.h).powi(2) + self.k
    }

    /// True when `(x, y)` lies below the curve by more than `tolerance`
    #[inline]
    pub fn contains(&self, x: f64, y: f64, tolerance: f64) -> bool {
        y > self.y_at(x) + tolerance
    }
}

/// Samples a segment as a thick band and tests each sample against the gate
#[derive(Debug, Clone)]
pub struct ParabolaGate {
    pub parabola: Parabola,
    tolerance: f64,
    samples: u32,
    offsets: Vec<f64>,
}

impl ParabolaGate {
    pub fn new(parabola: Parabola, config: &ParabolaConfig) -> Self {
        // Evenly spaced across the band, one per pixel of thickness plus the far edge
        let steps = config.thickness_px.max(0.0) as usize;
        let half = config.thickness_px / 2.0;
        let offsets = if steps == 0 {
            vec![0.0]
        } else {
            (0..=steps)
                .map(|i| -half + config.thickness_px * i as f64 / steps as f64)
                .collect()
        };
        Self {
            parabola,
            tolerance: config.tolerance_px,
            samples: config.samples.max(1),
            offsets,
        }
    }

    pub fn for_frame(width: u32, height: u32, config: &ParabolaConfig) -> Self {
        Self::new(Parabola::for_frame(width, height, config), config)
    }

    /// Whether any sample of the thick segment lies inside the gate
    pub fn segment_inside(&self, segment: &LineSegment) -> bool {
        let (x1, y1) = (segment.start.x as f64, segment.start.y as f64);
        let (x2, y2) = (segment.end.x as f64, segment.end.y as f64);
        let (dx, dy) = (x2 - x1, y2 - y1);
        let length = dx.hypot(dy);

        if length == 0.0 {
            return self.parabola.contains(x1, y1, self.tolerance);
        }

        let (perp_x, perp_y) = (-dy / length, dx / length);
        for i in 0..=self.samples {
            let t = i as f64 / self.samples as f64;
            let x = x1 * (1.0 - t) + x2 * t;
            let y = y1 * (1.0 - t) + y2 * t;
            for offset in &self.offsets {
                if self
                    .parabola
                    .contains(x + perp_x * offset, y + perp_y * offset, self.tolerance)
                {
                    return true;
                }
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vision::Point;

    fn gate() -> ParabolaGate {
        ParabolaGate::for_frame(640, 480, &ParabolaConfig::default())
    }

    #[test]
    fn test_default_geometry() {
        let p = Parabola::for_frame(640, 480, &ParabolaConfig::default());
        assert_eq!(p.h, 320.0);
        assert_eq!(p.k, 264.0);
        assert_eq!(p.a, 0.0011);
        assert_eq!(p.y_at(320.0), 264.0);
        // 0.0011 * 100^2 = 11
        assert!((p.y_at(420.0) - 275.0).abs() < 1e-9);
    }

    #[test]
    fn test_offsets_span_band() {
        let g = gate();
        assert_eq!(g.offsets.len(), 9);
        assert_eq!(g.offsets[0], -4.0);
        assert_eq!(g.offsets[4], 0.0);
        assert_eq!(g.offsets[8], 4.0);
    }

    #[test]
    fn test_tolerance_is_strict() {
        let p = Parabola::new(320.0, 264.0, 0.0011);
        assert!(!p.contains(320.0, 266.0, 2.0));
        assert!(p.contains(320.0, 266.5, 2.0));
    }

    #[test]
    fn test_segment_below_vertex_is_inside() {
        let seg = LineSegment::new(Point::new(280, 470), Point::new(360, 470));
        assert!(gate().segment_inside(&seg));
    }

    #[test]
    fn test_segment_in_far_corner_is_outside() {
        // At x = 0 the curve sits at 0.0011 * 320^2 + 264 = 376.6
        let seg = LineSegment::new(Point::new(0, 360), Point::new(20, 360));
        assert!(!gate().segment_inside(&seg));
    }

    #[test]
    fn test_thickness_reaches_across_curve() {
        // Centerline sits on the vertex; the lower edge of the band clears it
        let seg = LineSegment::new(Point::new(300, 264), Point::new(340, 264));
        let p = gate().parabola;
        assert!(!p.contains(320.0, 264.0, 2.0));
        assert!(gate().segment_inside(&seg));
    }

    #[test]
    fn test_zero_length_segment_tests_single_point() {
        let inside = LineSegment::new(Point::new(320, 300), Point::new(320, 300));
        let outside = LineSegment::new(Point::new(320, 250), Point::new(320, 250));
        assert!(gate().segment_inside(&inside));
        assert!(!gate().segment_inside(&outside));
    }
}
