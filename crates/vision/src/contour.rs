//! Contour extraction helpers on binary masks

use image::{imageops, GrayImage};
use imageproc::contours::{find_contours, BorderType};
use imageproc::geometry::contour_area;
use serde::{Deserialize, Serialize};

/// Pixel coordinate (x right, y down)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned box with inclusive pixel extents folded into width/height
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    /// Center with integer division, matching pixel-grid conventions
    pub fn center(&self) -> Point {
        Point::new(
            self.x + (self.width / 2) as i32,
            self.y + (self.height / 2) as i32,
        )
    }
}

/// Outer borders of top-level foreground regions, in discovery order.
/// Holes and regions nested inside holes are skipped.
///
/// The mask is traced inside a one-pixel background frame so regions
/// touching the image border keep their outer border.
pub fn external_contours(mask: &GrayImage) -> Vec<Vec<Point>> {
    let mut padded = GrayImage::new(mask.width() + 2, mask.height() + 2);
    imageops::replace(&mut padded, mask, 1, 1);

    find_contours::<i32>(&padded)
        .into_iter()
        .filter(|c| matches!(c.border_type, BorderType::Outer) && c.parent.is_none())
        .map(|c| c.points.into_iter().map(|p| Point::new(p.x - 1, p.y - 1)).collect())
        .collect()
}

/// Keep only the points where a closed border chain changes direction.
/// Straight horizontal, vertical and diagonal runs shrink to their endpoints.
pub fn compress_runs(points: &[Point]) -> Vec<Point> {
    let n = points.len();
    if n < 3 {
        return points.to_vec();
    }
    let step = |a: Point, b: Point| (b.x - a.x, b.y - a.y);

    let corners: Vec<Point> = (0..n)
        .filter(|&i| {
            let prev = points[(i + n - 1) % n];
            let next = points[(i + 1) % n];
            step(prev, points[i]) != step(points[i], next)
        })
        .map(|i| points[i])
        .collect();

    if corners.is_empty() {
        points[..1].to_vec()
    } else {
        corners
    }
}

/// Enclosed polygon area
pub fn polygon_area(points: &[Point]) -> f64 {
    let outline: Vec<imageproc::point::Point<i32>> = points
        .iter()
        .map(|p| imageproc::point::Point::new(p.x, p.y))
        .collect();
    contour_area(&outline)
}

/// Bounding box of a non-empty point set
pub fn bounding_box(points: &[Point]) -> Option<BoundingBox> {
    let first = points.first()?;
    let (mut min_x, mut max_x, mut min_y, mut max_y) = (first.x, first.x, first.y, first.y);
    for p in &points[1..] {
        min_x = min_x.min(p.x);
        max_x = max_x.max(p.x);
        min_y = min_y.min(p.y);
        max_y = max_y.max(p.y);
    }
    Some(BoundingBox {
        x: min_x,
        y: min_y,
        width: (max_x - min_x + 1) as u32,
        height: (max_y - min_y + 1) as u32,
    })
}
