//! RGB -> HSV conversion in the 8-bit OpenCV convention

use camera_capture::VideoFrame;
use image::{GrayImage, Luma};

use crate::config::ColorThreshold;
use crate::VisionError;

/// Convert one RGB pixel to HSV.
/// Returns (H: 0-180, S: 0-255, V: 0-255).
#[inline]
pub fn rgb_to_hsv(rgb: [u8; 3]) -> [u8; 3] {
    let r = rgb[0] as f32;
    let g = rgb[1] as f32;
    let b = rgb[2] as f32;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let s = if max <= 0.0 { 0.0 } else { delta * 255.0 / max };

    let h = if delta <= 0.0 {
        0.0
    } else if max == r {
        60.0 * (g - b) / delta
    } else if max == g {
        120.0 + 60.0 * (b - r) / delta
    } else {
        240.0 + 60.0 * (r - g) / delta
    };
    let h = if h < 0.0 { h + 360.0 } else { h };

    [
        (h / 2.0).round().min(180.0) as u8,
        s.round() as u8,
        max as u8,
    ]
}

/// A whole frame in HSV, computed once and shared by the color detectors
#[derive(Debug, Clone)]
pub struct HsvFrame {
    pub width: u32,
    pub height: u32,
    data: Vec<[u8; 3]>,
}

impl HsvFrame {
    pub fn from_frame(frame: &VideoFrame) -> Result<Self, VisionError> {
        if !frame.is_well_formed() {
            return Err(VisionError::InvalidFrame(format!(
                "{} bytes for {}x{} RGB",
                frame.data.len(),
                frame.width,
                frame.height
            )));
        }
        let data = frame
            .data
            .chunks_exact(3)
            .map(|p| rgb_to_hsv([p[0], p[1], p[2]]))
            .collect();
        Ok(Self {
            width: frame.width,
            height: frame.height,
            data,
        })
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> [u8; 3] {
        self.data[(y * self.width + x) as usize]
    }

    /// Binary mask (255 = inside the threshold)
    pub fn mask(&self, threshold: &ColorThreshold) -> GrayImage {
        GrayImage::from_fn(self.width, self.height, |x, y| {
            if threshold.contains(self.get(x, y)) {
                Luma([255])
            } else {
                Luma([0])
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_colors() {
        assert_eq!(rgb_to_hsv([255, 0, 0]), [0, 255, 255]);
        assert_eq!(rgb_to_hsv([0, 255, 0]), [60, 255, 255]);
        assert_eq!(rgb_to_hsv([0, 0, 255]), [120, 255, 255]);
        assert_eq!(rgb_to_hsv([255, 255, 0]), [30, 255, 255]);
    }

    #[test]
    fn test_grays_have_no_saturation() {
        assert_eq!(rgb_to_hsv([0, 0, 0]), [0, 0, 0]);
        assert_eq!(rgb_to_hsv([128, 128, 128]), [0, 0, 128]);
    }

    #[test]
    fn test_magenta_red_wraps_high() {
        // Hue 340 degrees -> 170 on the 8-bit scale
        let hsv = rgb_to_hsv([255, 0, 85]);
        assert_eq!(hsv[0], 170);
    }

    #[test]
    fn test_malformed_frame_rejected() {
        let frame = VideoFrame::new(vec![0; 5], 2, 2, 0, 0);
        assert!(matches!(
            HsvFrame::from_frame(&frame),
            Err(VisionError::InvalidFrame(_))
        ));
    }
}
