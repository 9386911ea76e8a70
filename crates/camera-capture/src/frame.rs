//! Video frame types and processing

use image::{GrayImage, RgbImage};

/// Decoded RGB video frame
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// RGB pixel data (width * height * 3)
    pub data: Vec<u8>,
    /// Frame width
    pub width: u32,
    /// Frame height
    pub height: u32,
    /// Capture timestamp (nanoseconds)
    pub timestamp_ns: u64,
    /// Frame sequence number
    pub sequence: u32,
}

impl VideoFrame {
    /// Create a new video frame from raw RGB data
    pub fn new(data: Vec<u8>, width: u32, height: u32, timestamp_ns: u64, sequence: u32) -> Self {
        Self {
            data,
            width,
            height,
            timestamp_ns,
            sequence,
        }
    }

    /// Wrap a decoded RGB image
    pub fn from_rgb_image(image: RgbImage, timestamp_ns: u64, sequence: u32) -> Self {
        let (width, height) = image.dimensions();
        Self::new(image.into_raw(), width, height, timestamp_ns, sequence)
    }

    /// Frame filled with a single color
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let data = rgb
            .iter()
            .copied()
            .cycle()
            .take((width * height * 3) as usize)
            .collect();
        Self::new(data, width, height, 0, 0)
    }

    /// True when the pixel buffer matches the declared dimensions
    pub fn is_well_formed(&self) -> bool {
        self.data.len() == (self.width as usize) * (self.height as usize) * 3
    }

    /// Get pixel at (x, y)
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = ((y * self.width + x) * 3) as usize;
        self.data
            .get(idx..idx + 3)
            .map(|p| [p[0], p[1], p[2]])
    }

    /// Overwrite the pixel at (x, y); out-of-bounds writes are ignored
    pub fn set_pixel(&mut self, x: u32, y: u32, rgb: [u8; 3]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = ((y * self.width + x) * 3) as usize;
        if let Some(p) = self.data.get_mut(idx..idx + 3) {
            p.copy_from_slice(&rgb);
        }
    }

    /// Fill an axis-aligned rectangle, clipped to the frame
    pub fn fill_rect(&mut self, x: u32, y: u32, w: u32, h: u32, rgb: [u8; 3]) {
        let x_end = x.saturating_add(w).min(self.width);
        let y_end = y.saturating_add(h).min(self.height);
        for row in y..y_end {
            for col in x..x_end {
                self.set_pixel(col, row, rgb);
            }
        }
    }

    /// Convert to grayscale
    pub fn to_grayscale(&self) -> Vec<u8> {
        let mut gray = Vec::with_capacity((self.width * self.height) as usize);
        for pixel in self.data.chunks_exact(3) {
            // Luminance formula: 0.299*R + 0.587*G + 0.114*B
            let y = (pixel[0] as f32 * 0.299
                   + pixel[1] as f32 * 0.587
                   + pixel[2] as f32 * 0.114).round() as u8;
            gray.push(y);
        }
        gray
    }

    /// Grayscale view as an `image` buffer
    pub fn to_gray_image(&self) -> Option<GrayImage> {
        GrayImage::from_raw(self.width, self.height, self.to_grayscale())
    }

    /// Borrow-free copy as an `image` RGB buffer
    pub fn to_rgb_image(&self) -> Option<RgbImage> {
        RgbImage::from_raw(self.width, self.height, self.data.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filled_frame_dimensions() {
        let frame = VideoFrame::filled(4, 3, [1, 2, 3]);
        assert!(frame.is_well_formed());
        assert_eq!(frame.get_pixel(3, 2), Some([1, 2, 3]));
        assert_eq!(frame.get_pixel(4, 0), None);
    }

    #[test]
    fn test_grayscale_weights() {
        let frame = VideoFrame::new(vec![255, 0, 0, 0, 255, 0, 0, 0, 255], 3, 1, 0, 0);
        assert_eq!(frame.to_grayscale(), vec![76, 150, 29]);
    }

    #[test]
    fn test_fill_rect_clips() {
        let mut frame = VideoFrame::filled(5, 5, [0, 0, 0]);
        frame.fill_rect(3, 3, 10, 10, [9, 9, 9]);
        assert_eq!(frame.get_pixel(4, 4), Some([9, 9, 9]));
        assert_eq!(frame.get_pixel(2, 2), Some([0, 0, 0]));
    }

    #[test]
    fn test_malformed_buffer_detected() {
        let frame = VideoFrame::new(vec![0; 10], 2, 2, 0, 0);
        assert!(!frame.is_well_formed());
        assert!(frame.to_rgb_image().is_none());
    }
}
