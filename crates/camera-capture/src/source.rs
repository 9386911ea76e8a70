//! Frame sources

use std::collections::VecDeque;
use std::path::PathBuf;

use image::imageops::FilterType;
use tracing::{debug, info};

use crate::{CameraConfig, CameraError, VideoFrame};

const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

/// Anything that can hand the frame loop one frame at a time.
///
/// An `Err` ends the loop; sources never retry on their own.
pub trait FrameSource {
    fn capture(&mut self) -> Result<VideoFrame, CameraError>;
}

/// Replays a directory of recorded frames in file-name order
pub struct ImageDirSource {
    files: Vec<PathBuf>,
    cursor: usize,
    width: u32,
    height: u32,
    looping: bool,
    period_ns: u64,
    sequence: u32,
}

impl ImageDirSource {
    /// Index the configured directory
    pub fn open(config: &CameraConfig) -> Result<Self, CameraError> {
        let entries = std::fs::read_dir(&config.source_dir).map_err(|e| {
            CameraError::Open(format!("{}: {}", config.source_dir.display(), e))
        })?;

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                    .unwrap_or(false)
            })
            .collect();
        files.sort();

        if files.is_empty() {
            return Err(CameraError::Open(format!(
                "no image files in {}",
                config.source_dir.display()
            )));
        }

        info!(
            "Replaying {} frames from {} at {}x{}",
            files.len(),
            config.source_dir.display(),
            config.width,
            config.height
        );

        Ok(Self {
            files,
            cursor: 0,
            width: config.width,
            height: config.height,
            looping: config.looping,
            period_ns: config.frame_period().as_nanos() as u64,
            sequence: 0,
        })
    }

    /// Number of indexed files
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// True when nothing was indexed
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl FrameSource for ImageDirSource {
    fn capture(&mut self) -> Result<VideoFrame, CameraError> {
        if self.cursor >= self.files.len() {
            if !self.looping {
                return Err(CameraError::Exhausted);
            }
            self.cursor = 0;
        }

        let path = self.files[self.cursor].clone();
        self.cursor += 1;

        let decoded = image::open(&path)
            .map_err(|source| CameraError::Decode { path: path.clone(), source })?
            .to_rgb8();

        let rgb = if decoded.dimensions() != (self.width, self.height) {
            debug!(
                "Resizing {} from {:?} to {}x{}",
                path.display(),
                decoded.dimensions(),
                self.width,
                self.height
            );
            image::imageops::resize(&decoded, self.width, self.height, FilterType::Triangle)
        } else {
            decoded
        };

        let sequence = self.sequence;
        self.sequence = self.sequence.wrapping_add(1);
        Ok(VideoFrame::from_rgb_image(
            rgb,
            sequence as u64 * self.period_ns,
            sequence,
        ))
    }
}

/// In-memory FIFO of frames
#[derive(Debug, Default)]
pub struct FrameQueue {
    frames: VecDeque<VideoFrame>,
}

impl FrameQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a frame to the back of the queue
    pub fn push(&mut self, frame: VideoFrame) {
        self.frames.push_back(frame);
    }

    /// Frames still waiting
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl FromIterator<VideoFrame> for FrameQueue {
    fn from_iter<I: IntoIterator<Item = VideoFrame>>(iter: I) -> Self {
        Self {
            frames: iter.into_iter().collect(),
        }
    }
}

impl FrameSource for FrameQueue {
    fn capture(&mut self) -> Result<VideoFrame, CameraError> {
        self.frames.pop_front().ok_or(CameraError::Exhausted)
    }
}
