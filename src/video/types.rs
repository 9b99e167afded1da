use std::fmt;

use image::{ImageBuffer, Rgb, RgbImage};
use serde::{Deserialize, Serialize};

/// Represents a single video frame
///
/// A thin wrapper around an RGB image buffer with the pixel helpers the
/// grading and caption stages need.
#[derive(Clone, Debug)]
pub struct Frame {
    buffer: RgbImage,
}

impl Frame {
    /// Create a new frame from an RGB image buffer
    pub fn new(buffer: RgbImage) -> Self {
        Self { buffer }
    }

    /// Create a new frame with the given dimensions filled with black
    pub fn new_black(width: u32, height: u32) -> Self {
        Self { buffer: ImageBuffer::new(width, height) }
    }

    /// Create a new frame with the given dimensions filled with the specified color
    pub fn new_filled(width: u32, height: u32, color: [u8; 3]) -> Self {
        let buffer = ImageBuffer::from_fn(width, height, |_, _| Rgb(color));
        Self { buffer }
    }

    /// Create a frame from raw interleaved RGB bytes
    pub fn from_rgb_bytes(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        ImageBuffer::from_raw(width, height, data).map(|buffer| Self { buffer })
    }

    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    pub fn geometry(&self) -> FrameGeometry {
        FrameGeometry::new(self.width(), self.height())
    }

    /// Get a pixel at the given coordinates (returns RGB array)
    pub fn get_pixel(&self, x: u32, y: u32) -> [u8; 3] {
        self.buffer.get_pixel(x, y).0
    }

    /// Set a pixel at the given coordinates
    pub fn set_pixel(&mut self, x: u32, y: u32, color: [u8; 3]) {
        self.buffer.put_pixel(x, y, Rgb(color));
    }

    pub fn into_image(self) -> RgbImage {
        self.buffer
    }

    /// Interleaved RGB bytes, row major
    pub fn as_bytes(&self) -> &[u8] {
        self.buffer.as_raw()
    }

    /// Mutable interleaved RGB bytes, row major
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.buffer
    }
}

/// Pixel dimensions of a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameGeometry {
    pub width: u32,
    pub height: u32,
}

impl FrameGeometry {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Size of one rgb24 frame in bytes
    pub fn rgb_len(&self) -> usize {
        self.width as usize * self.height as usize * 3
    }
}

impl fmt::Display for FrameGeometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}
