//! Image Buffer Adapter
//!
//! Normalizes whatever the caller hands over (an image file, a strided host
//! buffer, or raw bytes with declared geometry) into an [`ImageFrame`].

pub mod frame;

pub use frame::{ImageFrame, PixelFormat};

use std::path::Path;
use tracing::debug;

use crate::error::{Result, ScannerError};

/// A strided buffer exported by the host, e.g. a 2-D or 3-D `uint8` array.
///
/// Only the first two strides matter: `strides[0]` is the row stride in bytes
/// and `strides[1]` the pixel stride, so `width = strides[0] / strides[1]` and
/// `height = len / strides[0]`.
#[derive(Debug, Clone)]
pub struct HostBuffer<'a> {
    data: &'a [u8],
    strides: Vec<usize>,
}

impl<'a> HostBuffer<'a> {
    /// Wrap exported bytes and their per-dimension strides
    pub fn new(data: &'a [u8], strides: Vec<usize>) -> Self {
        Self { data, strides }
    }

    /// Describe a tightly packed `height x width x channels` array
    pub fn packed(data: &'a [u8], width: usize, channels: usize) -> Self {
        let strides = if channels == 1 {
            vec![width, 1]
        } else {
            vec![width * channels, channels, 1]
        };
        Self::new(data, strides)
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// View the buffer as a frame, inferring width, height and pixel format
    pub fn frame(&self) -> Result<ImageFrame<'a>> {
        let (stride, pixel_stride) = match self.strides.as_slice() {
            [row, pixel, ..] if *row > 0 && *pixel > 0 => (*row, *pixel),
            _ => {
                return Err(ScannerError::InvalidBufferShape {
                    width: 0,
                    stride: self.strides.first().copied().unwrap_or(0),
                })
            }
        };
        let width = stride / pixel_stride;
        let height = self.data.len() / stride;
        ImageFrame::wrap(self.data, width, height, stride)
    }
}

/// Decode an image file into an owned RGB888 frame
pub fn load_image(path: impl AsRef<Path>) -> Result<ImageFrame<'static>> {
    let path = path.as_ref();
    let rgb = image::open(path)?.to_rgb8();
    let (width, height) = (rgb.width() as usize, rgb.height() as usize);
    debug!("Loaded {:?} as {}x{} rgb888", path, width, height);

    if width == 0 {
        return Err(ScannerError::InvalidBufferShape { width, stride: 0 });
    }
    ImageFrame::from_owned(rgb.into_raw(), width, height, width * 3, PixelFormat::Rgb888)
}
