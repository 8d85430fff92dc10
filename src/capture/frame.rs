//! Frame data structures handed to the recognition engine

use std::borrow::Cow;
use std::fmt;

use crate::error::{Result, ScannerError};

/// Pixel layout of a frame buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// One byte per pixel
    Grayscale,
    /// Three bytes per pixel
    Rgb888,
    /// Four bytes per pixel
    Argb8888,
}

impl PixelFormat {
    /// Bytes used by a single pixel
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Grayscale => 1,
            PixelFormat::Rgb888 => 3,
            PixelFormat::Argb8888 => 4,
        }
    }

    /// Infer the layout from the row stride, which must be exactly 1x, 3x or 4x the width
    pub fn infer(width: usize, stride: usize) -> Option<Self> {
        if width == 0 {
            return None;
        }
        [PixelFormat::Grayscale, PixelFormat::Rgb888, PixelFormat::Argb8888]
            .into_iter()
            .find(|format| width.checked_mul(format.bytes_per_pixel()) == Some(stride))
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PixelFormat::Grayscale => "grayscale",
            PixelFormat::Rgb888 => "rgb888",
            PixelFormat::Argb8888 => "argb8888",
        };
        f.write_str(name)
    }
}

/// Pixel buffer plus the geometry the engine needs to read it.
///
/// The synchronous path borrows the caller's bytes; the asynchronous path
/// calls [`ImageFrame::into_owned`] so the queued task owns its copy.
#[derive(Debug, Clone)]
pub struct ImageFrame<'a> {
    bytes: Cow<'a, [u8]>,
    width: usize,
    height: usize,
    stride: usize,
    format: PixelFormat,
}

impl<'a> ImageFrame<'a> {
    /// Wrap a raw buffer, deriving the pixel format from the stride/width relationship
    pub fn wrap(bytes: &'a [u8], width: usize, height: usize, stride: usize) -> Result<Self> {
        let format = PixelFormat::infer(width, stride)
            .ok_or(ScannerError::InvalidBufferShape { width, stride })?;
        Self::checked(Cow::Borrowed(bytes), width, height, stride, format)
    }

    /// Wrap a raw buffer whose pixel format is declared by the caller.
    ///
    /// Rows may carry padding, so the stride only has to cover `width` pixels.
    pub fn with_format(
        bytes: &'a [u8],
        width: usize,
        height: usize,
        stride: usize,
        format: PixelFormat,
    ) -> Result<Self> {
        if !covers_row(width, stride, format) {
            return Err(ScannerError::InvalidBufferShape { width, stride });
        }
        Self::checked(Cow::Borrowed(bytes), width, height, stride, format)
    }

    fn checked(
        bytes: Cow<'a, [u8]>,
        width: usize,
        height: usize,
        stride: usize,
        format: PixelFormat,
    ) -> Result<Self> {
        let expected = stride
            .checked_mul(height)
            .ok_or(ScannerError::BufferTooSmall {
                expected: usize::MAX,
                actual: bytes.len(),
            })?;
        if bytes.len() < expected {
            return Err(ScannerError::BufferTooSmall {
                expected,
                actual: bytes.len(),
            });
        }
        Ok(Self {
            bytes,
            width,
            height,
            stride,
            format,
        })
    }

    /// Deep-copy the pixels so the frame outlives the caller's buffer
    pub fn into_owned(self) -> ImageFrame<'static> {
        ImageFrame {
            bytes: Cow::Owned(self.bytes.into_owned()),
            width: self.width,
            height: self.height,
            stride: self.stride,
            format: self.format,
        }
    }

    /// Whether the pixels are owned by this frame
    pub fn is_owned(&self) -> bool {
        matches!(self.bytes, Cow::Owned(_))
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Get frame dimensions as (width, height)
    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Bytes of one row, without padding
    pub fn row(&self, y: usize) -> &[u8] {
        let start = y * self.stride;
        &self.bytes[start..start + self.width * self.format.bytes_per_pixel()]
    }
}

impl ImageFrame<'static> {
    /// Build an owned frame from pixels already laid out for `format`
    pub fn from_owned(
        bytes: Vec<u8>,
        width: usize,
        height: usize,
        stride: usize,
        format: PixelFormat,
    ) -> Result<Self> {
        if !covers_row(width, stride, format) {
            return Err(ScannerError::InvalidBufferShape { width, stride });
        }
        Self::checked(Cow::Owned(bytes), width, height, stride, format)
    }
}

/// Stride holds at least `width` pixels of `format`
fn covers_row(width: usize, stride: usize, format: PixelFormat) -> bool {
    width > 0
        && width
            .checked_mul(format.bytes_per_pixel())
            .is_some_and(|row| row <= stride)
}
