//! Error taxonomy for the scanner boundary

use thiserror::Error;

/// Errors rejected synchronously at the scanner boundary.
///
/// Recognition failures are not represented here: they degrade to an empty
/// result list and are only logged.
#[derive(Error, Debug)]
pub enum ScannerError {
    /// Row stride matches none of the supported pixel layouts
    #[error("invalid buffer shape: stride {stride} is not 1x, 3x or 4x width {width}")]
    InvalidBufferShape { width: usize, stride: usize },

    /// Buffer holds fewer bytes than its declared geometry requires
    #[error("buffer too small: expected at least {expected} bytes, got {actual}")]
    BufferTooSmall { expected: usize, actual: usize },

    /// Listener handed over by the host cannot be invoked
    #[error("listener is not callable (got {type_name})")]
    NotCallable { type_name: &'static str },

    /// The backend could not allocate a recognition engine
    #[error("recognition engine unavailable")]
    EngineUnavailable,

    /// Settings could not be applied to the engine
    #[error("settings rejected ({code}): {message}")]
    Settings { code: i32, message: String },

    /// Image file could not be decoded into a frame
    #[error("image decode failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ScannerError {
    /// Numeric status reported to hosts that only understand integer codes
    pub fn code(&self) -> i32 {
        match self {
            ScannerError::InvalidBufferShape { .. } => -1,
            ScannerError::BufferTooSmall { .. } => -2,
            ScannerError::NotCallable { .. } => -3,
            ScannerError::EngineUnavailable => -4,
            ScannerError::Settings { code, .. } => *code,
            ScannerError::Image(_) => -5,
            ScannerError::Io(_) => -6,
        }
    }
}

pub type Result<T> = std::result::Result<T, ScannerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_non_zero() {
        let errors = [
            ScannerError::InvalidBufferShape { width: 100, stride: 150 },
            ScannerError::BufferTooSmall { expected: 10, actual: 5 },
            ScannerError::NotCallable { type_name: "int" },
            ScannerError::EngineUnavailable,
            ScannerError::Io(std::io::Error::other("boom")),
        ];
        for error in &errors {
            assert_ne!(error.code(), 0, "{error}");
        }
    }

    #[test]
    fn test_settings_error_keeps_engine_code() {
        let error = ScannerError::Settings {
            code: -10031,
            message: "template not found".to_string(),
        };
        assert_eq!(error.code(), -10031);
        assert!(error.to_string().contains("template not found"));
    }
}
