//! Recognition engine seam
//!
//! The MRZ recognizer itself is an external engine. These traits are the only
//! surface the rest of the crate sees: one process-wide backend and one
//! engine instance per scanner.

use std::fmt;
use std::path::Path;

use crate::capture::ImageFrame;
use crate::vision::results::ResultSet;

/// Error code and message reported by the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineError {
    pub code: i32,
    pub message: String,
}

impl EngineError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)
    }
}

impl std::error::Error for EngineError {}

/// One recognition engine instance.
///
/// Recognition is split the way the engine exposes it: a recognize call
/// stores results inside the instance, and [`take_results`] hands them out.
///
/// [`take_results`]: RecognitionEngine::take_results
pub trait RecognitionEngine: Send {
    /// Append settings text; the named templates become available for recognition
    fn append_settings(&mut self, settings: &str) -> Result<(), EngineError>;

    /// Run recognition on an image file using the given template
    fn recognize_file(&mut self, path: &Path, template: &str) -> Result<(), EngineError>;

    /// Run recognition on a pixel buffer using the given template
    fn recognize_buffer(&mut self, frame: &ImageFrame<'_>, template: &str)
        -> Result<(), EngineError>;

    /// Take the results of the last recognition call, if any were produced
    fn take_results(&mut self) -> Option<ResultSet>;
}

/// Process-wide entry point of the engine library
pub trait EngineBackend: Send + Sync {
    /// Activate the library. Returns the engine's status message on success.
    fn init_license(&self, key: &str) -> Result<String, EngineError>;

    /// Allocate a new engine instance; `None` means allocation failed
    fn create_engine(&self) -> Option<Box<dyn RecognitionEngine>>;

    /// Engine library version
    fn version(&self) -> String;
}
