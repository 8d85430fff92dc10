//! Vision Layer
//!
//! Wraps the external MRZ recognition engine:
//! - `engine`: traits the engine library is reached through
//! - `handle`: per-scanner engine facade with serialized access
//! - `results`: projection of native result sets into line results
//! - `settings`: settings sources for `load_model`

pub mod engine;
pub mod handle;
pub mod results;
pub mod settings;

#[cfg(test)]
pub(crate) mod testing;

pub use engine::{EngineBackend, EngineError, RecognitionEngine};
pub use handle::{EngineHandle, DEFAULT_TEMPLATE};
pub use results::{project, DocumentResult, LineResult, Point, Quadrilateral, ResultSet, TextLine};
pub use settings::SettingsSource;
