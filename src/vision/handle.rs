//! Recognition Engine Facade
//!
//! Owns the single engine instance of a scanner. Every call goes through one
//! mutex, so the synchronous path and the background worker serialize on it.

use parking_lot::Mutex;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::capture::ImageFrame;
use crate::error::{Result, ScannerError};
use crate::vision::engine::{EngineError, RecognitionEngine};
use crate::vision::results::{project, LineResult};
use crate::vision::settings::SettingsSource;

/// Default recognition template applied on every decode
pub const DEFAULT_TEMPLATE: &str = "locr";

/// Shared handle to one engine instance
pub struct EngineHandle {
    engine: Mutex<Option<Box<dyn RecognitionEngine>>>,
    template: String,
}

impl EngineHandle {
    /// Take ownership of a freshly created engine
    pub fn new(engine: Box<dyn RecognitionEngine>, template: impl Into<String>) -> Self {
        Self {
            engine: Mutex::new(Some(engine)),
            template: template.into(),
        }
    }

    /// Template name used for recognition
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Whether the engine has not been destroyed yet
    pub fn is_live(&self) -> bool {
        self.engine.lock().is_some()
    }

    /// Append settings from a file or inline text
    pub fn load_settings(&self, source: &SettingsSource) -> Result<()> {
        let text = source.read()?;

        let mut guard = self.engine.lock();
        let Some(engine) = guard.as_mut() else {
            return Err(destroyed_settings_error());
        };

        match engine.append_settings(&text) {
            Ok(()) => {
                info!("Load MRZ model: {}", describe(source));
                Ok(())
            }
            Err(EngineError { code, message }) => {
                warn!("Load MRZ model failed ({}): {}", code, message);
                Err(ScannerError::Settings { code, message })
            }
        }
    }

    /// Recognize a pixel buffer. Engine errors degrade to an empty list.
    pub fn decode(&self, frame: &ImageFrame<'_>) -> Vec<LineResult> {
        self.run(|engine, template| engine.recognize_buffer(frame, template))
    }

    /// Recognize an image file. Engine errors degrade to an empty list.
    pub fn decode_file(&self, path: &Path) -> Vec<LineResult> {
        self.run(|engine, template| engine.recognize_file(path, template))
    }

    fn run<F>(&self, recognize: F) -> Vec<LineResult>
    where
        F: FnOnce(&mut dyn RecognitionEngine, &str) -> std::result::Result<(), EngineError>,
    {
        let start = Instant::now();
        let mut guard = self.engine.lock();
        let Some(engine) = guard.as_mut() else {
            warn!("Decode requested after the engine was destroyed");
            return Vec::new();
        };

        if let Err(e) = recognize(&mut **engine, &self.template) {
            warn!("Detection error: {}", e);
        }

        let results = engine.take_results();
        if results.is_none() {
            debug!("No MRZ info detected");
        }
        let lines = project(results);
        debug!("Decode complete in {:?}: {} line(s)", start.elapsed(), lines.len());
        lines
    }

    /// Release the engine. Returns `false` if it was already released.
    pub fn destroy(&self) -> bool {
        let engine = self.engine.lock().take();
        match engine {
            Some(engine) => {
                drop(engine);
                debug!("Engine instance destroyed");
                true
            }
            None => false,
        }
    }
}

fn destroyed_settings_error() -> ScannerError {
    ScannerError::Settings {
        code: ScannerError::EngineUnavailable.code(),
        message: "engine instance has been destroyed".to_string(),
    }
}

fn describe(source: &SettingsSource) -> String {
    match source.path() {
        Some(path) => format!("{:?}", path),
        None => "inline settings".to_string(),
    }
}
