//! Deterministic stand-in for the external recognition engine
//!
//! "Recognizes" one text line covering the bounding box of all dark pixels
//! (luma < 128). A frame without dark pixels yields zero documents.

use parking_lot::{Condvar, Mutex};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::capture::{ImageFrame, PixelFormat};
use crate::vision::engine::{EngineBackend, EngineError, RecognitionEngine};
use crate::vision::results::{DocumentResult, Point, Quadrilateral, ResultSet, TextLine};

pub const FAKE_SETTINGS: &str = r#"{"LabelRecognizerParameterArray": [{"Name": "locr"}]}"#;
pub const FAKE_LICENSE: &str = "VALID-LICENSE-KEY";

/// Observation and control points shared between a test and its fake engines
#[derive(Default)]
pub struct FakeProbe {
    recognitions: AtomicUsize,
    fail: AtomicBool,
    dropped: AtomicBool,
    gate: Mutex<Gate>,
    gate_changed: Condvar,
}

#[derive(Default)]
struct Gate {
    hold: bool,
    blocked: bool,
}

impl FakeProbe {
    pub fn recognitions(&self) -> usize {
        self.recognitions.load(Ordering::SeqCst)
    }

    pub fn fail_recognition(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn engine_dropped(&self) -> bool {
        self.dropped.load(Ordering::SeqCst)
    }

    /// Make the next recognition block until [`FakeProbe::release`]
    pub fn hold(&self) {
        self.gate.lock().hold = true;
    }

    pub fn release(&self) {
        let mut gate = self.gate.lock();
        gate.hold = false;
        self.gate_changed.notify_all();
    }

    /// Wait until a recognition call is parked on the gate
    pub fn wait_until_blocked(&self, timeout: Duration) -> bool {
        let mut gate = self.gate.lock();
        while !gate.blocked {
            if self.gate_changed.wait_for(&mut gate, timeout).timed_out() {
                return gate.blocked;
            }
        }
        true
    }

    fn pass_gate(&self) {
        let mut gate = self.gate.lock();
        if !gate.hold {
            return;
        }
        gate.blocked = true;
        self.gate_changed.notify_all();
        while gate.hold {
            self.gate_changed.wait(&mut gate);
        }
        gate.blocked = false;
    }
}

pub struct FakeEngine {
    probe: Arc<FakeProbe>,
    pending: Option<ResultSet>,
}

impl FakeEngine {
    pub fn new(probe: Arc<FakeProbe>) -> Self {
        Self {
            probe,
            pending: None,
        }
    }

    fn recognize(&mut self, frame: &ImageFrame<'_>) -> Result<(), EngineError> {
        self.probe.pass_gate();
        self.probe.recognitions.fetch_add(1, Ordering::SeqCst);
        self.pending = None;

        if self.probe.fail.load(Ordering::SeqCst) {
            return Err(EngineError::new(-10012, "Recognition failed"));
        }

        let documents = dark_bounds(frame)
            .map(|(x0, y0, x1, y1)| DocumentResult {
                lines: vec![TextLine {
                    text: format!("P<FAKE<{}x{}", x1 - x0, y1 - y0),
                    confidence: 95,
                    location: Quadrilateral::new([
                        Point::new(x0, y0),
                        Point::new(x1, y0),
                        Point::new(x1, y1),
                        Point::new(x0, y1),
                    ]),
                }],
            })
            .into_iter()
            .collect();
        self.pending = Some(ResultSet { documents });
        Ok(())
    }
}

impl RecognitionEngine for FakeEngine {
    fn append_settings(&mut self, settings: &str) -> Result<(), EngineError> {
        if settings.contains("\"locr\"") {
            Ok(())
        } else {
            Err(EngineError::new(-10031, "Template 'locr' not found"))
        }
    }

    fn recognize_file(&mut self, path: &Path, _template: &str) -> Result<(), EngineError> {
        let rgb = image::open(path)
            .map_err(|e| EngineError::new(-10005, e.to_string()))?
            .to_rgb8();
        let (width, height) = (rgb.width() as usize, rgb.height() as usize);
        let frame =
            ImageFrame::from_owned(rgb.into_raw(), width, height, width * 3, PixelFormat::Rgb888)
                .map_err(|e| EngineError::new(-10005, e.to_string()))?;
        self.recognize(&frame)
    }

    fn recognize_buffer(&mut self, frame: &ImageFrame<'_>, _template: &str) -> Result<(), EngineError> {
        self.recognize(frame)
    }

    fn take_results(&mut self) -> Option<ResultSet> {
        self.pending.take()
    }
}

impl Drop for FakeEngine {
    fn drop(&mut self) {
        self.probe.dropped.store(true, Ordering::SeqCst);
    }
}

pub struct FakeBackend {
    pub probe: Arc<FakeProbe>,
    pub fail_create: bool,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            probe: Arc::new(FakeProbe::default()),
            fail_create: false,
        }
    }
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineBackend for FakeBackend {
    fn init_license(&self, key: &str) -> Result<String, EngineError> {
        if key == FAKE_LICENSE {
            Ok("Successful.".to_string())
        } else {
            Err(EngineError::new(-20003, "The license key is invalid."))
        }
    }

    fn create_engine(&self) -> Option<Box<dyn RecognitionEngine>> {
        if self.fail_create {
            return None;
        }
        Some(Box::new(FakeEngine::new(self.probe.clone())))
    }

    fn version(&self) -> String {
        "0.0.0-fake".to_string()
    }
}

/// Bounding box `(x0, y0, x1, y1)` of dark pixels, exclusive on the far edge
fn dark_bounds(frame: &ImageFrame<'_>) -> Option<(i32, i32, i32, i32)> {
    let bpp = frame.format().bytes_per_pixel();
    let mut bounds: Option<(usize, usize, usize, usize)> = None;

    for y in 0..frame.height() {
        for (x, pixel) in frame.row(y).chunks_exact(bpp).enumerate() {
            let luma = match frame.format() {
                PixelFormat::Grayscale => pixel[0] as u32,
                PixelFormat::Rgb888 => (pixel[0] as u32 + pixel[1] as u32 + pixel[2] as u32) / 3,
                PixelFormat::Argb8888 => (pixel[1] as u32 + pixel[2] as u32 + pixel[3] as u32) / 3,
            };
            if luma < 128 {
                bounds = Some(match bounds {
                    None => (x, y, x, y),
                    Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
                });
            }
        }
    }

    bounds.map(|(x0, y0, x1, y1)| (x0 as i32, y0 as i32, x1 as i32 + 1, y1 as i32 + 1))
}

/// White grayscale frame with one black block at `(x, y, w, h)`
pub fn dark_block_frame(
    width: usize,
    height: usize,
    (bx, by, bw, bh): (usize, usize, usize, usize),
) -> Vec<u8> {
    let mut bytes = vec![255u8; width * height];
    for y in by..(by + bh).min(height) {
        for x in bx..(bx + bw).min(width) {
            bytes[y * width + x] = 0;
        }
    }
    bytes
}
