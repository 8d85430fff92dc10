//! Scanner instance
//!
//! Owns one engine handle and one async pipeline, and fixes their teardown
//! order: the worker is stopped and joined before the engine is destroyed.

use crossbeam_channel::{unbounded, Receiver};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::capture::{self, HostBuffer, ImageFrame, PixelFormat};
use crate::config::ScannerConfig;
use crate::error::Result;
use crate::pipeline::{Admission, AsyncPipeline, Listener, WorkerStats};
use crate::shared::host::blocking;
use crate::shared::{HostRuntime, HostValue, Status};
use crate::vision::{EngineHandle, LineResult, RecognitionEngine, SettingsSource};

/// MRZ scanner bound to one engine instance
pub struct Scanner {
    id: Uuid,
    engine: Arc<EngineHandle>,
    pipeline: AsyncPipeline,
    host: Arc<dyn HostRuntime>,
    closed: AtomicBool,
}

impl Scanner {
    /// Wrap a freshly created engine
    pub fn new(
        engine: Box<dyn RecognitionEngine>,
        config: &ScannerConfig,
        host: Arc<dyn HostRuntime>,
    ) -> Self {
        let engine = Arc::new(EngineHandle::new(engine, config.engine.template.clone()));
        let pipeline = AsyncPipeline::new(engine.clone(), host.clone(), config.pipeline.clone());
        let id = Uuid::new_v4();
        debug!(scanner = %id, "Scanner created");

        Self {
            id,
            engine,
            pipeline,
            host,
            closed: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Append recognition settings from a file path or inline settings text
    pub fn load_model(&self, source: impl Into<SettingsSource>) -> Status {
        let source = source.into();
        Status::from(blocking(&*self.host, || self.engine.load_settings(&source)))
    }

    /// Recognize an image file
    pub fn decode_file(&self, path: impl AsRef<Path>) -> Vec<LineResult> {
        let path = path.as_ref();
        blocking(&*self.host, || self.engine.decode_file(path))
    }

    /// Recognize a strided host buffer
    pub fn decode_mat(&self, buffer: &HostBuffer<'_>) -> Result<Vec<LineResult>> {
        let frame = buffer.frame()?;
        Ok(self.decode_frame(&frame))
    }

    /// Recognize raw bytes with a declared pixel format
    pub fn decode_bytes(
        &self,
        bytes: &[u8],
        width: usize,
        height: usize,
        stride: usize,
        format: PixelFormat,
    ) -> Result<Vec<LineResult>> {
        let frame = ImageFrame::with_format(bytes, width, height, stride, format)?;
        Ok(self.decode_frame(&frame))
    }

    /// Recognize an already wrapped frame
    pub fn decode_frame(&self, frame: &ImageFrame<'_>) -> Vec<LineResult> {
        blocking(&*self.host, || self.engine.decode(frame))
    }

    /// Queue a strided host buffer for the worker. Results arrive at the listener.
    pub fn decode_mat_async(&self, buffer: &HostBuffer<'_>) -> Result<Status> {
        let frame = buffer.frame()?;
        self.submit(frame);
        Ok(Status::ok("Queued."))
    }

    /// Queue raw bytes with a declared pixel format
    pub fn decode_bytes_async(
        &self,
        bytes: &[u8],
        width: usize,
        height: usize,
        stride: usize,
        format: PixelFormat,
    ) -> Result<Status> {
        let frame = ImageFrame::with_format(bytes, width, height, stride, format)?;
        self.submit(frame);
        Ok(Status::ok("Queued."))
    }

    /// Decode an image file on this thread and queue its pixels
    pub fn decode_file_async(&self, path: impl AsRef<Path>) -> Result<Status> {
        let frame = capture::load_image(path)?;
        self.submit(frame);
        Ok(Status::ok("Queued."))
    }

    /// Copy a frame into the async queue
    pub fn submit(&self, frame: ImageFrame<'_>) -> Admission {
        let admission = self.pipeline.submit(frame);
        if let Admission::Queued { id, evicted } = admission {
            debug!(scanner = %self.id, frame = id, evicted, "Frame queued");
        }
        admission
    }

    /// Register a host callable as the async listener
    pub fn add_async_listener(&self, handler: HostValue) -> Result<Status> {
        let callable = handler.into_callable()?;
        let scanner = self.id;
        self.set_listener(move |lines| {
            if let Err(e) = callable(lines) {
                error!(scanner = %scanner, "Async listener raised: {}", e);
            }
        })?;
        Ok(Status::ok("Listener registered."))
    }

    /// Register a Rust listener, starting the worker on first use
    pub fn set_listener<F>(&self, listener: F) -> Result<()>
    where
        F: Fn(Vec<LineResult>) + Send + Sync + 'static,
    {
        let listener: Listener = Arc::new(listener);
        if self.pipeline.register(listener)? {
            info!(scanner = %self.id, "Async listener registered");
        } else {
            warn!(scanner = %self.id, "Listener registration after close ignored");
        }
        Ok(())
    }

    /// Register a listener that forwards every result batch into a channel
    pub fn subscribe(&self) -> Result<Receiver<Vec<LineResult>>> {
        let (tx, rx) = unbounded();
        self.set_listener(move |lines| {
            let _ = tx.send(lines);
        })?;
        Ok(rx)
    }

    /// Stop the worker and release the listener. Safe to call repeatedly.
    pub fn clear_async_listener(&self) -> Status {
        if self.pipeline.stop() {
            info!(scanner = %self.id, "Async listener cleared");
        }
        Status::ok("Listener cleared.")
    }

    pub fn is_listening(&self) -> bool {
        self.pipeline.is_running()
    }

    /// Counters of the running worker, if any
    pub fn stats(&self) -> Option<WorkerStats> {
        self.pipeline.stats()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Tear down: stop and join the worker, then destroy the engine.
    ///
    /// Later decodes return empty results and submissions are dropped.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.pipeline.close();
        if self.engine.destroy() {
            info!(scanner = %self.id, "Scanner closed");
        }
    }
}

impl Drop for Scanner {
    fn drop(&mut self) {
        self.close();
    }
}
