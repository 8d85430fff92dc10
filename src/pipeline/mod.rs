//! Asynchronous decode pipeline
//!
//! At most one worker per scanner. It is created by the first listener
//! registration, receives frames without blocking the submitter, and is torn
//! down by [`AsyncPipeline::stop`] or when the pipeline is dropped. After
//! [`AsyncPipeline::close`] no worker is ever started again.

pub mod queue;
pub mod worker;

pub use queue::{Task, TaskQueue};
pub use worker::{Admission, Listener, Worker, WorkerStats};

use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

use crate::capture::ImageFrame;
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::shared::HostRuntime;
use crate::vision::EngineHandle;

#[derive(Default)]
struct Slot {
    worker: Option<Worker>,
    closed: bool,
}

/// Worker slot for one scanner
pub struct AsyncPipeline {
    engine: Arc<EngineHandle>,
    host: Arc<dyn HostRuntime>,
    config: PipelineConfig,
    slot: Mutex<Slot>,
}

impl AsyncPipeline {
    pub fn new(engine: Arc<EngineHandle>, host: Arc<dyn HostRuntime>, config: PipelineConfig) -> Self {
        Self {
            engine,
            host,
            config,
            slot: Mutex::new(Slot::default()),
        }
    }

    /// Install `listener`, starting the worker if none is running.
    ///
    /// With a worker already running only the listener is swapped; the previous
    /// one is released after the swap. Returns `false` once the pipeline is
    /// closed, in which case the listener is released unused.
    pub fn register(&self, listener: Listener) -> Result<bool> {
        let previous = {
            let mut slot = self.slot.lock();
            if slot.closed {
                drop(slot);
                drop(listener);
                return Ok(false);
            }
            match slot.worker.as_ref() {
                Some(worker) => worker.set_listener(listener),
                None => {
                    let worker = Worker::spawn(
                        &self.config.thread_name,
                        self.engine.clone(),
                        listener,
                        self.host.clone(),
                        self.config.evict_above,
                    )?;
                    slot.worker = Some(worker);
                    None
                }
            }
        };
        if previous.is_some() {
            debug!("Replaced async listener");
        }
        drop(previous);
        Ok(true)
    }

    /// Copy the frame and queue it. Frames submitted without a worker are dropped.
    pub fn submit(&self, frame: ImageFrame<'_>) -> Admission {
        let frame = frame.into_owned();
        let slot = self.slot.lock();
        match slot.worker.as_ref() {
            Some(worker) => worker.submit(frame),
            None => {
                debug!("No async listener registered; dropping frame");
                Admission::Dropped
            }
        }
    }

    /// Stop and join the worker. Returns `false` when no worker was running.
    pub fn stop(&self) -> bool {
        let worker = self.slot.lock().worker.take();
        self.shutdown(worker)
    }

    /// Stop the worker and refuse every later registration
    pub fn close(&self) -> bool {
        let worker = {
            let mut slot = self.slot.lock();
            slot.closed = true;
            slot.worker.take()
        };
        self.shutdown(worker)
    }

    fn shutdown(&self, worker: Option<Worker>) -> bool {
        match worker {
            Some(mut worker) => worker.shutdown(&*self.host),
            None => false,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.slot.lock().closed
    }

    pub fn is_running(&self) -> bool {
        self.slot.lock().worker.as_ref().is_some_and(Worker::is_running)
    }

    /// Counters of the current worker, if any
    pub fn stats(&self) -> Option<WorkerStats> {
        self.slot.lock().worker.as_ref().map(Worker::stats)
    }
}

impl Drop for AsyncPipeline {
    fn drop(&mut self) {
        self.stop();
    }
}
