//! Background decode worker
//!
//! One thread consumes the task queue, runs recognition against the shared
//! engine handle and hands each result batch to the registered listener.

use parking_lot::{Condvar, Mutex};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info, warn};

use crate::capture::ImageFrame;
use crate::pipeline::queue::TaskQueue;
use crate::shared::host::{blocking, HostRuntime};
use crate::vision::{EngineHandle, LineResult};

/// Receiver of asynchronous result batches, invoked on the worker thread
pub type Listener = Arc<dyn Fn(Vec<LineResult>) + Send + Sync>;

/// Outcome of a submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Frame queued; `evicted` stale tasks were discarded first
    Queued { id: u64, evicted: usize },
    /// No running worker; the frame was discarded
    Dropped,
}

/// Counters for one worker's lifetime
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    /// Frames accepted into the queue
    pub submitted: u64,
    /// Queued frames discarded by a newer submission
    pub evicted: u64,
    /// Frames run through the engine
    pub processed: u64,
    /// Listener invocations
    pub delivered: u64,
    /// Queued frames discarded at shutdown
    pub discarded: u64,
}

struct QueueState {
    running: bool,
    queue: TaskQueue,
    listener: Option<Listener>,
    stats: WorkerStats,
}

/// Queue, listener slot and running flag, all behind one mutex
struct Shared {
    state: Mutex<QueueState>,
    available: Condvar,
}

/// Handle to the worker thread
pub struct Worker {
    shared: Arc<Shared>,
    thread: Option<JoinHandle<()>>,
}

impl Worker {
    /// Start a worker thread that decodes through `engine` and reports to `listener`
    pub fn spawn(
        name: &str,
        engine: Arc<EngineHandle>,
        listener: Listener,
        host: Arc<dyn HostRuntime>,
        evict_above: usize,
    ) -> std::io::Result<Self> {
        let shared = Arc::new(Shared {
            state: Mutex::new(QueueState {
                running: true,
                queue: TaskQueue::new(evict_above),
                listener: Some(listener),
                stats: WorkerStats::default(),
            }),
            available: Condvar::new(),
        });

        let thread = {
            let shared = shared.clone();
            thread::Builder::new()
                .name(name.to_string())
                .spawn(move || run(shared, engine, host))?
        };
        info!("Decode worker '{}' started", name);

        Ok(Self {
            shared,
            thread: Some(thread),
        })
    }

    /// Whether the worker accepts new tasks
    pub fn is_running(&self) -> bool {
        self.shared.state.lock().running
    }

    /// Replace the listener, returning the previous one
    pub fn set_listener(&self, listener: Listener) -> Option<Listener> {
        self.shared.state.lock().listener.replace(listener)
    }

    /// Queue an owned frame without waiting for the worker
    pub fn submit(&self, frame: ImageFrame<'static>) -> Admission {
        let evicted = {
            let mut state = self.shared.state.lock();
            if !state.running {
                return Admission::Dropped;
            }
            let (id, evicted) = state.queue.admit(frame);
            state.stats.submitted += 1;
            state.stats.evicted += evicted.len() as u64;
            (id, evicted)
        };
        self.shared.available.notify_one();

        let (id, evicted) = evicted;
        if !evicted.is_empty() {
            debug!("Evicted {} stale frame(s) for frame {}", evicted.len(), id);
        }
        Admission::Queued {
            id,
            evicted: evicted.len(),
        }
    }

    pub fn stats(&self) -> WorkerStats {
        self.shared.state.lock().stats
    }

    /// Stop the thread, discard queued frames, join, then release the listener.
    ///
    /// The join runs with the host lock released. Calling this from the worker
    /// thread itself (inside the listener) skips the join: the `JoinHandle` is
    /// dropped, which detaches the thread, and it exits on its own once the
    /// listener returns. Later calls are no-ops.
    pub fn shutdown(&mut self, host: &dyn HostRuntime) -> bool {
        let Some(thread) = self.thread.take() else {
            return false;
        };

        let discarded = {
            let mut state = self.shared.state.lock();
            state.running = false;
            let discarded = state.queue.drain();
            state.stats.discarded += discarded.len() as u64;
            discarded
        };
        self.shared.available.notify_all();
        if !discarded.is_empty() {
            debug!("Discarded {} queued frame(s) at shutdown", discarded.len());
        }
        drop(discarded);

        if thread.thread().id() == thread::current().id() {
            warn!("Decode worker stopped from its own listener; not joining");
        } else if blocking(host, || thread.join()).is_err() {
            error!("Decode worker panicked");
        }

        let listener = self.shared.state.lock().listener.take();
        drop(listener);
        info!("Decode worker stopped");
        true
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.shutdown(&crate::shared::FreeThreaded);
    }
}

fn run(shared: Arc<Shared>, engine: Arc<EngineHandle>, host: Arc<dyn HostRuntime>) {
    loop {
        let task = {
            let mut state = shared.state.lock();
            while state.queue.is_empty() && state.running {
                shared.available.wait(&mut state);
            }
            if !state.running {
                break;
            }
            match state.queue.pop() {
                Some(task) => task,
                None => continue,
            }
        };

        let id = task.id;
        let lines = engine.decode(&task.frame);
        drop(task);

        let listener = {
            let mut state = shared.state.lock();
            state.stats.processed += 1;
            let listener = state.listener.clone();
            if listener.is_some() {
                state.stats.delivered += 1;
            }
            listener
        };

        let Some(listener) = listener else {
            continue;
        };
        debug!("Delivering {} line(s) for frame {}", lines.len(), id);

        // The listener clone may be the last reference once the slot was
        // swapped or cleared, so it is released under the host lock too.
        let mut batch = Some((listener, lines));
        host.with_execution_lock(&mut || {
            if let Some((listener, lines)) = batch.take() {
                if catch_unwind(AssertUnwindSafe(|| listener(lines))).is_err() {
                    error!("Listener panicked while handling frame {}", id);
                }
                drop(listener);
            }
        });
    }
    debug!("Decode worker loop exited");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::FreeThreaded;
    use crate::vision::testing::{dark_block_frame, FakeEngine, FakeProbe};
    use crate::vision::DEFAULT_TEMPLATE;
    use crossbeam_channel::{unbounded, Receiver};
    use std::time::Duration;

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn setup() -> (Worker, Arc<FakeProbe>, Receiver<Vec<LineResult>>) {
        let probe = Arc::new(FakeProbe::default());
        let engine = Arc::new(EngineHandle::new(
            Box::new(FakeEngine::new(probe.clone())),
            DEFAULT_TEMPLATE,
        ));
        let (tx, rx) = unbounded();
        let listener: Listener = Arc::new(move |lines| {
            let _ = tx.send(lines);
        });
        let worker = Worker::spawn("mrz-test", engine, listener, Arc::new(FreeThreaded), 1).unwrap();
        (worker, probe, rx)
    }

    fn block_at(x: usize) -> ImageFrame<'static> {
        let bytes = dark_block_frame(64, 16, (x, 2, 4, 4));
        ImageFrame::from_owned(bytes, 64, 16, 64, crate::capture::PixelFormat::Grayscale).unwrap()
    }

    #[test]
    fn test_submit_delivers_results() {
        let (mut worker, _probe, rx) = setup();
        assert!(matches!(worker.submit(block_at(3)), Admission::Queued { evicted: 0, .. }));

        let lines = rx.recv_timeout(TIMEOUT).unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].location.points[0].x, 3);
        assert!(worker.shutdown(&FreeThreaded));
    }

    #[test]
    fn test_burst_while_busy_processes_latest_only() {
        let (mut worker, probe, rx) = setup();
        probe.hold();
        worker.submit(block_at(1));
        assert!(probe.wait_until_blocked(TIMEOUT));

        worker.submit(block_at(10));
        worker.submit(block_at(20));
        let admission = worker.submit(block_at(30));
        assert!(matches!(admission, Admission::Queued { evicted: 2, .. }));
        probe.release();

        let first = rx.recv_timeout(TIMEOUT).unwrap();
        let second = rx.recv_timeout(TIMEOUT).unwrap();
        assert_eq!(first[0].location.points[0].x, 1);
        assert_eq!(second[0].location.points[0].x, 30);
        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());

        worker.shutdown(&FreeThreaded);
        assert_eq!(probe.recognitions(), 2);
        let stats = worker.stats();
        assert_eq!(stats.submitted, 4);
        assert_eq!(stats.evicted, 2);
        assert_eq!(stats.processed, 2);
    }

    #[test]
    fn test_empty_frame_still_delivers() {
        let (mut worker, _probe, rx) = setup();
        let blank = ImageFrame::from_owned(
            vec![255u8; 64 * 16],
            64,
            16,
            64,
            crate::capture::PixelFormat::Grayscale,
        )
        .unwrap();
        worker.submit(blank);
        assert!(rx.recv_timeout(TIMEOUT).unwrap().is_empty());
        worker.shutdown(&FreeThreaded);
    }

    #[test]
    fn test_shutdown_discards_queued_and_is_idempotent() {
        let (mut worker, probe, rx) = setup();
        probe.hold();
        worker.submit(block_at(1));
        assert!(probe.wait_until_blocked(TIMEOUT));
        worker.submit(block_at(2));

        let releaser = {
            let probe = probe.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(50));
                probe.release();
            })
        };
        assert!(worker.shutdown(&FreeThreaded));
        assert!(!worker.shutdown(&FreeThreaded));
        releaser.join().unwrap();

        // The in-flight frame completes before the join returns; the queued one never runs.
        assert_eq!(probe.recognitions(), 1);
        assert_eq!(worker.stats().discarded, 1);
        let delivered: Vec<_> = rx.try_iter().collect();
        assert_eq!(delivered.len(), 1);
        assert_eq!(worker.submit(block_at(3)), Admission::Dropped);
    }

    #[test]
    fn test_listener_swap_keeps_single_thread() {
        let (mut worker, _probe, rx) = setup();
        let (tx2, rx2) = unbounded();
        let previous = worker.set_listener(Arc::new(move |lines| {
            let _ = tx2.send(lines);
        }));
        assert!(previous.is_some());

        worker.submit(block_at(5));
        assert!(rx2.recv_timeout(TIMEOUT).is_ok());
        assert!(rx.try_recv().is_err());
        worker.shutdown(&FreeThreaded);
    }

    #[test]
    fn test_listener_panic_does_not_stop_worker() {
        let probe = Arc::new(FakeProbe::default());
        let engine = Arc::new(EngineHandle::new(
            Box::new(FakeEngine::new(probe.clone())),
            DEFAULT_TEMPLATE,
        ));
        let (tx, rx) = unbounded();
        let listener: Listener = Arc::new(move |lines: Vec<LineResult>| {
            if lines.is_empty() {
                panic!("listener failure");
            }
            let _ = tx.send(lines);
        });
        let mut worker =
            Worker::spawn("mrz-test", engine, listener, Arc::new(FreeThreaded), 1).unwrap();

        let blank =
            ImageFrame::from_owned(vec![255u8; 16], 4, 4, 4, crate::capture::PixelFormat::Grayscale)
                .unwrap();
        worker.submit(blank);
        thread::sleep(Duration::from_millis(50));
        worker.submit(block_at(7));
        assert!(rx.recv_timeout(TIMEOUT).is_ok());
        worker.shutdown(&FreeThreaded);
    }
}
