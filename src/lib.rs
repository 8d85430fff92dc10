//! MRZ Scanner - machine readable zone recognition for host runtimes
//!
//! Binds an external MRZ recognition engine for a scripting host. Frames can be
//! decoded synchronously on the caller's thread, or submitted to a single
//! background worker that reports results through a registered listener.
//!
//! ```ignore
//! let module = ScannerModule::new(backend);
//! module.init_license(key);
//! let scanner = module.create_instance()?;
//! let rx = scanner.subscribe()?;
//! scanner.decode_mat_async(&HostBuffer::packed(&pixels, width, 3))?;
//! let lines = rx.recv()?;
//! ```

pub mod capture;
pub mod config;
pub mod error;
pub mod logging;
pub mod module;
pub mod pipeline;
pub mod scanner;
pub mod shared;
pub mod vision;

pub use capture::{load_image, HostBuffer, ImageFrame, PixelFormat};
pub use config::ScannerConfig;
pub use error::{Result, ScannerError};
pub use module::ScannerModule;
pub use pipeline::{Admission, Listener, WorkerStats};
pub use scanner::Scanner;
pub use shared::{FreeThreaded, HostCallable, HostRuntime, HostValue, Status};
pub use vision::{EngineBackend, EngineError, LineResult, Point, Quadrilateral, RecognitionEngine};
