//! Types shared between the scanner and its embedding host

pub mod host;
pub mod status;

pub use host::{FreeThreaded, HostCallable, HostRuntime, HostValue};
pub use status::Status;
