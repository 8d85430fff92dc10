//! Host runtime boundary
//!
//! The scanner is driven by a scripting host that may run its own code under a
//! global execution lock. The worker thread takes that lock only around a
//! callback invocation; the caller thread gives it up around blocking work.

use std::fmt;
use std::sync::Arc;

use crate::error::{Result, ScannerError};
use crate::vision::LineResult;

/// Execution-lock discipline of the embedding host
pub trait HostRuntime: Send + Sync {
    /// Run `f` while holding the host's global execution lock
    fn with_execution_lock(&self, f: &mut dyn FnMut());

    /// Run blocking `f` with the host's execution lock released by the calling thread
    fn without_execution_lock(&self, f: &mut dyn FnMut());
}

/// Host without a global lock: both hooks just run the closure
#[derive(Debug, Default, Clone, Copy)]
pub struct FreeThreaded;

impl HostRuntime for FreeThreaded {
    fn with_execution_lock(&self, f: &mut dyn FnMut()) {
        f()
    }

    fn without_execution_lock(&self, f: &mut dyn FnMut()) {
        f()
    }
}

/// Run a blocking closure outside the host lock and hand back its value
pub(crate) fn blocking<R>(host: &dyn HostRuntime, f: impl FnOnce() -> R) -> R {
    let mut f = Some(f);
    let mut out = None;
    host.without_execution_lock(&mut || {
        if let Some(f) = f.take() {
            out = Some(f());
        }
    });
    match (out, f) {
        (Some(value), _) => value,
        // Host skipped the closure; run it on this thread instead.
        (None, Some(f)) => f(),
        (None, None) => unreachable!("closure ran without producing a value"),
    }
}

/// Host function invoked with each asynchronous result batch
pub type HostCallable = Arc<dyn Fn(Vec<LineResult>) -> std::result::Result<(), String> + Send + Sync>;

/// A value handed over by the host where a listener is expected
#[derive(Clone)]
pub enum HostValue {
    None,
    Bool(bool),
    Int(i64),
    Str(String),
    Callable(HostCallable),
}

impl HostValue {
    /// Wrap a host function
    pub fn callable<F>(f: F) -> Self
    where
        F: Fn(Vec<LineResult>) -> std::result::Result<(), String> + Send + Sync + 'static,
    {
        HostValue::Callable(Arc::new(f))
    }

    /// Host type name, for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            HostValue::None => "NoneType",
            HostValue::Bool(_) => "bool",
            HostValue::Int(_) => "int",
            HostValue::Str(_) => "str",
            HostValue::Callable(_) => "function",
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, HostValue::Callable(_))
    }

    /// Extract the function, failing with `NotCallable` for any other value
    pub fn into_callable(self) -> Result<HostCallable> {
        match self {
            HostValue::Callable(f) => Ok(f),
            other => Err(ScannerError::NotCallable {
                type_name: other.type_name(),
            }),
        }
    }
}

impl fmt::Debug for HostValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostValue::None => f.write_str("None"),
            HostValue::Bool(b) => write!(f, "Bool({})", b),
            HostValue::Int(i) => write!(f, "Int({})", i),
            HostValue::Str(s) => write!(f, "Str({:?})", s),
            HostValue::Callable(_) => f.write_str("Callable(..)"),
        }
    }
}
