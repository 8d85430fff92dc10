//! Process-wide entry points
//!
//! The module holds the engine backend, the host runtime and the configuration
//! applied to every scanner it creates.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::ScannerConfig;
use crate::error::{Result, ScannerError};
use crate::scanner::Scanner;
use crate::shared::{FreeThreaded, HostRuntime, Status};
use crate::vision::{EngineBackend, SettingsSource};

/// Entry point the host binds to
pub struct ScannerModule {
    backend: Arc<dyn EngineBackend>,
    host: Arc<dyn HostRuntime>,
    config: ScannerConfig,
    licensed: AtomicBool,
}

impl ScannerModule {
    /// Create a module with default configuration and no host lock
    pub fn new(backend: Arc<dyn EngineBackend>) -> Self {
        Self {
            backend,
            host: Arc::new(FreeThreaded),
            config: ScannerConfig::default(),
            licensed: AtomicBool::new(false),
        }
    }

    /// Create a module from configuration, activating `engine.license` when set
    pub fn from_config(backend: Arc<dyn EngineBackend>, config: ScannerConfig) -> Self {
        let module = Self::new(backend).with_config(config);
        if let Some(key) = module.config.engine.license.clone() {
            module.init_license(&key);
        }
        module
    }

    /// Use the given host runtime for scanners created from now on
    pub fn with_host(mut self, host: Arc<dyn HostRuntime>) -> Self {
        self.host = host;
        self
    }

    /// Use the given configuration for scanners created from now on
    pub fn with_config(mut self, config: ScannerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// Activate the engine library
    pub fn init_license(&self, key: &str) -> Status {
        match self.backend.init_license(key) {
            Ok(message) => {
                info!("License initialized: {}", message);
                self.licensed.store(true, Ordering::SeqCst);
                Status::ok(message)
            }
            Err(e) => {
                warn!("License initialization failed: {}", e);
                Status {
                    code: e.code,
                    message: e.message,
                }
            }
        }
    }

    pub fn is_licensed(&self) -> bool {
        self.licensed.load(Ordering::SeqCst)
    }

    /// Create a scanner with its own engine instance.
    ///
    /// Settings configured under `engine.settings` are appended right away; a
    /// failure there is logged and the scanner is still returned.
    pub fn create_instance(&self) -> Result<Scanner> {
        if !self.is_licensed() {
            warn!("Creating a scanner before the license was initialized");
        }

        let engine = self
            .backend
            .create_engine()
            .ok_or(ScannerError::EngineUnavailable)?;
        let scanner = Scanner::new(engine, &self.config, self.host.clone());

        if let Some(path) = &self.config.engine.settings {
            let status = scanner.load_model(SettingsSource::File(path.clone()));
            if !status.is_ok() {
                warn!("Configured settings {:?} not applied: {}", path, status);
            }
        }
        Ok(scanner)
    }

    /// Engine library version
    pub fn version(&self) -> String {
        self.backend.version()
    }
}
