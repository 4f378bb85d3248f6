//! Service container for dependency injection
//!
//! Wires up services with their dependencies.

use std::sync::Arc;

use crate::application::services::PackService;
use crate::config::Settings;
use crate::infrastructure::traits::{FileSystem, Logger, RealFileSystem, TracingLogger};

/// Container holding the application services for one invocation.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    /// Diagnostic sink handed to the compiler
    pub logger: Arc<dyn Logger>,

    pub pack_service: PackService,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> Self {
        Self::with_deps(settings, Arc::new(RealFileSystem), Arc::new(TracingLogger))
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(settings: Settings, fs: Arc<dyn FileSystem>, logger: Arc<dyn Logger>) -> Self {
        let settings = Arc::new(settings);
        let pack_service = PackService::new(Arc::clone(&fs));

        Self {
            settings,
            fs,
            logger,
            pack_service,
        }
    }
}
