//! Explicit registry of processing stage implementations

use super::{ApplicationArchiveProcessor, AuxiliaryArchiveAppender, AuxiliaryArchiveProcessor};
use scenario_registry::ProtocolArchiveProcessor;
use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

/// Kind of pluggable processing stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    /// Contributes auxiliary archives
    AuxiliaryArchiveAppender,
    /// Transforms each auxiliary archive
    AuxiliaryArchiveProcessor,
    /// Transforms the application archive
    ApplicationArchiveProcessor,
    /// Transforms the packaged testable archive
    ProtocolArchiveProcessor,
}

impl StageKind {
    /// All stage kinds in pipeline order
    pub const ALL: [StageKind; 4] = [
        Self::AuxiliaryArchiveAppender,
        Self::AuxiliaryArchiveProcessor,
        Self::ApplicationArchiveProcessor,
        Self::ProtocolArchiveProcessor,
    ];
}

impl Display for StageKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::AuxiliaryArchiveAppender => "auxiliary archive appender",
            Self::AuxiliaryArchiveProcessor => "auxiliary archive processor",
            Self::ApplicationArchiveProcessor => "application archive processor",
            Self::ProtocolArchiveProcessor => "protocol archive processor",
        };
        f.write_str(name)
    }
}

/// Stage implementations, invoked in registration order
#[derive(Debug, Clone, Default)]
pub struct PluginRegistry {
    appenders: Vec<Arc<dyn AuxiliaryArchiveAppender>>,
    auxiliary_processors: Vec<Arc<dyn AuxiliaryArchiveProcessor>>,
    application_processors: Vec<Arc<dyn ApplicationArchiveProcessor>>,
    protocol_processors: Vec<Arc<dyn ProtocolArchiveProcessor>>,
}

impl PluginRegistry {
    /// Create empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an auxiliary archive appender
    pub fn register_appender(&mut self, appender: impl AuxiliaryArchiveAppender + 'static) -> &mut Self {
        self.appenders.push(Arc::new(appender));
        self
    }

    /// Register an auxiliary archive processor
    pub fn register_auxiliary_processor(
        &mut self,
        processor: impl AuxiliaryArchiveProcessor + 'static,
    ) -> &mut Self {
        self.auxiliary_processors.push(Arc::new(processor));
        self
    }

    /// Register an application archive processor
    pub fn register_application_processor(
        &mut self,
        processor: impl ApplicationArchiveProcessor + 'static,
    ) -> &mut Self {
        self.application_processors.push(Arc::new(processor));
        self
    }

    /// Register a protocol archive processor
    pub fn register_protocol_processor(&mut self, processor: impl ProtocolArchiveProcessor + 'static) -> &mut Self {
        self.protocol_processors.push(Arc::new(processor));
        self
    }

    /// Registered appenders
    #[inline]
    #[must_use]
    pub fn appenders(&self) -> &[Arc<dyn AuxiliaryArchiveAppender>] {
        &self.appenders
    }

    /// Registered auxiliary processors
    #[inline]
    #[must_use]
    pub fn auxiliary_processors(&self) -> &[Arc<dyn AuxiliaryArchiveProcessor>] {
        &self.auxiliary_processors
    }

    /// Registered application processors
    #[inline]
    #[must_use]
    pub fn application_processors(&self) -> &[Arc<dyn ApplicationArchiveProcessor>] {
        &self.application_processors
    }

    /// Registered protocol processors
    #[inline]
    #[must_use]
    pub fn protocol_processors(&self) -> &[Arc<dyn ProtocolArchiveProcessor>] {
        &self.protocol_processors
    }

    /// Number of implementations registered for `kind`
    #[must_use]
    pub fn count(&self, kind: StageKind) -> usize {
        match kind {
            StageKind::AuxiliaryArchiveAppender => self.appenders.len(),
            StageKind::AuxiliaryArchiveProcessor => self.auxiliary_processors.len(),
            StageKind::ApplicationArchiveProcessor => self.application_processors.len(),
            StageKind::ProtocolArchiveProcessor => self.protocol_processors.len(),
        }
    }

    /// Check if nothing is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        StageKind::ALL.iter().all(|kind| self.count(*kind) == 0)
    }
}
