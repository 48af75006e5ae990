//! Archive processing pipeline
//!
//! Testable archive deployments pass through four stages, each fired at most
//! once per deployment:
//!
//! 1. Auxiliary archive appenders contribute extra archives
//! 2. Auxiliary archive processors transform each contributed archive
//! 3. Application archive processors transform the application archive
//! 4. The protocol packager combines everything into the testable archive,
//!    running protocol archive processors over the result
//!
//! Non-testable deployments and descriptors bypass the pipeline entirely.

mod plugins;

pub use plugins::{PluginRegistry, StageKind};

use crate::error::{PipelineError, StageError};
use crate::scenario::ResolvedDeployment;
use crate::types::TestClass;
use scenario_archive::{Archive, ArchiveFactory};
use scenario_registry::TestDeployment;
use std::collections::BTreeSet;
use std::fmt::Debug;
use tracing::{debug, trace};

/// Contributes an auxiliary archive to each testable deployment
pub trait AuxiliaryArchiveAppender: Send + Sync + Debug {
    /// Create the auxiliary archive, or `None` to contribute nothing
    ///
    /// # Errors
    ///
    /// Returns error if the archive can not be built.
    fn create_auxiliary_archive(&self, archives: &dyn ArchiveFactory) -> Result<Option<Archive>, StageError>;
}

/// Transforms one auxiliary archive
pub trait AuxiliaryArchiveProcessor: Send + Sync + Debug {
    /// Process `auxiliary_archive` in place
    ///
    /// # Errors
    ///
    /// Returns error if processing fails.
    fn process(&self, auxiliary_archive: &mut Archive) -> Result<(), StageError>;
}

/// Transforms the application archive of a testable deployment
pub trait ApplicationArchiveProcessor: Send + Sync + Debug {
    /// Process `application_archive` in place
    ///
    /// # Errors
    ///
    /// Returns error if processing fails.
    fn process(&self, application_archive: &mut Archive, test_class: &TestClass) -> Result<(), StageError>;
}

/// Runs the processing stages over resolved deployments
#[derive(Debug, Clone, Copy)]
pub struct ArchiveProcessingPipeline<'a> {
    plugins: &'a PluginRegistry,
    archives: &'a dyn ArchiveFactory,
}

impl<'a> ArchiveProcessingPipeline<'a> {
    /// Create pipeline over the given stages
    #[must_use]
    pub fn new(plugins: &'a PluginRegistry, archives: &'a dyn ArchiveFactory) -> Self {
        Self { plugins, archives }
    }

    /// Process one deployment; a no-op unless it is a testable archive with a protocol
    ///
    /// # Errors
    ///
    /// Returns the first stage or packaging failure. The deployment is left
    /// unprocessed on error.
    pub fn process(&self, deployment: &mut ResolvedDeployment, test_class: &TestClass) -> Result<(), PipelineError> {
        let name = deployment.name().to_string();
        let Some((application, protocol)) = deployment.processing_parts() else {
            trace!(deployment = %name, "deployment not testable, skipping processing");
            return Ok(());
        };
        let stage_error = |stage: StageKind| {
            let deployment = name.clone();
            move |source: StageError| PipelineError::Stage {
                stage,
                deployment,
                source,
            }
        };

        let mut auxiliaries = self.append_auxiliaries().map_err(stage_error(StageKind::AuxiliaryArchiveAppender))?;

        for auxiliary in &mut auxiliaries {
            for processor in self.plugins.auxiliary_processors() {
                processor
                    .process(auxiliary)
                    .map_err(stage_error(StageKind::AuxiliaryArchiveProcessor))?;
            }
        }

        for processor in self.plugins.application_processors() {
            processor
                .process(application, test_class)
                .map_err(stage_error(StageKind::ApplicationArchiveProcessor))?;
        }

        let protocol_name = protocol.name().to_string();
        let test_deployment = TestDeployment::new(name.clone(), application.clone(), auxiliaries);
        let testable = protocol
            .packager()
            .generate_deployment(&test_deployment, self.plugins.protocol_processors())
            .map_err(|source| PipelineError::Packaging {
                deployment: name.clone(),
                protocol: protocol_name.clone(),
                source,
            })?;

        debug!(
            deployment = %name,
            protocol = %protocol_name,
            auxiliaries = test_deployment.auxiliary_archives().len(),
            testable = testable.name(),
            "packaged testable archive"
        );
        deployment.set_processed(test_deployment.auxiliary_archives().to_vec(), testable);
        Ok(())
    }

    fn append_auxiliaries(&self) -> Result<Vec<Archive>, StageError> {
        let mut seen = BTreeSet::new();
        let mut auxiliaries = Vec::new();
        for appender in self.plugins.appenders() {
            let Some(archive) = appender.create_auxiliary_archive(self.archives)? else {
                continue;
            };
            if !seen.insert(archive.name().to_string()) {
                return Err(StageError::DuplicateAuxiliaryArchive(archive.name().to_string()));
            }
            auxiliaries.push(archive);
        }
        Ok(auxiliaries)
    }
}
