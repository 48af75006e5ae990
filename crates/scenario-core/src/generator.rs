//! Scenario generation entry point
//!
//! [`DeploymentGenerator`] drives extraction, resolution, validation and
//! processing for one test class at a time. Everything it holds is read-only
//! after construction, so generations for different test classes may run
//! concurrently.

use crate::error::GenerationError;
use crate::extractor::DeclarationExtractor;
use crate::phase::{GenerationPhase, PhaseTracker};
use crate::pipeline::{ArchiveProcessingPipeline, PluginRegistry};
use crate::resolver::ReferenceResolver;
use crate::scenario::{DeploymentScenario, ScenarioBuilder};
use crate::types::TestClass;
use rayon::prelude::*;
use scenario_archive::{ArchiveFactory, InMemoryArchiveFactory};
use scenario_registry::{ContainerRegistry, ProtocolRegistry};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, info_span, warn};

/// Builds validated deployment scenarios for test classes
pub struct DeploymentGenerator {
    extractor: Arc<dyn DeclarationExtractor>,
    containers: Arc<ContainerRegistry>,
    protocols: Arc<ProtocolRegistry>,
    plugins: Arc<PluginRegistry>,
    archives: Arc<dyn ArchiveFactory>,
}

impl DeploymentGenerator {
    /// Create generator with no processing stages and in-memory archives
    pub fn new(
        extractor: impl DeclarationExtractor + 'static,
        containers: ContainerRegistry,
        protocols: ProtocolRegistry,
    ) -> Self {
        Self {
            extractor: Arc::new(extractor),
            containers: Arc::new(containers),
            protocols: Arc::new(protocols),
            plugins: Arc::new(PluginRegistry::new()),
            archives: Arc::new(InMemoryArchiveFactory),
        }
    }

    /// Set processing stages
    #[must_use]
    pub fn with_plugins(mut self, plugins: PluginRegistry) -> Self {
        self.plugins = Arc::new(plugins);
        self
    }

    /// Set archive factory handed to appenders
    #[must_use]
    pub fn with_archive_factory(mut self, archives: impl ArchiveFactory + 'static) -> Self {
        self.archives = Arc::new(archives);
        self
    }

    /// Container registry
    #[inline]
    #[must_use]
    pub fn containers(&self) -> &ContainerRegistry {
        &self.containers
    }

    /// Protocol registry
    #[inline]
    #[must_use]
    pub fn protocols(&self) -> &ProtocolRegistry {
        &self.protocols
    }

    /// Processing stages
    #[inline]
    #[must_use]
    pub fn plugins(&self) -> &PluginRegistry {
        &self.plugins
    }

    /// Generate the scenario of `test_class`
    ///
    /// All declarations are resolved and validated before any processing
    /// stage runs, so a validation failure never fires a stage.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError`] carrying the failing phase; no partial
    /// scenario is produced.
    pub fn generate(&self, test_class: &TestClass) -> Result<DeploymentScenario, GenerationError> {
        let span = info_span!("generate_scenario", test_class = test_class.name());
        let _guard = span.enter();

        let mut phase = PhaseTracker::new();
        let result = self.run(test_class, &mut phase);
        match &result {
            Ok(scenario) => info!(deployments = scenario.len(), "deployment scenario built"),
            Err(error) => {
                warn!(phase = %phase.current(), %error, "deployment scenario generation failed");
                phase.advance(GenerationPhase::Failed);
            }
        }
        result
    }

    /// Generate scenarios for many test classes in parallel
    ///
    /// Results keep the order of `test_classes`; one failure does not affect
    /// the others.
    #[must_use]
    pub fn generate_all(&self, test_classes: &[TestClass]) -> Vec<Result<DeploymentScenario, GenerationError>> {
        test_classes.par_iter().map(|test_class| self.generate(test_class)).collect()
    }

    fn run(&self, test_class: &TestClass, phase: &mut PhaseTracker) -> Result<DeploymentScenario, GenerationError> {
        let class_name = || test_class.name().to_string();

        phase.advance(GenerationPhase::Extracting);
        let declarations = self
            .extractor
            .extract(test_class)
            .map_err(|source| GenerationError::Extraction {
                test_class: class_name(),
                source,
            })?;
        debug!(declarations = declarations.len(), "extracted deployment declarations");

        phase.advance(GenerationPhase::Resolving);
        let validation = |source| GenerationError::Validation {
            test_class: class_name(),
            source,
        };
        let resolver = ReferenceResolver::new(&self.containers, &self.protocols);
        let mut builder = ScenarioBuilder::new();
        for declaration in declarations {
            let resolved = resolver.resolve(declaration).map_err(validation)?;
            builder.add(resolved).map_err(validation)?;
        }

        phase.advance(GenerationPhase::Processing);
        let pipeline = ArchiveProcessingPipeline::new(&self.plugins, self.archives.as_ref());
        for deployment in builder.deployments_mut() {
            pipeline
                .process(deployment, test_class)
                .map_err(|source| GenerationError::Pipeline {
                    test_class: class_name(),
                    source,
                })?;
        }

        phase.advance(GenerationPhase::Built);
        Ok(builder.build())
    }
}

impl fmt::Debug for DeploymentGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeploymentGenerator")
            .field("containers", &self.containers.names())
            .field("protocols", &self.protocols.names())
            .field("plugins", &self.plugins)
            .field("archives", &self.archives)
            .finish_non_exhaustive()
    }
}
