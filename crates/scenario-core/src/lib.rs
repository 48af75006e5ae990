//! Deployment Scenario Generation
//!
//! Turns the deployment declarations of a test class into a validated,
//! processed [`DeploymentScenario`], or fails with an error that names the
//! misconfiguration.
//!
//! # Core Concepts
//!
//! - [`DeclarationExtractor`]: Produces raw [`DeploymentDeclaration`]s
//! - [`ReferenceResolver`]: Binds declarations to containers and protocols
//! - [`ScenarioBuilder`]: Rejects duplicate names and archive clashes
//! - [`ArchiveProcessingPipeline`]: Appends, processes and packages testable archives
//! - [`DeploymentGenerator`]: Runs all of the above for one test class
//!
//! # Example
//!
//! ```rust,ignore
//! use scenario_core::{DeploymentGenerator, ScenarioConfig, TestClass};
//!
//! let config = ScenarioConfig::from_path("scenario.toml")?;
//! scenario_core::init_logging(&config.logging)?;
//! let registries = config.populate(&deployable, &protocols)?;
//!
//! let generator = DeploymentGenerator::new(extractor, registries.containers, registries.protocols)
//!     .with_plugins(plugins);
//! let scenario = generator.generate(&TestClass::new("org.example.GreeterTest"))?;
//! for deployment in scenario.managed_deployments_in_order() {
//!     println!("{} -> {}", deployment.name(), deployment.container().name());
//! }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod config;
mod error;
mod extractor;
mod generator;
mod logging;
mod phase;
mod pipeline;
mod resolver;
mod scenario;
mod types;

pub use config::{ProtocolConfig, Registries, ScenarioConfig};
pub use error::{ConfigError, ExtractionError, GenerationError, PipelineError, StageError, ValidationError};
pub use extractor::DeclarationExtractor;
pub use generator::DeploymentGenerator;
pub use logging::{init_logging, LogFormat, LoggingConfig, LOG_ENV_VAR};
pub use phase::GenerationPhase;
pub use pipeline::{
    ApplicationArchiveProcessor, ArchiveProcessingPipeline, AuxiliaryArchiveAppender, AuxiliaryArchiveProcessor,
    PluginRegistry, StageKind,
};
pub use resolver::ReferenceResolver;
pub use scenario::{DeploymentScenario, ResolvedDeployment, ScenarioBuilder};
pub use types::{DeploymentContent, DeploymentDeclaration, Descriptor, TestClass, DEFAULT_DEPLOYMENT_NAME};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
