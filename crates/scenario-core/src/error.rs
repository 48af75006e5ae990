//! Error types for scenario generation
//!
//! Provides error handling for:
//! - Declaration extraction failures
//! - User-fixable validation failures (container / protocol references)
//! - Processing stage and packaging failures
//! - Configuration loading

use crate::phase::GenerationPhase;
use crate::pipeline::StageKind;
use scenario_archive::ArchiveError;
use scenario_registry::{AmbiguousProtocolError, NotFoundError, PackagingError, RegistryError};
use std::path::PathBuf;

/// User-fixable mismatch between declarations and configuration
///
/// Every message names the concrete cause so the configuration can be fixed
/// without reading code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// No container is registered at all
    #[error(
        "DeploymentScenario contains a target ({target}) not matching any defined Container in the registry. \
         Please include at least 1 Deployable Container on your Classpath."
    )]
    NoContainers {
        /// Target the deployment asked for
        target: String,
    },

    /// Explicit target names no registered container
    #[error(
        "DeploymentScenario contains a target ({target}) not matching any defined Container in the registry. \
         Deployment {deployment} targets container ({target}) that does not match any found/configured Containers ({}), \
         see the container qualifiers in the configuration",
        .available.join(", ")
    )]
    UnknownContainer {
        /// Deployment name
        deployment: String,
        /// Requested container name
        target: String,
        /// Registered container names
        available: Vec<String>,
    },

    /// No target given, several containers and none marked default
    #[error(
        "Deployment {deployment} does not target a container and none of the {} found/configured Containers ({}) \
         is marked as default",
        .available.len(),
        .available.join(", ")
    )]
    AmbiguousContainer {
        /// Deployment name
        deployment: String,
        /// Registered container names
        available: Vec<String>,
    },

    /// Managed deployment targeting a `custom` mode container
    #[error(
        "Deployment {deployment} is targeted against container {container}. \
         This container is set to mode custom which can not handle managed deployments. \
         Please verify the deployment target or the container mode in the configuration"
    )]
    ManagedOnCustomContainer {
        /// Deployment name
        deployment: String,
        /// Custom mode container
        container: String,
    },

    /// Explicit protocol names no visible definition
    #[error(
        "DeploymentScenario contains protocol {protocol} not maching any defined Protocol, \
         possible protocols for container {container}: [{}]",
        .available.join(", ")
    )]
    UnknownProtocol {
        /// Deployment name
        deployment: String,
        /// Container the deployment targets
        container: String,
        /// Requested protocol name
        protocol: String,
        /// Protocol names visible to the container
        available: Vec<String>,
    },

    /// Several protocol definitions qualify as default
    #[error("Deployment {deployment} can not select a protocol: {source}")]
    AmbiguousProtocol {
        /// Deployment name
        deployment: String,
        /// Candidates that qualified
        #[source]
        source: AmbiguousProtocolError,
    },

    /// Default protocol resolution found nothing
    #[error("Deployment {deployment} on container {container} has no usable protocol: {source}")]
    NotFound {
        /// Deployment name
        deployment: String,
        /// Container the deployment targets
        container: String,
        /// Failed lookup
        #[source]
        source: NotFoundError,
    },

    /// Two deployments share a name
    #[error("DeploymentScenario contains more than one deployment named {0}")]
    DuplicateDeploymentName(String),

    /// Two deployments ship the same archive name to one container
    #[error(
        "Deployment {deployment} deploys archive {archive} to container {container}, \
         which already receives an archive with the same name"
    )]
    DuplicateArchiveOnTarget {
        /// Deployment shipping the second copy
        deployment: String,
        /// Archive file name
        archive: String,
        /// Container receiving both archives
        container: String,
    },
}

impl ValidationError {
    /// Check if this is the ambiguous-protocol subtype
    #[inline]
    #[must_use]
    pub fn is_ambiguous_protocol(&self) -> bool {
        matches!(self, Self::AmbiguousProtocol { .. })
    }
}

/// Declaration extraction errors
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    /// Declaration metadata could not be interpreted
    #[error("malformed deployment declaration on {test_class}: {message}")]
    Malformed {
        /// Test class carrying the declaration
        test_class: String,
        /// What could not be interpreted
        message: String,
    },

    /// Building the declared archive failed
    #[error("archive construction failed: {0}")]
    Archive(#[from] ArchiveError),
}

impl ExtractionError {
    /// Create malformed-declaration error
    pub fn malformed(test_class: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Malformed {
            test_class: test_class.into(),
            message: message.into(),
        }
    }
}

/// Errors raised by a processing stage implementation
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    /// Archive manipulation failed
    #[error("archive error: {0}")]
    Archive(#[from] ArchiveError),

    /// Two appenders contributed archives with the same name
    #[error("auxiliary archive {0} was contributed more than once")]
    DuplicateAuxiliaryArchive(String),

    /// Stage-specific failure
    #[error("{0}")]
    Failed(String),
}

/// Processing pipeline errors
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A stage implementation failed
    #[error("{stage} failed for deployment {deployment}: {source}")]
    Stage {
        /// Stage that failed
        stage: StageKind,
        /// Deployment being processed
        deployment: String,
        /// Stage failure
        #[source]
        source: StageError,
    },

    /// The protocol packager failed
    #[error("packaging over protocol {protocol} failed for deployment {deployment}: {source}")]
    Packaging {
        /// Deployment being packaged
        deployment: String,
        /// Protocol whose packager ran
        protocol: String,
        /// Packager failure
        #[source]
        source: PackagingError,
    },
}

/// Scenario generation failure; nothing is published for the test class
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// Declaration extraction failed
    #[error("deployment extraction failed for {test_class}: {source}")]
    Extraction {
        /// Test class being generated
        test_class: String,
        /// Underlying failure
        #[source]
        source: ExtractionError,
    },

    /// Declarations do not match configuration
    #[error("deployment validation failed for {test_class}: {source}")]
    Validation {
        /// Test class being generated
        test_class: String,
        /// Underlying failure
        #[source]
        source: ValidationError,
    },

    /// Archive processing failed
    #[error("deployment processing failed for {test_class}: {source}")]
    Pipeline {
        /// Test class being generated
        test_class: String,
        /// Underlying failure
        #[source]
        source: PipelineError,
    },
}

impl GenerationError {
    /// Phase in which generation failed
    #[must_use]
    pub fn phase(&self) -> GenerationPhase {
        match self {
            Self::Extraction { .. } => GenerationPhase::Extracting,
            Self::Validation { .. } => GenerationPhase::Resolving,
            Self::Pipeline { .. } => GenerationPhase::Processing,
        }
    }

    /// Check if the failure is user-fixable configuration
    #[inline]
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Underlying validation error, if any
    #[must_use]
    pub fn validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Test class the failure belongs to
    #[must_use]
    pub fn test_class(&self) -> &str {
        match self {
            Self::Extraction { test_class, .. }
            | Self::Validation { test_class, .. }
            | Self::Pipeline { test_class, .. } => test_class,
        }
    }
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error reading a configuration file
    #[error("io error reading {path}: {source}")]
    Io {
        /// File being read
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// File extension is neither TOML nor YAML
    #[error("unsupported configuration format: {0}")]
    UnsupportedFormat(PathBuf),

    /// TOML syntax or shape error
    #[error("invalid TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// YAML syntax or shape error
    #[error("invalid YAML configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Registry population failed
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Configured protocol has no available implementation
    #[error("protocol {name} is configured but not available, available protocols: [{}]", .available.join(", "))]
    UnknownProtocolType {
        /// Configured protocol name
        name: String,
        /// Names of the available implementations
        available: Vec<String>,
    },

    /// Protocol scoped to a container that is not configured
    #[error("protocol {protocol} is scoped to unknown container {container}")]
    UnknownProtocolScope {
        /// Configured protocol name
        protocol: String,
        /// Container the protocol is scoped to
        container: String,
    },

    /// Invalid log level or filter directive
    #[error("invalid logging configuration: {0}")]
    Logging(String),
}
