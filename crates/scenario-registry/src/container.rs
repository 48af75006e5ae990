//! Execution containers and their registry
//!
//! A [`Container`] pairs a configured [`ContainerDef`] with the
//! [`DeployableContainer`] implementation that backs it. The
//! [`ContainerRegistry`] is populated once and then shared read-only.

use crate::error::{NotFoundError, RegistryError};
use crate::protocol::ProtocolDescription;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;
use std::sync::Arc;

/// Container operating mode
///
/// Configuration values are matched case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum ContainerMode {
    /// Started once for the whole test suite
    #[default]
    Suite,
    /// Started per test class
    Class,
    /// Started and stopped by the test itself
    Manual,
    /// Lifecycle fully controlled by the user; accepts only unmanaged deployments
    Custom,
}

impl ContainerMode {
    /// Lowercase configuration name
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Suite => "suite",
            Self::Class => "class",
            Self::Manual => "manual",
            Self::Custom => "custom",
        }
    }

    /// Check if deployments must be handled manually
    #[inline]
    #[must_use]
    pub const fn is_custom(self) -> bool {
        matches!(self, Self::Custom)
    }
}

impl Display for ContainerMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown container mode string
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown container mode '{0}', expected one of suite, class, manual, custom")]
pub struct ParseModeError(pub String);

impl TryFrom<String> for ContainerMode {
    type Error = ParseModeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl FromStr for ContainerMode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "suite" => Ok(Self::Suite),
            "class" => Ok(Self::Class),
            "manual" => Ok(Self::Manual),
            "custom" => Ok(Self::Custom),
            _ => Err(ParseModeError(s.to_string())),
        }
    }
}

/// Container configuration as delivered by the configuration loader
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerDef {
    /// Unique qualifier
    pub name: String,
    /// Operating mode
    #[serde(default)]
    pub mode: ContainerMode,
    /// Preferred target when several containers exist
    #[serde(default)]
    pub default: bool,
    /// Implementation-specific properties
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl ContainerDef {
    /// Create a suite-mode, non-default definition
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mode: ContainerMode::default(),
            default: false,
            properties: BTreeMap::new(),
        }
    }

    /// With mode
    #[inline]
    #[must_use]
    pub fn with_mode(mut self, mode: ContainerMode) -> Self {
        self.mode = mode;
        self
    }

    /// Mark as the default container
    #[inline]
    #[must_use]
    pub fn as_default(mut self) -> Self {
        self.default = true;
        self
    }

    /// With a configuration property
    #[inline]
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

/// Capabilities reported by the container implementation
///
/// Consulted only when the protocol registry cannot pick a default protocol
/// from configuration alone.
#[cfg_attr(test, mockall::automock)]
pub trait DeployableContainer: Send + Sync {
    /// Protocol the implementation uses when none is configured
    fn default_protocol(&self) -> ProtocolDescription;

    /// Protocols the implementation can run tests over; empty when unknown
    fn supported_protocols(&self) -> Vec<ProtocolDescription> {
        Vec::new()
    }
}

/// Configured execution container
pub struct Container {
    def: ContainerDef,
    deployable: Arc<dyn DeployableContainer>,
}

impl Container {
    /// Container name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.def.name
    }

    /// Operating mode
    #[inline]
    #[must_use]
    pub fn mode(&self) -> ContainerMode {
        self.def.mode
    }

    /// Whether the definition is marked default
    #[inline]
    #[must_use]
    pub fn is_default(&self) -> bool {
        self.def.default
    }

    /// Full configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ContainerDef {
        &self.def
    }

    /// Backing implementation
    #[inline]
    #[must_use]
    pub fn deployable_container(&self) -> &dyn DeployableContainer {
        self.deployable.as_ref()
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("name", &self.def.name)
            .field("mode", &self.def.mode)
            .field("default", &self.def.default)
            .finish_non_exhaustive()
    }
}

impl PartialEq for Container {
    fn eq(&self, other: &Self) -> bool {
        self.def == other.def
    }
}

impl Eq for Container {}

/// Registry of configured containers, in registration order
#[derive(Debug, Default)]
pub struct ContainerRegistry {
    containers: IndexMap<String, Arc<Container>>,
}

impl ContainerRegistry {
    /// Create empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a container built from `def`
    ///
    /// # Errors
    /// Returns error if a container with the same name already exists
    pub fn create(
        &mut self,
        def: ContainerDef,
        deployable: Arc<dyn DeployableContainer>,
    ) -> Result<Arc<Container>, RegistryError> {
        if self.containers.contains_key(&def.name) {
            return Err(RegistryError::DuplicateContainer(def.name));
        }
        tracing::debug!(container = %def.name, mode = %def.mode, "registered container");
        let container = Arc::new(Container { def, deployable });
        self.containers
            .insert(container.name().to_string(), Arc::clone(&container));
        Ok(container)
    }

    /// Look up a container by name
    ///
    /// # Errors
    /// Returns [`NotFoundError`] if no container has that name
    pub fn get_container(&self, name: &str) -> Result<Arc<Container>, NotFoundError> {
        self.containers
            .get(name)
            .cloned()
            .ok_or_else(|| NotFoundError::container(name))
    }

    /// All containers in registration order
    pub fn containers(&self) -> impl Iterator<Item = &Arc<Container>> {
        self.containers.values()
    }

    /// Container names in registration order
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.containers.keys().map(String::as_str).collect()
    }

    /// Check if a container exists
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.containers.contains_key(name)
    }

    /// Number of registered containers
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.containers.len()
    }

    /// Check if registry is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }
}
