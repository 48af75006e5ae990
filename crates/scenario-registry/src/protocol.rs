//! Protocol definitions and their registry
//!
//! Protocols are registered globally or scoped to a single container. A
//! lookup made on behalf of a container searches that container's scope
//! first and the global scope second.

use crate::container::Container;
use crate::error::{AmbiguousProtocolError, LookupError, NotFoundError, RegistryError};
use crate::packager::DeploymentPackager;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

/// Name of a wire protocol used to run tests inside a container
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProtocolDescription(String);

impl ProtocolDescription {
    /// Pseudo-name meaning "whatever the default protocol resolves to"
    pub const DEFAULT_NAME: &'static str = "_DEFAULT_";

    /// Create a named description
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The `_DEFAULT_` description
    #[inline]
    #[must_use]
    pub fn default_protocol() -> Self {
        Self(Self::DEFAULT_NAME.to_string())
    }

    /// Protocol name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }

    /// Check if this is the `_DEFAULT_` pseudo-name
    #[inline]
    #[must_use]
    pub fn is_default(&self) -> bool {
        self.0 == Self::DEFAULT_NAME
    }
}

impl Display for ProtocolDescription {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProtocolDescription {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// A protocol implementation
pub trait Protocol: Send + Sync + fmt::Debug {
    /// Name under which the protocol is registered
    fn description(&self) -> ProtocolDescription;

    /// Packager that builds testable archives for this protocol
    fn packager(&self) -> Arc<dyn DeploymentPackager>;
}

/// A protocol implementation plus its configuration
#[derive(Clone)]
pub struct ProtocolDefinition {
    description: ProtocolDescription,
    protocol: Arc<dyn Protocol>,
    config: BTreeMap<String, String>,
    default: bool,
}

impl ProtocolDefinition {
    /// Create definition
    #[must_use]
    pub fn new(protocol: Arc<dyn Protocol>, config: BTreeMap<String, String>, default: bool) -> Self {
        Self {
            description: protocol.description(),
            protocol,
            config,
            default,
        }
    }

    /// Protocol name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        self.description.name()
    }

    /// Protocol description
    #[inline]
    #[must_use]
    pub fn description(&self) -> &ProtocolDescription {
        &self.description
    }

    /// Configuration properties
    #[inline]
    #[must_use]
    pub fn config(&self) -> &BTreeMap<String, String> {
        &self.config
    }

    /// Whether this definition is explicitly marked default
    #[inline]
    #[must_use]
    pub fn is_default(&self) -> bool {
        self.default
    }

    /// Underlying implementation
    #[inline]
    #[must_use]
    pub fn protocol(&self) -> &Arc<dyn Protocol> {
        &self.protocol
    }

    /// Packager of the underlying implementation
    #[inline]
    #[must_use]
    pub fn packager(&self) -> Arc<dyn DeploymentPackager> {
        self.protocol.packager()
    }
}

impl fmt::Debug for ProtocolDefinition {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProtocolDefinition")
            .field("name", &self.description.name())
            .field("default", &self.default)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl PartialEq for ProtocolDefinition {
    fn eq(&self, other: &Self) -> bool {
        self.description == other.description
            && self.default == other.default
            && self.config == other.config
    }
}

impl Eq for ProtocolDefinition {}

/// Where a protocol definition is visible
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ProtocolScope {
    /// Visible to every container
    Global,
    /// Visible only to the named container
    Container(String),
}

impl Display for ProtocolScope {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global => f.write_str("global scope"),
            Self::Container(name) => write!(f, "container '{name}'"),
        }
    }
}

/// Registry of protocol definitions
#[derive(Debug, Default, Clone)]
pub struct ProtocolRegistry {
    global: IndexMap<String, ProtocolDefinition>,
    scoped: IndexMap<String, IndexMap<String, ProtocolDefinition>>,
}

impl ProtocolRegistry {
    /// Create empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a globally visible definition
    ///
    /// # Errors
    /// Returns error if the name is already registered globally
    pub fn add_protocol(&mut self, definition: ProtocolDefinition) -> Result<&mut Self, RegistryError> {
        Self::insert(&mut self.global, ProtocolScope::Global, definition)?;
        Ok(self)
    }

    /// Register a definition visible only to `container`
    ///
    /// # Errors
    /// Returns error if the name is already registered for that container
    pub fn add_container_protocol(
        &mut self,
        container: &str,
        definition: ProtocolDefinition,
    ) -> Result<&mut Self, RegistryError> {
        let scope = ProtocolScope::Container(container.to_string());
        let entries = self.scoped.entry(container.to_string()).or_default();
        Self::insert(entries, scope, definition)?;
        Ok(self)
    }

    fn insert(
        entries: &mut IndexMap<String, ProtocolDefinition>,
        scope: ProtocolScope,
        definition: ProtocolDefinition,
    ) -> Result<(), RegistryError> {
        let name = definition.name().to_string();
        if entries.contains_key(&name) {
            return Err(RegistryError::DuplicateProtocol { name, scope });
        }
        tracing::debug!(protocol = %name, %scope, default = definition.is_default(), "registered protocol");
        entries.insert(name, definition);
        Ok(())
    }

    /// Unscoped lookup by name
    ///
    /// Global definitions win. A name that exists only in container scopes
    /// resolves when exactly one container defines it and is ambiguous
    /// otherwise. `_DEFAULT_` resolves to the globally marked default, or to
    /// the sole global definition.
    ///
    /// # Errors
    /// Returns [`LookupError`] if nothing or more than one definition matches
    pub fn get_protocol(&self, name: &str) -> Result<&ProtocolDefinition, LookupError> {
        if name == ProtocolDescription::DEFAULT_NAME {
            let global: Vec<_> = self.global.values().collect();
            return pick_default(&global, &ProtocolScope::Global)?
                .ok_or_else(|| NotFoundError::protocol(name).into());
        }
        if let Some(definition) = self.global.get(name) {
            return Ok(definition);
        }

        let matches: Vec<(&String, &ProtocolDefinition)> = self
            .scoped
            .iter()
            .filter_map(|(container, entries)| entries.get(name).map(|d| (container, d)))
            .collect();
        match matches.as_slice() {
            [] => Err(NotFoundError::protocol(name).into()),
            [(_, definition)] => Ok(*definition),
            many => Err(AmbiguousProtocolError {
                scope: ProtocolScope::Global,
                candidates: many
                    .iter()
                    .map(|(container, d)| format!("{}@{container}", d.name()))
                    .collect(),
            }
            .into()),
        }
    }

    /// Look up `name` as seen by `container`
    ///
    /// # Errors
    /// Returns [`NotFoundError`] if neither scope defines the name
    pub fn protocol_for(&self, container: &str, name: &str) -> Result<&ProtocolDefinition, NotFoundError> {
        self.scoped
            .get(container)
            .and_then(|entries| entries.get(name))
            .or_else(|| self.global.get(name))
            .ok_or_else(|| NotFoundError::protocol(name))
    }

    /// Definitions visible to `container`: its own first, then unshadowed globals
    #[must_use]
    pub fn protocols_for(&self, container: &str) -> Vec<&ProtocolDefinition> {
        let own = self.scoped.get(container);
        let mut visible: Vec<&ProtocolDefinition> =
            own.map(|entries| entries.values().collect()).unwrap_or_default();
        visible.extend(
            self.global
                .values()
                .filter(|d| own.map_or(true, |entries| !entries.contains_key(d.name()))),
        );
        visible
    }

    /// Resolve the default protocol for `container`
    ///
    /// # Selection
    /// 1. The single definition scoped to the container and marked default
    /// 2. The single visible definition marked default
    /// 3. The sole visible definition
    /// 4. The definition named by the container's own default protocol
    ///    (the container is consulted exactly once, and only here)
    /// 5. The single visible definition the container reports supporting
    ///
    /// # Errors
    /// - [`LookupError::Ambiguous`] if several definitions qualify equally
    /// - [`LookupError::NotFound`] if no definition is visible at all
    pub fn default_protocol(&self, container: &Container) -> Result<&ProtocolDefinition, LookupError> {
        let scope = ProtocolScope::Container(container.name().to_string());
        let own_marked: Vec<&ProtocolDefinition> = self
            .scoped
            .get(container.name())
            .map(|entries| entries.values().filter(|d| d.is_default()).collect())
            .unwrap_or_default();
        match own_marked.as_slice() {
            [only] => return Ok(*only),
            [] => {}
            many => return Err(ambiguous(scope, many).into()),
        }

        let visible = self.protocols_for(container.name());
        if let Some(definition) = pick_default(&visible, &scope)? {
            return Ok(definition);
        }

        let reported = container.deployable_container().default_protocol();
        tracing::debug!(
            container = container.name(),
            protocol = %reported,
            "no configured default protocol, using container default"
        );
        if let Some(definition) = visible.iter().copied().find(|d| d.description() == &reported) {
            return Ok(definition);
        }
        if visible.is_empty() {
            return Err(NotFoundError::protocol(reported.name()).into());
        }

        let supported = container.deployable_container().supported_protocols();
        let matching: Vec<&ProtocolDefinition> = visible
            .iter()
            .copied()
            .filter(|d| supported.contains(d.description()))
            .collect();
        match matching.as_slice() {
            [only] => Ok(*only),
            [] => Err(ambiguous(scope, &visible).into()),
            many => Err(ambiguous(scope, many).into()),
        }
    }

    /// All registered protocol names (global first, then per container)
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.global
            .keys()
            .cloned()
            .chain(self.scoped.iter().flat_map(|(container, entries)| {
                entries.keys().map(move |name| format!("{name}@{container}"))
            }))
            .collect()
    }

    /// Number of registered definitions across all scopes
    #[must_use]
    pub fn len(&self) -> usize {
        self.global.len() + self.scoped.values().map(IndexMap::len).sum::<usize>()
    }

    /// Check if no definition is registered
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Marked default, else the sole definition, else `None`
fn pick_default<'a>(
    visible: &[&'a ProtocolDefinition],
    scope: &ProtocolScope,
) -> Result<Option<&'a ProtocolDefinition>, AmbiguousProtocolError> {
    let marked: Vec<&ProtocolDefinition> = visible.iter().copied().filter(|d| d.is_default()).collect();
    match (marked.as_slice(), visible) {
        ([only], _) => Ok(Some(*only)),
        ([], [only]) => Ok(Some(*only)),
        ([], _) => Ok(None),
        (many, _) => Err(ambiguous(scope.clone(), many)),
    }
}

fn ambiguous(scope: ProtocolScope, candidates: &[&ProtocolDefinition]) -> AmbiguousProtocolError {
    AmbiguousProtocolError {
        scope,
        candidates: candidates.iter().map(|d| d.name().to_string()).collect(),
    }
}
