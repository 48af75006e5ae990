//! Configuration loading and registry population
//!
//! Containers and protocol definitions are described in TOML or YAML:
//!
//! ```toml
//! [[containers]]
//! name = "tomcat"
//! mode = "suite"
//! default = true
//!
//! [[protocols]]
//! name = "servlet"
//! default = true
//! properties = { context = "/test" }
//!
//! [logging]
//! level = "debug"
//! ```

use crate::error::ConfigError;
use crate::logging::LoggingConfig;
use scenario_registry::{
    ContainerDef, ContainerRegistry, DeployableContainer, Protocol, ProtocolDefinition, ProtocolRegistry,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Configuration of one protocol definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolConfig {
    /// Protocol name; must match an available implementation
    pub name: String,
    /// Marked as default within its scope
    #[serde(default)]
    pub default: bool,
    /// Restrict the definition to one container
    #[serde(default)]
    pub container: Option<String>,
    /// Free-form protocol properties
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl ProtocolConfig {
    /// Create global, non-default protocol config
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: false,
            container: None,
            properties: BTreeMap::new(),
        }
    }

    /// Mark as default
    #[must_use]
    pub fn as_default(mut self) -> Self {
        self.default = true;
        self
    }

    /// Scope to one container
    #[must_use]
    pub fn for_container(mut self, container: impl Into<String>) -> Self {
        self.container = Some(container.into());
        self
    }

    /// Add a property
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    /// Configured containers, in registration order
    pub containers: Vec<ContainerDef>,
    /// Configured protocol definitions
    pub protocols: Vec<ProtocolConfig>,
    /// Logging settings
    pub logging: LoggingConfig,
}

/// Registries built from configuration
#[derive(Debug, Default)]
pub struct Registries {
    /// Container registry
    pub containers: ContainerRegistry,
    /// Protocol registry
    pub protocols: ProtocolRegistry,
}

impl ScenarioConfig {
    /// Create empty configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a container
    #[must_use]
    pub fn with_container(mut self, container: ContainerDef) -> Self {
        self.containers.push(container);
        self
    }

    /// Add a protocol definition
    #[must_use]
    pub fn with_protocol(mut self, protocol: ProtocolConfig) -> Self {
        self.protocols.push(protocol);
        self
    }

    /// Set logging configuration
    #[must_use]
    pub fn with_logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = logging;
        self
    }

    /// Parse TOML configuration
    ///
    /// # Errors
    ///
    /// Returns error on malformed TOML.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Parse YAML configuration
    ///
    /// # Errors
    ///
    /// Returns error on malformed YAML.
    pub fn from_yaml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(source)?)
    }

    /// Load configuration, choosing the format by file extension
    ///
    /// # Errors
    ///
    /// Returns error if the file can not be read, has an unknown extension,
    /// or does not parse.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let extension = path.extension().and_then(|ext| ext.to_str()).map(str::to_ascii_lowercase);
        let parse: fn(&str) -> Result<Self, ConfigError> = match extension.as_deref() {
            Some("toml") => Self::from_toml_str,
            Some("yaml" | "yml") => Self::from_yaml_str,
            _ => return Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        };
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        parse(&source)
    }

    /// Build both registries
    ///
    /// Every configured container is backed by `deployable`. Configured
    /// protocols are matched by name against `available`; available protocols
    /// with no global configuration are registered globally with empty
    /// properties and no default mark.
    ///
    /// # Errors
    ///
    /// Returns error on duplicate names, a configured protocol with no
    /// implementation, or a protocol scoped to an unknown container.
    pub fn populate(
        &self,
        deployable: &Arc<dyn DeployableContainer>,
        available: &[Arc<dyn Protocol>],
    ) -> Result<Registries, ConfigError> {
        let mut registries = Registries::default();
        for def in &self.containers {
            registries.containers.create(def.clone(), Arc::clone(deployable))?;
        }

        let mut configured_globally = BTreeSet::new();
        for config in &self.protocols {
            let protocol = available
                .iter()
                .find(|p| p.description().name() == config.name)
                .ok_or_else(|| ConfigError::UnknownProtocolType {
                    name: config.name.clone(),
                    available: available.iter().map(|p| p.description().name().to_string()).collect(),
                })?;
            let definition = ProtocolDefinition::new(Arc::clone(protocol), config.properties.clone(), config.default);
            match &config.container {
                Some(container) => {
                    if !registries.containers.contains(container) {
                        return Err(ConfigError::UnknownProtocolScope {
                            protocol: config.name.clone(),
                            container: container.clone(),
                        });
                    }
                    registries.protocols.add_container_protocol(container, definition)?;
                }
                None => {
                    configured_globally.insert(config.name.clone());
                    registries.protocols.add_protocol(definition)?;
                }
            }
        }

        for protocol in available {
            let name = protocol.description().name().to_string();
            if !configured_globally.contains(&name) {
                registries
                    .protocols
                    .add_protocol(ProtocolDefinition::new(Arc::clone(protocol), BTreeMap::new(), false))?;
            }
        }

        debug!(
            containers = registries.containers.len(),
            protocols = registries.protocols.len(),
            "populated registries from configuration"
        );
        Ok(registries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scenario_registry::{
        ContainerMode, DeploymentPackager, LibraryPackager, ProtocolDescription, RegistryError,
    };

    #[derive(Debug)]
    struct StubContainer;

    impl DeployableContainer for StubContainer {
        fn default_protocol(&self) -> ProtocolDescription {
            ProtocolDescription::new("servlet")
        }
    }

    #[derive(Debug)]
    struct Named(&'static str);

    impl Protocol for Named {
        fn description(&self) -> ProtocolDescription {
            ProtocolDescription::new(self.0)
        }

        fn packager(&self) -> Arc<dyn DeploymentPackager> {
            Arc::new(LibraryPackager::default())
        }
    }

    fn available() -> Vec<Arc<dyn Protocol>> {
        let servlet: Arc<dyn Protocol> = Arc::new(Named("servlet"));
        let jmx: Arc<dyn Protocol> = Arc::new(Named("jmx"));
        vec![servlet, jmx]
    }

    fn stub() -> Arc<dyn DeployableContainer> {
        Arc::new(StubContainer)
    }

    const TOML: &str = r#"
        [[containers]]
        name = "tomcat"
        default = true

        [[containers]]
        name = "custom"
        mode = "custom"

        [[protocols]]
        name = "servlet"
        default = true
        properties = { context = "/test" }

        [[protocols]]
        name = "jmx"
        container = "custom"

        [logging]
        level = "debug"
    "#;

    #[test]
    fn parses_toml() {
        let config = ScenarioConfig::from_toml_str(TOML).unwrap();
        assert_eq!(config.containers.len(), 2);
        assert_eq!(config.containers[1].mode, ContainerMode::Custom);
        assert!(config.containers[0].default);
        assert_eq!(config.protocols[0].properties.get("context").map(String::as_str), Some("/test"));
        assert_eq!(config.protocols[1].container.as_deref(), Some("custom"));
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn parses_yaml() {
        let yaml = "containers:\n  - name: tomcat\nprotocols:\n  - name: servlet\n    default: true\n";
        let config = ScenarioConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.containers[0].name, "tomcat");
        assert!(config.protocols[0].default);
        assert_eq!(config.logging, LoggingConfig::default());
    }

    #[test]
    fn populate_registers_configured_and_unconfigured_protocols() {
        let registries = ScenarioConfig::from_toml_str(TOML).unwrap().populate(&stub(), &available()).unwrap();
        assert_eq!(registries.containers.names(), vec!["tomcat", "custom"]);
        assert_eq!(
            registries.protocols.names(),
            vec!["servlet".to_string(), "jmx".to_string(), "jmx@custom".to_string()]
        );
        let servlet = registries.protocols.protocol_for("tomcat", "servlet").unwrap();
        assert!(servlet.is_default());
        assert_eq!(servlet.config().get("context").map(String::as_str), Some("/test"));
        assert!(registries.protocols.protocol_for("tomcat", "jmx").unwrap().config().is_empty());
    }

    #[test]
    fn populate_rejects_unavailable_protocol() {
        let config = ScenarioConfig::new()
            .with_container(ContainerDef::new("tomcat"))
            .with_protocol(ProtocolConfig::new("rmi"));
        let err = config.populate(&stub(), &available()).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownProtocolType { ref name, .. } if name == "rmi"));
        assert!(err.to_string().contains("[servlet, jmx]"));
    }

    #[test]
    fn populate_rejects_unknown_scope() {
        let config = ScenarioConfig::new()
            .with_container(ContainerDef::new("tomcat"))
            .with_protocol(ProtocolConfig::new("jmx").for_container("jetty"));
        let err = config.populate(&stub(), &available()).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownProtocolScope { .. }));
    }

    #[test]
    fn populate_rejects_duplicate_containers() {
        let config = ScenarioConfig::new()
            .with_container(ContainerDef::new("tomcat"))
            .with_container(ContainerDef::new("tomcat"));
        let err = config.populate(&stub(), &available()).unwrap_err();
        assert!(matches!(err, ConfigError::Registry(RegistryError::DuplicateContainer(_))));
    }

    #[test]
    fn from_path_picks_format_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let toml_path = dir.path().join("scenario.toml");
        std::fs::write(&toml_path, TOML).unwrap();
        assert_eq!(ScenarioConfig::from_path(&toml_path).unwrap().containers.len(), 2);

        let yaml_path = dir.path().join("scenario.yml");
        std::fs::write(&yaml_path, "containers:\n  - name: tomcat\n").unwrap();
        assert_eq!(ScenarioConfig::from_path(&yaml_path).unwrap().containers.len(), 1);

        let other = dir.path().join("scenario.ini");
        assert!(matches!(ScenarioConfig::from_path(&other), Err(ConfigError::UnsupportedFormat(_))));

        let missing = dir.path().join("missing.toml");
        assert!(matches!(ScenarioConfig::from_path(&missing), Err(ConfigError::Io { .. })));
    }
}
