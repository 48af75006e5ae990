//! Binds declarations to registered containers and protocols

use crate::error::ValidationError;
use crate::scenario::ResolvedDeployment;
use crate::types::{DeploymentDeclaration, DEFAULT_DEPLOYMENT_NAME};
use scenario_registry::{Container, ContainerRegistry, LookupError, ProtocolDefinition, ProtocolRegistry};
use std::sync::Arc;
use tracing::debug;

/// Resolves symbolic container and protocol references
///
/// Resolution is pure with respect to the registries; the only side effect is
/// the container implementation consulted by default-protocol fallback.
#[derive(Debug, Clone, Copy)]
pub struct ReferenceResolver<'a> {
    containers: &'a ContainerRegistry,
    protocols: &'a ProtocolRegistry,
}

impl<'a> ReferenceResolver<'a> {
    /// Create resolver over the given registries
    #[must_use]
    pub fn new(containers: &'a ContainerRegistry, protocols: &'a ProtocolRegistry) -> Self {
        Self { containers, protocols }
    }

    /// Resolve one declaration
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when the target or protocol can not be
    /// resolved, or a managed deployment targets a `custom` container.
    pub fn resolve(&self, declaration: DeploymentDeclaration) -> Result<ResolvedDeployment, ValidationError> {
        let container = self.resolve_container(&declaration)?;

        let protocol = if container.mode().is_custom() {
            if declaration.managed {
                return Err(ValidationError::ManagedOnCustomContainer {
                    deployment: declaration.name.clone(),
                    container: container.name().to_string(),
                });
            }
            debug!(
                deployment = %declaration.name,
                container = container.name(),
                "unmanaged deployment on custom container, skipping protocol resolution"
            );
            None
        } else {
            self.resolve_protocol(&declaration, &container)?
        };

        debug!(
            deployment = %declaration.name,
            container = container.name(),
            protocol = protocol.as_ref().map_or("none", ProtocolDefinition::name),
            "resolved deployment"
        );
        Ok(ResolvedDeployment::new(declaration, container, protocol))
    }

    fn resolve_container(&self, declaration: &DeploymentDeclaration) -> Result<Arc<Container>, ValidationError> {
        let target = declaration.target_name();
        if self.containers.is_empty() {
            return Err(ValidationError::NoContainers {
                target: target.unwrap_or(DEFAULT_DEPLOYMENT_NAME).to_string(),
            });
        }

        if let Some(target) = target {
            return self
                .containers
                .get_container(target)
                .map_err(|_| ValidationError::UnknownContainer {
                    deployment: declaration.name.clone(),
                    target: target.to_string(),
                    available: self.available_containers(),
                });
        }

        let mut all = self.containers.containers();
        if self.containers.len() == 1 {
            if let Some(only) = all.next() {
                return Ok(Arc::clone(only));
            }
        }
        let defaults: Vec<&Arc<Container>> = all.filter(|c| c.is_default()).collect();
        match defaults.as_slice() {
            [only] => Ok(Arc::clone(only)),
            _ => Err(ValidationError::AmbiguousContainer {
                deployment: declaration.name.clone(),
                available: self.available_containers(),
            }),
        }
    }

    fn resolve_protocol(
        &self,
        declaration: &DeploymentDeclaration,
        container: &Container,
    ) -> Result<Option<ProtocolDefinition>, ValidationError> {
        if let Some(explicit) = declaration.explicit_protocol() {
            return self
                .protocols
                .protocol_for(container.name(), explicit.name())
                .map(|definition| Some(definition.clone()))
                .map_err(|_| ValidationError::UnknownProtocol {
                    deployment: declaration.name.clone(),
                    container: container.name().to_string(),
                    protocol: explicit.name().to_string(),
                    available: self
                        .protocols
                        .protocols_for(container.name())
                        .into_iter()
                        .map(|d| d.name().to_string())
                        .collect(),
                });
        }

        if !declaration.is_testable() {
            return Ok(None);
        }

        match self.protocols.default_protocol(container) {
            Ok(definition) => Ok(Some(definition.clone())),
            Err(LookupError::Ambiguous(source)) => Err(ValidationError::AmbiguousProtocol {
                deployment: declaration.name.clone(),
                source,
            }),
            Err(LookupError::NotFound(source)) => Err(ValidationError::NotFound {
                deployment: declaration.name.clone(),
                container: container.name().to_string(),
                source,
            }),
        }
    }

    fn available_containers(&self) -> Vec<String> {
        self.containers.names().into_iter().map(str::to_string).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scenario_archive::{Archive, ArchiveKind};
    use scenario_registry::{
        ContainerDef, ContainerMode, DeployableContainer, DeploymentPackager, LibraryPackager, Protocol,
        ProtocolDescription,
    };
    use std::collections::BTreeMap;

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

    fn registries(containers: &[ContainerDef], protocols: &[(&'static str, bool)]) -> (ContainerRegistry, ProtocolRegistry) {
        let mut container_registry = ContainerRegistry::new();
        for def in containers {
            container_registry.create(def.clone(), Arc::new(StubContainer)).unwrap();
        }
        let mut protocol_registry = ProtocolRegistry::new();
        for (name, default) in protocols {
            protocol_registry
                .add_protocol(ProtocolDefinition::new(Arc::new(Named(name)), BTreeMap::new(), *default))
                .unwrap();
        }
        (container_registry, protocol_registry)
    }

    fn declaration() -> DeploymentDeclaration {
        DeploymentDeclaration::archive(Archive::new(ArchiveKind::Java, "test.jar"))
    }

    #[test]
    fn single_container_is_default_target() {
        let (containers, protocols) = registries(&[ContainerDef::new("tomcat")], &[("local", false)]);
        let resolved = ReferenceResolver::new(&containers, &protocols).resolve(declaration()).unwrap();
        assert_eq!(resolved.container().name(), "tomcat");
        assert_eq!(resolved.protocol().map(ProtocolDefinition::name), Some("local"));
    }

    #[test]
    fn marked_default_container_wins() {
        let (containers, protocols) = registries(
            &[ContainerDef::new("tomcat"), ContainerDef::new("jetty").as_default()],
            &[("local", false)],
        );
        let resolved = ReferenceResolver::new(&containers, &protocols).resolve(declaration()).unwrap();
        assert_eq!(resolved.container().name(), "jetty");
    }

    #[test]
    fn unmarked_containers_are_ambiguous() {
        let (containers, protocols) =
            registries(&[ContainerDef::new("tomcat"), ContainerDef::new("jetty")], &[("local", false)]);
        let err = ReferenceResolver::new(&containers, &protocols).resolve(declaration()).unwrap_err();
        assert!(matches!(err, ValidationError::AmbiguousContainer { .. }));
        assert!(err.to_string().contains("tomcat, jetty"));
    }

    #[test]
    fn empty_registry_asks_for_a_container() {
        let (containers, protocols) = registries(&[], &[]);
        let err = ReferenceResolver::new(&containers, &protocols)
            .resolve(declaration().with_target("tomcat"))
            .unwrap_err();
        assert_eq!(err, ValidationError::NoContainers { target: "tomcat".into() });
    }

    #[test]
    fn non_testable_without_protocol_skips_resolution() {
        let (containers, protocols) = registries(&[ContainerDef::new("tomcat")], &[]);
        let resolved = ReferenceResolver::new(&containers, &protocols)
            .resolve(declaration().with_testable(false))
            .unwrap();
        assert!(resolved.protocol().is_none());
    }

    #[test]
    fn explicit_protocol_is_checked_even_when_not_testable() {
        let (containers, protocols) = registries(&[ContainerDef::new("tomcat")], &[("local", false)]);
        let err = ReferenceResolver::new(&containers, &protocols)
            .resolve(declaration().with_testable(false).with_protocol("jmx"))
            .unwrap_err();
        assert!(err.to_string().contains("not maching any defined Protocol"));
        assert!(err.to_string().contains("[local]"));
    }

    #[test]
    fn unmanaged_on_custom_bypasses_protocols() {
        let (containers, protocols) =
            registries(&[ContainerDef::new("custom").with_mode(ContainerMode::Custom)], &[]);
        let resolved = ReferenceResolver::new(&containers, &protocols)
            .resolve(declaration().with_managed(false).with_protocol("jmx"))
            .unwrap();
        assert!(resolved.protocol().is_none());
    }

    #[test]
    fn ambiguous_default_protocol_is_validation_error() {
        let (containers, protocols) = registries(&[ContainerDef::new("tomcat")], &[("a", true), ("b", true)]);
        let err = ReferenceResolver::new(&containers, &protocols).resolve(declaration()).unwrap_err();
        assert!(err.is_ambiguous_protocol());
    }
}
