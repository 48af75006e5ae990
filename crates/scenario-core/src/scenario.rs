//! Resolved deployments and the scenario that holds them
//!
//! [`ScenarioBuilder`] accumulates [`ResolvedDeployment`]s, rejecting
//! duplicates as they arrive. [`DeploymentScenario`] is the immutable result.

use crate::error::ValidationError;
use crate::types::{DeploymentContent, DeploymentDeclaration};
use scenario_archive::Archive;
use scenario_registry::{Container, ProtocolDefinition, ProtocolDescription};
use std::sync::Arc;

/// Declaration bound to a concrete container and protocol
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDeployment {
    declaration: DeploymentDeclaration,
    container: Arc<Container>,
    protocol: Option<ProtocolDefinition>,
    auxiliary_archives: Vec<Archive>,
    testable_archive: Option<Archive>,
}

impl ResolvedDeployment {
    pub(crate) fn new(
        declaration: DeploymentDeclaration,
        container: Arc<Container>,
        protocol: Option<ProtocolDefinition>,
    ) -> Self {
        Self {
            declaration,
            container,
            protocol,
            auxiliary_archives: Vec::new(),
            testable_archive: None,
        }
    }

    /// Deployment name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.declaration.name
    }

    /// Declaration this deployment was resolved from
    #[inline]
    #[must_use]
    pub fn declaration(&self) -> &DeploymentDeclaration {
        &self.declaration
    }

    /// Target container
    #[inline]
    #[must_use]
    pub fn container(&self) -> &Arc<Container> {
        &self.container
    }

    /// Resolved protocol; `None` for non-testable and custom unmanaged deployments
    #[inline]
    #[must_use]
    pub fn protocol(&self) -> Option<&ProtocolDefinition> {
        self.protocol.as_ref()
    }

    /// Check if managed
    #[inline]
    #[must_use]
    pub fn is_managed(&self) -> bool {
        self.declaration.managed
    }

    /// Check if test code runs inside this deployment
    #[inline]
    #[must_use]
    pub fn is_testable(&self) -> bool {
        self.declaration.is_testable()
    }

    /// Deployment order
    #[inline]
    #[must_use]
    pub fn order(&self) -> i32 {
        self.declaration.order
    }

    /// Declared payload
    #[inline]
    #[must_use]
    pub fn content(&self) -> &DeploymentContent {
        &self.declaration.content
    }

    /// Application archive after application processing
    #[must_use]
    pub fn application_archive(&self) -> Option<&Archive> {
        self.declaration.content.as_archive()
    }

    /// Auxiliary archives contributed by appenders
    #[inline]
    #[must_use]
    pub fn auxiliary_archives(&self) -> &[Archive] {
        &self.auxiliary_archives
    }

    /// Archive produced by the protocol packager
    #[inline]
    #[must_use]
    pub fn testable_archive(&self) -> Option<&Archive> {
        self.testable_archive.as_ref()
    }

    /// Check if the pipeline has run for this deployment
    #[inline]
    #[must_use]
    pub fn is_processed(&self) -> bool {
        self.testable_archive.is_some()
    }

    /// Application archive and protocol when the pipeline must run
    pub(crate) fn processing_parts(&mut self) -> Option<(&mut Archive, &ProtocolDefinition)> {
        if !self.declaration.is_testable() {
            return None;
        }
        let protocol = self.protocol.as_ref()?;
        let application = self.declaration.content.as_archive_mut()?;
        Some((application, protocol))
    }

    pub(crate) fn set_processed(&mut self, auxiliary_archives: Vec<Archive>, testable_archive: Archive) {
        self.auxiliary_archives = auxiliary_archives;
        self.testable_archive = Some(testable_archive);
    }
}

/// Accumulates resolved deployments for one test class
#[derive(Debug, Default)]
pub struct ScenarioBuilder {
    deployments: Vec<ResolvedDeployment>,
}

impl ScenarioBuilder {
    /// Create empty builder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resolved deployment
    ///
    /// # Errors
    ///
    /// Returns error if the name is already taken, or if an archive of the
    /// same name already targets the same container.
    pub fn add(&mut self, deployment: ResolvedDeployment) -> Result<&mut Self, ValidationError> {
        if self.deployments.iter().any(|d| d.name() == deployment.name()) {
            return Err(ValidationError::DuplicateDeploymentName(deployment.name().to_string()));
        }
        if let Some(archive) = deployment.application_archive() {
            let clash = self.deployments.iter().any(|d| {
                d.container().name() == deployment.container().name()
                    && d.application_archive().is_some_and(|a| a.name() == archive.name())
            });
            if clash {
                return Err(ValidationError::DuplicateArchiveOnTarget {
                    deployment: deployment.name().to_string(),
                    archive: archive.name().to_string(),
                    container: deployment.container().name().to_string(),
                });
            }
        }
        self.deployments.push(deployment);
        Ok(self)
    }

    /// Number of deployments added
    #[must_use]
    pub fn len(&self) -> usize {
        self.deployments.len()
    }

    /// Check if nothing was added
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.deployments.is_empty()
    }

    pub(crate) fn deployments_mut(&mut self) -> &mut [ResolvedDeployment] {
        &mut self.deployments
    }

    /// Finish the scenario
    #[must_use]
    pub fn build(self) -> DeploymentScenario {
        DeploymentScenario {
            deployments: self.deployments,
        }
    }
}

/// Immutable, fully validated deployment scenario of one test class
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeploymentScenario {
    deployments: Vec<ResolvedDeployment>,
}

impl DeploymentScenario {
    /// Deployments in declaration order
    #[inline]
    #[must_use]
    pub fn deployments(&self) -> &[ResolvedDeployment] {
        &self.deployments
    }

    /// Deployment by name
    #[must_use]
    pub fn deployment(&self, name: &str) -> Option<&ResolvedDeployment> {
        self.deployments.iter().find(|d| d.name() == name)
    }

    /// Distinct target containers, first use first
    #[must_use]
    pub fn targets(&self) -> Vec<&Arc<Container>> {
        let mut targets: Vec<&Arc<Container>> = Vec::new();
        for deployment in &self.deployments {
            if !targets.iter().any(|c| c.name() == deployment.container().name()) {
                targets.push(deployment.container());
            }
        }
        targets
    }

    /// Distinct resolved protocols, first use first
    #[must_use]
    pub fn protocols(&self) -> Vec<&ProtocolDescription> {
        let mut protocols: Vec<&ProtocolDescription> = Vec::new();
        for description in self.deployments.iter().filter_map(|d| d.protocol()).map(ProtocolDefinition::description) {
            if !protocols.contains(&description) {
                protocols.push(description);
            }
        }
        protocols
    }

    /// Deployments targeting `container`
    pub fn deployments_for<'a>(&'a self, container: &'a str) -> impl Iterator<Item = &'a ResolvedDeployment> + 'a {
        self.deployments.iter().filter(move |d| d.container().name() == container)
    }

    /// Managed deployments sorted by order; ties keep declaration order
    #[must_use]
    pub fn managed_deployments_in_order(&self) -> Vec<&ResolvedDeployment> {
        let mut managed: Vec<&ResolvedDeployment> = self.deployments.iter().filter(|d| d.is_managed()).collect();
        managed.sort_by_key(|d| d.order());
        managed
    }

    /// Testable deployments
    pub fn testable_deployments(&self) -> impl Iterator<Item = &ResolvedDeployment> {
        self.deployments.iter().filter(|d| d.is_testable())
    }

    /// Number of deployments
    #[must_use]
    pub fn len(&self) -> usize {
        self.deployments.len()
    }

    /// Check if the scenario has no deployments
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.deployments.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Descriptor;
    use scenario_archive::ArchiveKind;
    use scenario_registry::{ContainerDef, ContainerRegistry, DeployableContainer};

    #[derive(Debug)]
    struct StubContainer;

    impl DeployableContainer for StubContainer {
        fn default_protocol(&self) -> ProtocolDescription {
            ProtocolDescription::new("local")
        }
    }

    fn container(name: &str) -> Arc<Container> {
        let mut registry = ContainerRegistry::new();
        registry.create(ContainerDef::new(name), Arc::new(StubContainer)).unwrap()
    }

    fn resolved(name: &str, archive: &str, target: &str) -> ResolvedDeployment {
        let declaration =
            DeploymentDeclaration::archive(Archive::new(ArchiveKind::Java, archive)).with_name(name);
        ResolvedDeployment::new(declaration, container(target), None)
    }

    #[test]
    fn rejects_duplicate_names() {
        let mut builder = ScenarioBuilder::new();
        builder.add(resolved("a", "a.jar", "tomcat")).unwrap();
        let err = builder.add(resolved("a", "b.jar", "tomcat")).unwrap_err();
        assert_eq!(err, ValidationError::DuplicateDeploymentName("a".into()));
        assert_eq!(builder.len(), 1);
    }

    #[test]
    fn rejects_same_archive_on_same_target() {
        let mut builder = ScenarioBuilder::new();
        builder.add(resolved("a", "app.jar", "tomcat")).unwrap();
        let err = builder.add(resolved("b", "app.jar", "tomcat")).unwrap_err();
        assert!(matches!(err, ValidationError::DuplicateArchiveOnTarget { ref container, .. } if container == "tomcat"));
    }

    #[test]
    fn same_archive_on_different_targets_is_fine() {
        let mut builder = ScenarioBuilder::new();
        builder
            .add(resolved("a", "app.jar", "tomcat"))
            .unwrap()
            .add(resolved("b", "app.jar", "jetty"))
            .unwrap();
        let scenario = builder.build();
        assert_eq!(scenario.len(), 2);
        let targets: Vec<&str> = scenario.targets().iter().map(|c| c.name()).collect();
        assert_eq!(targets, vec!["tomcat", "jetty"]);
        assert_eq!(scenario.deployments_for("jetty").count(), 1);
    }

    #[test]
    fn descriptors_do_not_clash_on_archive_name() {
        let descriptor = DeploymentDeclaration::descriptor(Descriptor::new("app.jar", "")).with_name("ds");
        let mut builder = ScenarioBuilder::new();
        builder.add(resolved("a", "app.jar", "tomcat")).unwrap();
        builder
            .add(ResolvedDeployment::new(descriptor, container("tomcat"), None))
            .unwrap();
        assert_eq!(builder.len(), 2);
    }

    #[test]
    fn managed_order_is_stable() {
        let mk = |name: &str, order: i32, managed: bool| {
            let declaration = DeploymentDeclaration::archive(Archive::new(ArchiveKind::Java, format!("{name}.jar")))
                .with_name(name)
                .with_order(order)
                .with_managed(managed);
            ResolvedDeployment::new(declaration, container("tomcat"), None)
        };
        let mut builder = ScenarioBuilder::new();
        for deployment in [mk("c", 2, true), mk("a", 1, true), mk("u", 0, false), mk("b", 1, true)] {
            builder.add(deployment).unwrap();
        }
        let scenario = builder.build();
        let names: Vec<&str> = scenario.managed_deployments_in_order().iter().map(|d| d.name()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert!(scenario.deployment("u").is_some());
        assert!(scenario.deployment("missing").is_none());
    }

    #[test]
    fn unprocessed_deployment_has_no_parts_without_protocol() {
        let mut deployment = resolved("a", "a.jar", "tomcat");
        assert!(deployment.processing_parts().is_none());
        assert!(!deployment.is_processed());
    }
}
