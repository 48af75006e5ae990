//! Testable archive packaging
//!
//! A protocol's [`DeploymentPackager`] combines the processed application
//! archive with the auxiliary archives into the archive that is actually
//! deployed for in-container testing.

use crate::error::PackagingError;
use scenario_archive::{Archive, ArchiveKind};
use std::sync::Arc;

/// Input handed to a packager
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestDeployment {
    deployment_name: String,
    application: Archive,
    auxiliaries: Vec<Archive>,
}

impl TestDeployment {
    /// Create packaging input
    #[must_use]
    pub fn new(deployment_name: impl Into<String>, application: Archive, auxiliaries: Vec<Archive>) -> Self {
        Self {
            deployment_name: deployment_name.into(),
            application,
            auxiliaries,
        }
    }

    /// Name of the originating deployment
    #[inline]
    #[must_use]
    pub fn deployment_name(&self) -> &str {
        &self.deployment_name
    }

    /// Processed application archive
    #[inline]
    #[must_use]
    pub fn application_archive(&self) -> &Archive {
        &self.application
    }

    /// Processed auxiliary archives
    #[inline]
    #[must_use]
    pub fn auxiliary_archives(&self) -> &[Archive] {
        &self.auxiliaries
    }
}

/// Last-chance hook over the packaged testable archive
pub trait ProtocolArchiveProcessor: Send + Sync + std::fmt::Debug {
    /// Inspect or mutate the packaged archive
    ///
    /// # Errors
    /// Returns error to abort packaging
    fn process(&self, deployment: &TestDeployment, archive: &mut Archive) -> Result<(), PackagingError>;
}

/// Builds the testable archive for a protocol
pub trait DeploymentPackager: Send + Sync + std::fmt::Debug {
    /// Package `deployment`, then run every processor over the result
    ///
    /// # Errors
    /// Returns error if packaging or any processor fails
    fn generate_deployment(
        &self,
        deployment: &TestDeployment,
        processors: &[Arc<dyn ProtocolArchiveProcessor>],
    ) -> Result<Archive, PackagingError>;
}

/// Packager that bundles auxiliary archives as libraries
///
/// - Web and enterprise applications receive the auxiliary archives in their
///   library directory.
/// - A plain Java archive is wrapped into a web archive together with the
///   auxiliary archives.
/// - Other kinds receive the auxiliary archives at their root.
#[derive(Debug, Clone)]
pub struct LibraryPackager {
    wrapper_name: String,
}

impl LibraryPackager {
    /// Name of the web archive that wraps plain Java archives
    pub const DEFAULT_WRAPPER_NAME: &'static str = "test.war";

    /// Create packager with a custom wrapper archive name
    #[inline]
    #[must_use]
    pub fn with_wrapper_name(name: impl Into<String>) -> Self {
        Self {
            wrapper_name: name.into(),
        }
    }
}

impl Default for LibraryPackager {
    fn default() -> Self {
        Self::with_wrapper_name(Self::DEFAULT_WRAPPER_NAME)
    }
}

impl DeploymentPackager for LibraryPackager {
    fn generate_deployment(
        &self,
        deployment: &TestDeployment,
        processors: &[Arc<dyn ProtocolArchiveProcessor>],
    ) -> Result<Archive, PackagingError> {
        let application = deployment.application_archive();
        let mut archive = if application.kind() == ArchiveKind::Java {
            let mut wrapper = Archive::new(ArchiveKind::Web, self.wrapper_name.clone());
            wrapper.add_archive("WEB-INF/lib", application.clone())?;
            wrapper
        } else {
            application.clone()
        };

        let library_dir = archive.kind().library_dir().unwrap_or("/");
        for auxiliary in deployment.auxiliary_archives() {
            archive.add_archive(library_dir, auxiliary.clone())?;
        }

        for processor in processors {
            processor.process(deployment, &mut archive)?;
        }

        tracing::debug!(
            deployment = deployment.deployment_name(),
            archive = archive.name(),
            hash = %archive.content_hash().short(),
            "packaged testable archive"
        );
        Ok(archive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Marker;

    impl ProtocolArchiveProcessor for Marker {
        fn process(&self, deployment: &TestDeployment, archive: &mut Archive) -> Result<(), PackagingError> {
            archive.add("META-INF/deployment.txt", deployment.deployment_name())?;
            Ok(())
        }
    }

    #[derive(Debug)]
    struct Rejecting;

    impl ProtocolArchiveProcessor for Rejecting {
        fn process(&self, _deployment: &TestDeployment, _archive: &mut Archive) -> Result<(), PackagingError> {
            Err(PackagingError::Processor {
                processor: "rejecting".into(),
                message: "no".into(),
            })
        }
    }

    fn aux() -> Vec<Archive> {
        vec![Archive::new(ArchiveKind::Java, "arquillian-core.jar")]
    }

    #[test]
    fn wraps_java_archive_into_war() {
        let deployment = TestDeployment::new("_DEFAULT_", Archive::new(ArchiveKind::Java, "app.jar"), aux());
        let packaged = LibraryPackager::default()
            .generate_deployment(&deployment, &[])
            .unwrap();

        assert_eq!(packaged.name(), "test.war");
        assert_eq!(packaged.kind(), ArchiveKind::Web);
        assert!(packaged.contains("WEB-INF/lib/app.jar"));
        assert!(packaged.contains("WEB-INF/lib/arquillian-core.jar"));
    }

    #[test]
    fn enterprise_archive_keeps_identity() {
        let deployment = TestDeployment::new("ear", Archive::new(ArchiveKind::Enterprise, "app.ear"), aux());
        let packaged = LibraryPackager::default()
            .generate_deployment(&deployment, &[])
            .unwrap();

        assert_eq!(packaged.name(), "app.ear");
        assert!(packaged.contains("lib/arquillian-core.jar"));
    }

    #[test]
    fn resource_adapter_gets_auxiliaries_at_root() {
        let deployment = TestDeployment::new("rar", Archive::new(ArchiveKind::ResourceAdapter, "app.rar"), aux());
        let packaged = LibraryPackager::default()
            .generate_deployment(&deployment, &[])
            .unwrap();
        assert!(packaged.contains("arquillian-core.jar"));
    }

    #[test]
    fn runs_processors_in_order_and_stops_on_error() {
        let deployment = TestDeployment::new("web", Archive::new(ArchiveKind::Web, "app.war"), Vec::new());
        let ok: Vec<Arc<dyn ProtocolArchiveProcessor>> = vec![Arc::new(Marker)];
        let packaged = LibraryPackager::default().generate_deployment(&deployment, &ok).unwrap();
        assert_eq!(packaged.get("META-INF/deployment.txt"), Some(&b"web"[..]));

        let failing: Vec<Arc<dyn ProtocolArchiveProcessor>> = vec![Arc::new(Rejecting), Arc::new(Marker)];
        let err = LibraryPackager::default()
            .generate_deployment(&deployment, &failing)
            .unwrap_err();
        assert!(matches!(err, PackagingError::Processor { .. }));
    }

    #[test]
    fn duplicate_auxiliary_names_fail() {
        let mut auxiliaries = aux();
        auxiliaries.extend(aux());
        let deployment = TestDeployment::new("web", Archive::new(ArchiveKind::Web, "app.war"), auxiliaries);
        let err = LibraryPackager::default()
            .generate_deployment(&deployment, &[])
            .unwrap_err();
        assert!(matches!(err, PackagingError::Archive(_)));
    }
}
