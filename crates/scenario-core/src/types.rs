//! Declaration types produced by extraction
//!
//! A [`DeploymentDeclaration`] is the raw, unresolved description of one
//! deployment attached to a [`TestClass`]. Declarations are plain data; the
//! resolver consumes them by value and never mutates them in place.

use scenario_archive::Archive;
use scenario_registry::ProtocolDescription;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Name given to a deployment declared without one
pub const DEFAULT_DEPLOYMENT_NAME: &str = "_DEFAULT_";

/// Opaque handle identifying a test class
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TestClass {
    name: String,
}

impl TestClass {
    /// Create handle from a fully qualified name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Fully qualified name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name without package or module prefix
    #[must_use]
    pub fn simple_name(&self) -> &str {
        self.name
            .rsplit(|c: char| c == '.' || c == ':')
            .next()
            .unwrap_or(&self.name)
    }
}

impl Display for TestClass {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Named configuration descriptor deployed as-is
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Descriptor {
    /// Descriptor file name
    pub name: String,
    /// Raw descriptor body
    pub content: String,
}

impl Descriptor {
    /// Create descriptor
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

/// Deployable payload of a declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DeploymentContent {
    /// Application archive, eligible for processing when testable
    Archive(Archive),
    /// Descriptor, never processed
    Descriptor(Descriptor),
}

impl DeploymentContent {
    /// Archive or descriptor name
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Archive(archive) => archive.name(),
            Self::Descriptor(descriptor) => &descriptor.name,
        }
    }

    /// Check if content is an archive
    #[inline]
    #[must_use]
    pub fn is_archive(&self) -> bool {
        matches!(self, Self::Archive(_))
    }

    /// Archive, if content is one
    #[must_use]
    pub fn as_archive(&self) -> Option<&Archive> {
        match self {
            Self::Archive(archive) => Some(archive),
            Self::Descriptor(_) => None,
        }
    }

    pub(crate) fn as_archive_mut(&mut self) -> Option<&mut Archive> {
        match self {
            Self::Archive(archive) => Some(archive),
            Self::Descriptor(_) => None,
        }
    }
}

/// Unresolved deployment declaration
///
/// `target` and `protocol` are symbolic references; `None` means "use the
/// default". Build with [`DeploymentDeclaration::archive`] or
/// [`DeploymentDeclaration::descriptor`] and the `with_*` methods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentDeclaration {
    /// Deployment name, unique within a scenario
    pub name: String,
    /// Target container qualifier
    pub target: Option<String>,
    /// Protocol reference
    pub protocol: Option<ProtocolDescription>,
    /// Whether the framework deploys it automatically
    pub managed: bool,
    /// Whether test code runs inside it
    pub testable: bool,
    /// Deployment order among managed deployments
    pub order: i32,
    /// Failure the deployment is expected to raise
    pub expected_error: Option<String>,
    /// Payload
    pub content: DeploymentContent,
}

impl DeploymentDeclaration {
    /// Declare an archive deployment with defaults
    #[must_use]
    pub fn archive(archive: Archive) -> Self {
        Self::with_content(DeploymentContent::Archive(archive))
    }

    /// Declare a descriptor deployment with defaults; descriptors are never testable
    #[must_use]
    pub fn descriptor(descriptor: Descriptor) -> Self {
        let mut declaration = Self::with_content(DeploymentContent::Descriptor(descriptor));
        declaration.testable = false;
        declaration
    }

    fn with_content(content: DeploymentContent) -> Self {
        Self {
            name: DEFAULT_DEPLOYMENT_NAME.to_string(),
            target: None,
            protocol: None,
            managed: true,
            testable: true,
            order: 0,
            expected_error: None,
            content,
        }
    }

    /// Set deployment name
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set target container
    #[must_use]
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Set protocol reference
    #[must_use]
    pub fn with_protocol(mut self, protocol: impl Into<ProtocolDescription>) -> Self {
        self.protocol = Some(protocol.into());
        self
    }

    /// Set managed flag
    #[must_use]
    pub fn with_managed(mut self, managed: bool) -> Self {
        self.managed = managed;
        self
    }

    /// Set testable flag
    #[must_use]
    pub fn with_testable(mut self, testable: bool) -> Self {
        self.testable = testable;
        self
    }

    /// Set deployment order
    #[must_use]
    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    /// Expect deployment to fail; such deployments are never testable
    #[must_use]
    pub fn with_expected_error(mut self, error: impl Into<String>) -> Self {
        self.expected_error = Some(error.into());
        self.testable = false;
        self
    }

    /// Target qualifier, treating `_DEFAULT_` as absent
    #[must_use]
    pub fn target_name(&self) -> Option<&str> {
        self.target
            .as_deref()
            .filter(|target| *target != DEFAULT_DEPLOYMENT_NAME)
    }

    /// Protocol reference, treating `_DEFAULT_` as absent
    #[must_use]
    pub fn explicit_protocol(&self) -> Option<&ProtocolDescription> {
        self.protocol.as_ref().filter(|protocol| !protocol.is_default())
    }

    /// Effective testability: testable archive with no expected failure
    #[must_use]
    pub fn is_testable(&self) -> bool {
        self.testable && self.expected_error.is_none() && self.content.is_archive()
    }
}
