//! Error types for the registries
//!
//! Provides error handling for:
//! - Registry population (duplicate names)
//! - Lookups (missing or ambiguous entries)
//! - Testable archive packaging

use crate::protocol::ProtocolScope;
use scenario_archive::ArchiveError;
use std::fmt::{self, Display, Formatter};

/// Errors raised while populating a registry
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// A container with the same name is already registered
    #[error("container '{0}' is already registered")]
    DuplicateContainer(String),

    /// A protocol with the same name is already registered in the scope
    #[error("protocol '{name}' is already registered in {scope}")]
    DuplicateProtocol {
        /// Protocol name
        name: String,
        /// Scope already holding the name
        scope: ProtocolScope,
    },
}

/// Which registry a lookup ran against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryKind {
    /// Container registry
    Container,
    /// Protocol registry
    Protocol,
}

impl Display for RegistryKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Container => f.write_str("container"),
            Self::Protocol => f.write_str("protocol"),
        }
    }
}

/// Registry lookup miss
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} '{name}' not found")]
pub struct NotFoundError {
    /// Registry searched
    pub kind: RegistryKind,
    /// Name looked up
    pub name: String,
}

impl NotFoundError {
    /// Missing container
    #[inline]
    pub fn container(name: impl Into<String>) -> Self {
        Self {
            kind: RegistryKind::Container,
            name: name.into(),
        }
    }

    /// Missing protocol
    #[inline]
    pub fn protocol(name: impl Into<String>) -> Self {
        Self {
            kind: RegistryKind::Protocol,
            name: name.into(),
        }
    }
}

/// More than one protocol definition qualifies and none can be preferred
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("ambiguous protocol for {scope}, candidates: [{}]", .candidates.join(", "))]
pub struct AmbiguousProtocolError {
    /// Scope in which the lookup ran
    pub scope: ProtocolScope,
    /// Names of the equally valid definitions
    pub candidates: Vec<String>,
}

/// Failed protocol lookup
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    /// Nothing matched
    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    /// Several definitions matched
    #[error(transparent)]
    Ambiguous(#[from] AmbiguousProtocolError),
}

/// Errors while packaging a testable archive
#[derive(Debug, thiserror::Error)]
pub enum PackagingError {
    /// Archive manipulation failed
    #[error("archive error: {0}")]
    Archive(#[from] ArchiveError),

    /// A protocol archive processor rejected the archive
    #[error("protocol archive processor '{processor}' failed: {message}")]
    Processor {
        /// Processor that failed
        processor: String,
        /// Failure reported by the processor
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display() {
        assert_eq!(
            NotFoundError::container("jboss").to_string(),
            "container 'jboss' not found"
        );
        assert_eq!(
            NotFoundError::protocol("Servlet 5.0").to_string(),
            "protocol 'Servlet 5.0' not found"
        );
    }

    #[test]
    fn ambiguous_display_lists_candidates() {
        let err = AmbiguousProtocolError {
            scope: ProtocolScope::Container("tomcat".into()),
            candidates: vec!["a".into(), "b".into()],
        };
        assert_eq!(
            err.to_string(),
            "ambiguous protocol for container 'tomcat', candidates: [a, b]"
        );
    }

    #[test]
    fn lookup_error_is_transparent() {
        let err: LookupError = NotFoundError::protocol("jmx").into();
        assert_eq!(err.to_string(), "protocol 'jmx' not found");
    }
}
