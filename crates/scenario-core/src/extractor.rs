//! Declaration extraction seam

use crate::error::ExtractionError;
use crate::types::{DeploymentDeclaration, TestClass};

/// Produces the raw deployment declarations of a test class
///
/// Implementations must be deterministic: the same test class yields the
/// same declarations on every call. Closures of the matching shape implement
/// this trait directly.
pub trait DeclarationExtractor: Send + Sync {
    /// Extract declarations in declaration order
    ///
    /// # Errors
    ///
    /// Returns error if the declarations are malformed or an archive can
    /// not be built.
    fn extract(&self, test_class: &TestClass) -> Result<Vec<DeploymentDeclaration>, ExtractionError>;
}

impl<F> DeclarationExtractor for F
where
    F: Fn(&TestClass) -> Result<Vec<DeploymentDeclaration>, ExtractionError> + Send + Sync,
{
    fn extract(&self, test_class: &TestClass) -> Result<Vec<DeploymentDeclaration>, ExtractionError> {
        self(test_class)
    }
}
