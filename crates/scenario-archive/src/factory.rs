//! Archive creation seam
//!
//! Processing stages create auxiliary archives through an [`ArchiveFactory`]
//! rather than constructing them directly, so the archive builder can be
//! swapped without touching stage code.

use crate::archive::{Archive, ArchiveError};
use crate::kind::ArchiveKind;

/// Creates empty archives by kind and name
pub trait ArchiveFactory: Send + Sync + std::fmt::Debug {
    /// Create an empty archive
    ///
    /// # Errors
    /// Returns error if `name` is not a valid archive name
    fn create(&self, kind: ArchiveKind, name: &str) -> Result<Archive, ArchiveError>;
}

/// Factory producing plain in-memory archives
///
/// Names without an extension get the kind's extension appended
/// (`"aux"` → `"aux.jar"`).
#[derive(Debug, Default, Clone, Copy)]
pub struct InMemoryArchiveFactory;

impl ArchiveFactory for InMemoryArchiveFactory {
    fn create(&self, kind: ArchiveKind, name: &str) -> Result<Archive, ArchiveError> {
        if name.is_empty() || name.contains(['/', '\\']) {
            return Err(ArchiveError::InvalidName(name.to_string()));
        }
        let name = if name.contains('.') {
            name.to_string()
        } else {
            format!("{name}.{}", kind.extension())
        };
        Ok(Archive::new(kind, name))
    }
}
