//! Archive kinds
//!
//! Each kind determines the file extension and the directory that holds
//! library archives when other archives are packaged into it.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Kind of deployable archive
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveKind {
    /// Plain library archive (`.jar`)
    Java,
    /// Web application archive (`.war`)
    Web,
    /// Enterprise application archive (`.ear`)
    Enterprise,
    /// Resource adapter archive (`.rar`)
    ResourceAdapter,
}

impl ArchiveKind {
    /// File extension without the dot
    #[inline]
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Java => "jar",
            Self::Web => "war",
            Self::Enterprise => "ear",
            Self::ResourceAdapter => "rar",
        }
    }

    /// Directory holding bundled library archives, if the kind has one
    #[inline]
    #[must_use]
    pub const fn library_dir(self) -> Option<&'static str> {
        match self {
            Self::Web => Some("WEB-INF/lib"),
            Self::Enterprise => Some("lib"),
            Self::Java | Self::ResourceAdapter => None,
        }
    }
}

impl Display for ArchiveKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}
