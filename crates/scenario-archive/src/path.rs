//! Paths for addressing entries within an archive
//!
//! Provides [`ArchivePath`], an absolute, normalized, `/`-separated location
//! inside an [`Archive`](crate::Archive).

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Absolute path within an archive
///
/// Always rendered with a leading `/`. Segments never contain `/` or `\`
/// and are never `.` or `..`.
///
/// # Examples
/// - `"WEB-INF/lib/aux.jar"` → `/WEB-INF/lib/aux.jar`
/// - `"/META-INF/beans.xml"` → `/META-INF/beans.xml`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ArchivePath(Vec<String>);

impl ArchivePath {
    /// Root of the archive (`/`)
    #[inline]
    #[must_use]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Check if path is the archive root
    #[inline]
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Append a relative path, returning a new path
    ///
    /// # Errors
    /// Returns error if `relative` contains an invalid segment
    pub fn join(&self, relative: &str) -> Result<Self, PathError> {
        let tail: Self = relative.parse()?;
        let mut joined = self.clone();
        joined.0.extend(tail.0);
        Ok(joined)
    }
}

impl Display for ArchivePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.0.join("/"))
    }
}

impl FromStr for ArchivePath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim_start_matches('/');
        if trimmed.is_empty() {
            return Ok(Self::root());
        }

        let segments = trimmed
            .trim_end_matches('/')
            .split('/')
            .map(|seg| match seg {
                "" => Err(PathError::EmptySegment(s.to_string())),
                "." | ".." => Err(PathError::RelativeSegment(s.to_string())),
                _ if seg.contains('\\') => Err(PathError::InvalidSegment(seg.to_string())),
                _ => Ok(seg.to_string()),
            })
            .collect::<Result<_, _>>()?;

        Ok(Self(segments))
    }
}

impl serde::Serialize for ArchivePath {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for ArchivePath {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Errors related to archive paths
#[derive(Debug, thiserror::Error)]
pub enum PathError {
    /// Empty segment in path (`a//b`)
    #[error("path '{0}' contains an empty segment")]
    EmptySegment(String),

    /// `.` or `..` segment
    #[error("path '{0}' contains a relative segment")]
    RelativeSegment(String),

    /// Segment with a backslash
    #[error("invalid path segment: {0}")]
    InvalidSegment(String),
}
