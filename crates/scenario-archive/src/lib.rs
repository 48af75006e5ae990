//! Scenario Archive Model
//!
//! In-memory archives that deployment processing stages build and mutate.
//!
//! # Core Concepts
//!
//! - [`Archive`]: Named, typed tree of byte entries and nested archives
//! - [`ArchiveKind`]: Jar / war / ear / rar, with library directory rules
//! - [`ArchivePath`]: Normalized absolute location inside an archive
//! - [`ContentHash`]: Blake3 digest for structural comparison
//! - [`ArchiveFactory`]: Seam through which stages create new archives
//!
//! # Example
//!
//! ```rust,ignore
//! use scenario_archive::{Archive, ArchiveKind};
//!
//! let mut app = Archive::new(ArchiveKind::Web, "app.war");
//! app.add("WEB-INF/web.xml", "<web-app/>")?;
//! println!("Hash: {}", app.content_hash().short());
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod archive;
mod factory;
mod kind;
mod path;

pub use archive::{Archive, ArchiveError, ContentHash};
pub use factory::{ArchiveFactory, InMemoryArchiveFactory};
pub use kind::ArchiveKind;
pub use path::{ArchivePath, PathError};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
