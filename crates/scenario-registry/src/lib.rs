//! Scenario Registries
//!
//! Configured containers and protocol definitions that deployment
//! declarations are resolved against.
//!
//! # Core Concepts
//!
//! - [`ContainerRegistry`]: Named execution containers, registration ordered
//! - [`ProtocolRegistry`]: Protocol definitions, global or container scoped,
//!   with default-protocol selection
//! - [`DeployableContainer`]: Capabilities reported by a container implementation
//! - [`DeploymentPackager`]: Protocol-specific testable archive packaging
//!
//! Registries are populated through `&mut self` at startup and then shared
//! read-only (typically behind an `Arc`).

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod container;
mod error;
mod packager;
mod protocol;

pub use container::{
    Container, ContainerDef, ContainerMode, ContainerRegistry, DeployableContainer, ParseModeError,
};
pub use error::{
    AmbiguousProtocolError, LookupError, NotFoundError, PackagingError, RegistryError, RegistryKind,
};
pub use packager::{DeploymentPackager, LibraryPackager, ProtocolArchiveProcessor, TestDeployment};
pub use protocol::{Protocol, ProtocolDefinition, ProtocolDescription, ProtocolRegistry, ProtocolScope};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
