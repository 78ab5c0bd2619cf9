//! ecr-porter core - foundational types shared by the runtime and the CLI.
//!
//! This crate holds everything that can be decided from user input alone:
//! image reference parsing, the registry endpoint grammar, resource tag
//! sets, configuration and the error taxonomy.

pub mod config;
pub mod endpoint;
pub mod error;
pub mod reference;
pub mod tags;

// Re-export commonly used types
pub use config::{ConfigOverrides, DockerConfig, LogLevel, PorterConfig};
pub use endpoint::RegistryEndpoint;
pub use error::{PorterError, Result, Step};
pub use reference::{ImageReference, ImageSelector, ReferenceError, ReferenceSyntax};
pub use tags::TagSet;

/// ecr-porter version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
