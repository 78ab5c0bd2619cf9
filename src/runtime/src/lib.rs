//! ecr-porter runtime - registry authorization and push/pull orchestration.
//!
//! The orchestrators only talk to the collaborator traits in [`services`];
//! [`aws`] and [`engine`] hold the implementations used by the CLI.

#![allow(clippy::result_large_err)]

pub mod auth;
pub mod aws;
pub mod engine;
pub mod pull;
pub mod push;
pub mod services;

mod request;

#[cfg(test)]
mod mock;

// Re-export common types
pub use auth::{AuthScope, AuthorizationResolver};
pub use aws::{load_sdk_config, EcrRegistry, StsIdentity, TaggingClient};
pub use engine::DockerCli;
pub use pull::{ImagePuller, PullOutcome};
pub use push::{ImagePusher, PushOutcome, RepositoryState};
pub use services::{
    AccountIdentity, AuthorizationGrant, EngineClient, ImageDetail, ImageFilter, ImagePages,
    RegistryAuth, RegistryCredential, RegistryImages, RepositoryService, ResourceTagging,
    TagStatus,
};

/// ecr-porter runtime version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
