//! Collaborator interfaces consumed by the orchestrators.
//!
//! Each trait is a blocking request/response from the point of view of an
//! orchestration: the caller awaits it before starting the next step.
//! Timeouts and retries, if any, belong to the implementations.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use porter_core::error::Result;
use porter_core::{ImageSelector, TagSet};

/// Credential material handed to the local engine for one transfer.
#[derive(Clone, PartialEq, Eq)]
pub struct RegistryCredential {
    pub username: String,
    pub password: String,
    /// Registry address the credential is valid for (e.g. the proxy endpoint)
    pub server_address: String,
}

impl fmt::Debug for RegistryCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryCredential")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("server_address", &self.server_address)
            .finish()
    }
}

/// Authorization resolved for one registry interaction. Never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationGrant {
    /// Canonical registry address the grant is valid for
    pub registry: String,
    pub credential: RegistryCredential,
}

/// Looks up the caller's account.
#[async_trait]
pub trait AccountIdentity: Send + Sync {
    async fn account_id(&self) -> Result<String>;
}

/// Exchanges caller credentials for a registry authorization token.
#[async_trait]
pub trait RegistryAuth: Send + Sync {
    /// Token for an explicitly named registry host.
    async fn authorization_token(&self, registry: &str) -> Result<AuthorizationGrant>;

    /// Token for the default registry of an account.
    async fn authorization_token_for_account(&self, account_id: &str)
        -> Result<AuthorizationGrant>;
}

/// Repository management inside the registry.
///
/// Existence check and creation are separate calls; the registry offers no
/// atomic create-if-absent.
#[async_trait]
pub trait RepositoryService: Send + Sync {
    async fn repository_exists(&self, name: &str) -> Result<bool>;

    /// Create a repository and return its name. Fails with
    /// `PorterError::RepositoryAlreadyExists` when it already exists.
    async fn create_repository(&self, name: &str) -> Result<String>;
}

/// Applies key/value tags to registry resources.
#[async_trait]
pub trait ResourceTagging: Send + Sync {
    async fn tag_resources(&self, resource_arns: &[String], tags: &TagSet) -> Result<()>;
}

/// The local container engine.
#[async_trait]
pub trait EngineClient: Send + Sync {
    /// Tag local image `source` as `target_uri:tag`.
    async fn tag_image(&self, source: &str, target_uri: &str, tag: &str) -> Result<()>;

    async fn push_image(
        &self,
        target_uri: &str,
        tag: &str,
        registry: &str,
        credential: &RegistryCredential,
    ) -> Result<()>;

    async fn pull_image(
        &self,
        target_uri: &str,
        selector: &ImageSelector,
        credential: &RegistryCredential,
    ) -> Result<()>;
}

/// One image held in the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageDetail {
    pub digest: String,
    pub repository: String,
    pub pushed_at: Option<DateTime<Utc>>,
    pub size_bytes: Option<u64>,
    pub tags: Vec<String>,
}

/// Which images to list by tag status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TagStatus {
    #[default]
    Any,
    Tagged,
    Untagged,
}

/// Listing filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageFilter {
    /// Repositories to list; empty means every repository in the registry
    pub repository_names: Vec<String>,
    /// Registry (account) id; defaults to the caller's registry
    pub registry_id: Option<String>,
    pub tag_status: TagStatus,
}

/// Finite, non-restartable sequence of result pages.
pub type ImagePages<'a> = BoxStream<'a, Result<Vec<ImageDetail>>>;

/// Registry image listing.
pub trait RegistryImages: Send + Sync {
    /// Stream the images matching `filter`, one page at a time. Pages are
    /// fetched lazily as the stream is polled.
    fn images<'a>(&'a self, filter: &'a ImageFilter) -> ImagePages<'a>;
}
