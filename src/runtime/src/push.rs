//! Push orchestration.
//!
//! A push is a fixed sequence of steps, each awaited before the next one
//! starts. The first failing step ends the push; nothing done by earlier
//! steps is undone.

use std::sync::Arc;

use porter_core::error::{PorterError, Result, Step};
use porter_core::{ImageReference, ReferenceSyntax, RegistryEndpoint, TagSet};

use crate::auth::AuthorizationResolver;
use crate::request;
use crate::services::{AuthorizationGrant, EngineClient, RepositoryService, ResourceTagging};

/// What the push found and did to the target repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryState {
    /// The repository existed before this push, or was created by someone
    /// else while it ran
    pub exists: bool,
    /// Name returned by the registry when this push created it
    pub created_name: Option<String>,
}

/// Result of a successful push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushOutcome {
    /// Repository URI the image was pushed to
    pub uri: String,
    pub tag: String,
    /// Whether the local image was retagged before the transfer
    pub retagged: bool,
    pub repository: RepositoryState,
    /// Whether resource tags were applied to the repository
    pub tagged: bool,
}

/// Pushes one local image to the registry, creating its repository on
/// first use.
pub struct ImagePusher {
    auth: AuthorizationResolver,
    repositories: Arc<dyn RepositoryService>,
    tagging: Option<Arc<dyn ResourceTagging>>,
    engine: Arc<dyn EngineClient>,
}

impl ImagePusher {
    pub fn new(
        auth: AuthorizationResolver,
        repositories: Arc<dyn RepositoryService>,
        engine: Arc<dyn EngineClient>,
    ) -> Self {
        Self {
            auth,
            repositories,
            tagging: None,
            engine,
        }
    }

    /// Service used to apply `--resource-tags` to the repository.
    pub fn with_tagging(mut self, tagging: Arc<dyn ResourceTagging>) -> Self {
        self.tagging = Some(tagging);
        self
    }

    /// Check the arguments of a push without calling any service.
    pub fn validate(args: &[String]) -> Result<ImageReference> {
        let input = request::single_image(args, "push")?;
        request::parse_image(input, ReferenceSyntax::TagOnly)
    }

    /// Push the image named by the single entry of `args`.
    pub async fn push(&self, args: &[String], tags: &TagSet) -> Result<PushOutcome> {
        let input = request::single_image(args, "push")?;
        let reference = request::parse_image(input, ReferenceSyntax::TagOnly)?;
        let tag = reference.tag_or_default().to_string();

        let grant = self
            .auth
            .resolve(&reference)
            .await
            .map_err(|e| e.during(Step::Authorize))?;
        let uri = request::repository_uri(&grant.registry, &reference.repository);

        let retagged = self
            .retag(input, &reference, &uri, &tag)
            .await
            .map_err(|e| e.during(Step::Retag))?;

        let repository = self.ensure_repository(&reference.repository).await?;

        let tagged = self
            .tag_repository(&grant, &reference.repository, tags)
            .await
            .map_err(|e| e.during(Step::TagRepository))?;

        tracing::info!(uri = %uri, tag = %tag, "Pushing image");
        self.engine
            .push_image(&uri, &tag, &grant.registry, &grant.credential)
            .await
            .map_err(|e| e.during(Step::Transfer))?;
        tracing::info!(uri = %uri, tag = %tag, "Image pushed");

        Ok(PushOutcome {
            uri,
            tag,
            retagged,
            repository,
            tagged,
        })
    }

    /// Name the local image after its destination. Skipped when the input
    /// already carried a registry host; the local image is assumed to be
    /// tagged correctly in that case.
    async fn retag(
        &self,
        input: &str,
        reference: &ImageReference,
        uri: &str,
        tag: &str,
    ) -> Result<bool> {
        if reference.registry.is_some() {
            return Ok(false);
        }
        tracing::debug!(source = %input, target = %uri, tag = %tag, "Tagging local image");
        self.engine.tag_image(input, uri, tag).await?;
        Ok(true)
    }

    async fn ensure_repository(&self, name: &str) -> Result<RepositoryState> {
        let exists = self
            .repositories
            .repository_exists(name)
            .await
            .map_err(|e| e.during(Step::CheckRepository))?;
        if exists {
            tracing::debug!(repository = %name, "Repository exists");
            return Ok(RepositoryState {
                exists: true,
                created_name: None,
            });
        }

        tracing::info!(repository = %name, "Creating repository");
        match self.repositories.create_repository(name).await {
            Ok(created) => Ok(RepositoryState {
                exists: false,
                created_name: Some(created),
            }),
            Err(PorterError::RepositoryAlreadyExists(_)) => {
                tracing::warn!(repository = %name, "Repository was created concurrently, continuing");
                Ok(RepositoryState {
                    exists: true,
                    created_name: None,
                })
            }
            Err(e) => Err(e.during(Step::CreateRepository)),
        }
    }

    async fn tag_repository(
        &self,
        grant: &AuthorizationGrant,
        repository: &str,
        tags: &TagSet,
    ) -> Result<bool> {
        if tags.is_empty() {
            return Ok(false);
        }
        let tagging = self.tagging.as_ref().ok_or_else(|| {
            PorterError::Tagging("no tagging service is configured".to_string())
        })?;
        let endpoint = RegistryEndpoint::parse(&grant.registry).ok_or_else(|| {
            PorterError::Tagging(format!(
                "cannot derive a repository ARN from registry '{}'",
                grant.registry
            ))
        })?;
        let arn = endpoint.repository_arn(repository);

        tracing::debug!(arn = %arn, count = tags.len(), "Tagging repository");
        tagging.tag_resources(&[arn], tags).await?;
        Ok(true)
    }
}
