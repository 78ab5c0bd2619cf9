//! Amazon ECR client: authorization tokens, repositories and image listing.

use async_trait::async_trait;
use aws_config::{Region, SdkConfig};
use aws_sdk_ecr::error::DisplayErrorContext;
use aws_sdk_ecr::types::{DescribeImagesFilter, TagStatus as EcrTagStatus};
use base64::Engine;
use chrono::DateTime;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use porter_core::endpoint::strip_scheme;
use porter_core::error::{PorterError, Result};
use porter_core::RegistryEndpoint;

use crate::services::{
    AuthorizationGrant, ImageDetail, ImageFilter, ImagePages, RegistryAuth, RegistryCredential,
    RegistryImages, RepositoryService, TagStatus,
};

/// Position in a paginated listing.
enum Cursor {
    Start,
    Next(String),
    Done,
}

impl Cursor {
    fn after(next_token: Option<&str>) -> Self {
        match next_token {
            Some(token) => Cursor::Next(token.to_string()),
            None => Cursor::Done,
        }
    }
}

/// ECR API client.
///
/// Repository operations and listing run against the configured region
/// and registry id (the caller's default registry when unset).
pub struct EcrRegistry {
    sdk_config: SdkConfig,
    client: aws_sdk_ecr::Client,
    registry_id: Option<String>,
}

impl EcrRegistry {
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self {
            sdk_config: sdk_config.clone(),
            client: aws_sdk_ecr::Client::new(sdk_config),
            registry_id: None,
        }
    }

    pub fn with_registry_id(mut self, registry_id: Option<String>) -> Self {
        self.registry_id = registry_id;
        self
    }

    /// Client pinned to the region and endpoint family of `endpoint`.
    fn client_for(&self, endpoint: &RegistryEndpoint) -> aws_sdk_ecr::Client {
        let config = aws_sdk_ecr::config::Builder::from(&self.sdk_config)
            .region(Region::new(endpoint.region.clone()))
            .use_fips(endpoint.fips)
            .build();
        aws_sdk_ecr::Client::from_conf(config)
    }

    async fn request_token(
        client: &aws_sdk_ecr::Client,
        registry_id: &str,
        label: &str,
    ) -> Result<AuthorizationGrant> {
        let authorization_error = |message: String| PorterError::Authorization {
            registry: label.to_string(),
            message,
        };

        let output = client
            .get_authorization_token()
            .registry_ids(registry_id)
            .send()
            .await
            .map_err(|e| authorization_error(DisplayErrorContext(e).to_string()))?;

        let data = output
            .authorization_data()
            .first()
            .ok_or_else(|| authorization_error("no authorization data returned".to_string()))?;
        let token = data
            .authorization_token()
            .ok_or_else(|| authorization_error("authorization token missing".to_string()))?;
        let proxy_endpoint = data
            .proxy_endpoint()
            .ok_or_else(|| authorization_error("proxy endpoint missing".to_string()))?;

        let (username, password) = decode_token(token).map_err(authorization_error)?;
        tracing::debug!(registry = %proxy_endpoint, "Obtained registry token");

        Ok(AuthorizationGrant {
            registry: strip_scheme(proxy_endpoint).to_string(),
            credential: RegistryCredential {
                username,
                password,
                server_address: proxy_endpoint.to_string(),
            },
        })
    }

    /// Names of every repository in the registry, fetched page by page.
    fn repository_names(&self, registry_id: Option<String>) -> BoxStream<'_, Result<String>> {
        stream::try_unfold(Cursor::Start, move |cursor| {
            let registry_id = registry_id.clone();
            async move {
                let token = match cursor {
                    Cursor::Done => return Ok(None),
                    Cursor::Start => None,
                    Cursor::Next(token) => Some(token),
                };
                let output = self
                    .client
                    .describe_repositories()
                    .set_registry_id(registry_id)
                    .set_next_token(token)
                    .send()
                    .await
                    .map_err(|e| {
                        PorterError::Registry(format!(
                            "failed to list repositories: {}",
                            DisplayErrorContext(e)
                        ))
                    })?;

                let names: Vec<String> = output
                    .repositories()
                    .iter()
                    .filter_map(|r| r.repository_name())
                    .map(str::to_string)
                    .collect();
                Ok::<_, PorterError>(Some((names, Cursor::after(output.next_token()))))
            }
        })
        .map_ok(|names| stream::iter(names.into_iter().map(Ok::<_, PorterError>)))
        .try_flatten()
        .boxed()
    }

    /// Image pages of one repository.
    fn image_pages<'a>(
        &'a self,
        repository: String,
        registry_id: Option<String>,
        tag_status: TagStatus,
    ) -> ImagePages<'a> {
        stream::try_unfold(Cursor::Start, move |cursor| {
            let repository = repository.clone();
            let registry_id = registry_id.clone();
            async move {
                let token = match cursor {
                    Cursor::Done => return Ok(None),
                    Cursor::Start => None,
                    Cursor::Next(token) => Some(token),
                };
                let output = self
                    .client
                    .describe_images()
                    .repository_name(&repository)
                    .set_registry_id(registry_id)
                    .set_filter(describe_filter(tag_status))
                    .set_next_token(token)
                    .send()
                    .await
                    .map_err(|e| {
                        PorterError::Registry(format!(
                            "failed to list images in '{}': {}",
                            repository,
                            DisplayErrorContext(e)
                        ))
                    })?;

                tracing::debug!(
                    repository = %repository,
                    count = output.image_details().len(),
                    "Fetched image page"
                );
                let page: Vec<ImageDetail> =
                    output.image_details().iter().map(image_detail).collect();
                Ok::<_, PorterError>(Some((page, Cursor::after(output.next_token()))))
            }
        })
        .boxed()
    }
}

#[async_trait]
impl RegistryAuth for EcrRegistry {
    async fn authorization_token(&self, registry: &str) -> Result<AuthorizationGrant> {
        let endpoint =
            RegistryEndpoint::parse(registry).ok_or_else(|| PorterError::Authorization {
                registry: registry.to_string(),
                message: "not a registry endpoint".to_string(),
            })?;
        let client = self.client_for(&endpoint);
        Self::request_token(&client, &endpoint.account_id, registry).await
    }

    async fn authorization_token_for_account(
        &self,
        account_id: &str,
    ) -> Result<AuthorizationGrant> {
        Self::request_token(&self.client, account_id, account_id).await
    }
}

#[async_trait]
impl RepositoryService for EcrRegistry {
    async fn repository_exists(&self, name: &str) -> Result<bool> {
        let result = self
            .client
            .describe_repositories()
            .repository_names(name)
            .set_registry_id(self.registry_id.clone())
            .send()
            .await;

        match result {
            Ok(output) => Ok(!output.repositories().is_empty()),
            Err(e)
                if e
                    .as_service_error()
                    .is_some_and(|se| se.is_repository_not_found_exception()) =>
            {
                Ok(false)
            }
            Err(e) => Err(PorterError::Repository {
                repository: name.to_string(),
                message: DisplayErrorContext(e).to_string(),
            }),
        }
    }

    async fn create_repository(&self, name: &str) -> Result<String> {
        let result = self
            .client
            .create_repository()
            .repository_name(name)
            .set_registry_id(self.registry_id.clone())
            .send()
            .await;

        match result {
            Ok(output) => Ok(output
                .repository()
                .and_then(|r| r.repository_name())
                .unwrap_or(name)
                .to_string()),
            Err(e)
                if e
                    .as_service_error()
                    .is_some_and(|se| se.is_repository_already_exists_exception()) =>
            {
                Err(PorterError::RepositoryAlreadyExists(name.to_string()))
            }
            Err(e) => Err(PorterError::Repository {
                repository: name.to_string(),
                message: DisplayErrorContext(e).to_string(),
            }),
        }
    }
}

impl RegistryImages for EcrRegistry {
    fn images<'a>(&'a self, filter: &'a ImageFilter) -> ImagePages<'a> {
        let registry_id = filter.registry_id.clone().or_else(|| self.registry_id.clone());
        let names = if filter.repository_names.is_empty() {
            self.repository_names(registry_id.clone())
        } else {
            stream::iter(filter.repository_names.clone().into_iter().map(Ok::<_, PorterError>))
                .boxed()
        };

        names
            .map_ok(move |name| self.image_pages(name, registry_id.clone(), filter.tag_status))
            .try_flatten()
            .boxed()
    }
}

/// Split a base64 `user:password` token.
fn decode_token(token: &str) -> std::result::Result<(String, String), String> {
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(token)
        .map_err(|e| format!("invalid authorization token: {}", e))?;
    let decoded =
        String::from_utf8(decoded).map_err(|_| "authorization token is not UTF-8".to_string())?;
    match decoded.split_once(':') {
        Some((username, password)) => Ok((username.to_string(), password.to_string())),
        None => Err("authorization token is not in user:password form".to_string()),
    }
}

fn describe_filter(tag_status: TagStatus) -> Option<DescribeImagesFilter> {
    let status = match tag_status {
        TagStatus::Any => return None,
        TagStatus::Tagged => EcrTagStatus::Tagged,
        TagStatus::Untagged => EcrTagStatus::Untagged,
    };
    Some(DescribeImagesFilter::builder().tag_status(status).build())
}

fn image_detail(detail: &aws_sdk_ecr::types::ImageDetail) -> ImageDetail {
    ImageDetail {
        digest: detail.image_digest().unwrap_or_default().to_string(),
        repository: detail.repository_name().unwrap_or_default().to_string(),
        pushed_at: detail
            .image_pushed_at()
            .and_then(|t| DateTime::from_timestamp(t.secs(), t.subsec_nanos())),
        size_bytes: detail
            .image_size_in_bytes()
            .and_then(|size| u64::try_from(size).ok()),
        tags: detail.image_tags().to_vec(),
    }
}
