//! Pull orchestration.

use std::sync::Arc;

use porter_core::error::{Result, Step};
use porter_core::reference::DEFAULT_TAG;
use porter_core::{ImageReference, ImageSelector, ReferenceSyntax};

use crate::auth::AuthorizationResolver;
use crate::request;
use crate::services::EngineClient;

/// Result of a successful pull.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullOutcome {
    /// Repository URI the image was pulled from
    pub uri: String,
    pub selector: ImageSelector,
}

impl PullOutcome {
    /// Full image name as the engine stores it (`uri:tag` or `uri@digest`).
    pub fn image(&self) -> String {
        self.selector.apply_to(&self.uri)
    }
}

/// Pulls one image from the registry into the local engine.
pub struct ImagePuller {
    auth: AuthorizationResolver,
    engine: Arc<dyn EngineClient>,
}

impl ImagePuller {
    pub fn new(auth: AuthorizationResolver, engine: Arc<dyn EngineClient>) -> Self {
        Self { auth, engine }
    }

    /// Check the arguments of a pull without calling any service.
    pub fn validate(args: &[String]) -> Result<ImageReference> {
        let input = request::single_image(args, "pull")?;
        request::parse_image(input, ReferenceSyntax::TagOrDigest)
    }

    /// Pull the image named by the single entry of `args`. Pulling never
    /// checks for or creates the repository.
    pub async fn pull(&self, args: &[String]) -> Result<PullOutcome> {
        let reference = Self::validate(args)?;
        let selector = reference
            .selector()
            .unwrap_or_else(|| ImageSelector::Tag(DEFAULT_TAG.to_string()));

        let grant = self
            .auth
            .resolve(&reference)
            .await
            .map_err(|e| e.during(Step::Authorize))?;
        let uri = request::repository_uri(&grant.registry, &reference.repository);

        tracing::info!(uri = %uri, selector = %selector, "Pulling image");
        self.engine
            .pull_image(&uri, &selector, &grant.credential)
            .await
            .map_err(|e| e.during(Step::Transfer))?;

        Ok(PullOutcome { uri, selector })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockRegistry, ACCOUNT_ID, REGISTRY};
    use porter_core::{PorterError, ReferenceError};

    fn puller(mock: &Arc<MockRegistry>) -> ImagePuller {
        let auth = AuthorizationResolver::new(mock.clone(), mock.clone());
        ImagePuller::new(auth, mock.clone())
    }

    fn args(image: &str) -> Vec<String> {
        vec![image.to_string()]
    }

    #[tokio::test]
    async fn test_pull_by_tag() {
        let mock = Arc::new(MockRegistry::new());
        let outcome = puller(&mock).pull(&args("repository:v1")).await.unwrap();

        let uri = format!("{REGISTRY}/repository");
        assert_eq!(
            mock.calls(),
            vec![
                "account_id".to_string(),
                format!("authorization_token_for_account({ACCOUNT_ID})"),
                format!("pull_image({uri}, v1)"),
            ]
        );
        assert_eq!(outcome.image(), format!("{uri}:v1"));
    }

    #[tokio::test]
    async fn test_pull_by_digest() {
        let mock = Arc::new(MockRegistry::new());
        let digest = format!("sha256:{}", "b".repeat(64));
        let outcome = puller(&mock)
            .pull(&args(&format!("team/app@{digest}")))
            .await
            .unwrap();

        assert_eq!(outcome.selector, ImageSelector::Digest(digest.clone()));
        assert_eq!(outcome.image(), format!("{REGISTRY}/team/app@{digest}"));
    }

    #[tokio::test]
    async fn test_pull_defaults_to_latest() {
        let mock = Arc::new(MockRegistry::new());
        let outcome = puller(&mock).pull(&args("repository")).await.unwrap();

        assert_eq!(outcome.selector, ImageSelector::Tag("latest".to_string()));
    }

    #[tokio::test]
    async fn test_pull_with_host_never_touches_repositories() {
        let mock = Arc::new(MockRegistry::new());
        let host = "012345678912.dkr.ecr-fips.us-gov-west-1.amazonaws.com";
        puller(&mock)
            .pull(&args(&format!("{host}/repository:v1")))
            .await
            .unwrap();

        assert_eq!(
            mock.calls(),
            vec![
                format!("authorization_token({host})"),
                format!("pull_image({REGISTRY}/repository, v1)"),
            ]
        );
    }

    #[tokio::test]
    async fn test_pull_arity_errors_make_no_calls() {
        let mock = Arc::new(MockRegistry::new());
        let err = puller(&mock).pull(&[]).await.unwrap_err();
        assert!(matches!(err, PorterError::Usage(_)));

        let two = vec!["a".to_string(), "b".to_string()];
        let err = puller(&mock).pull(&two).await.unwrap_err();
        assert!(matches!(err, PorterError::Usage(_)));

        assert!(mock.calls().is_empty());
    }

    #[test]
    fn test_validate_without_services() {
        let two = vec!["a".to_string(), "b".to_string()];
        let err = ImagePuller::validate(&two).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Usage error: pull takes exactly one image argument, got 2"
        );
        assert!(ImagePuller::validate(&[format!("app@sha256:{}", "d".repeat(64))]).is_ok());
    }

    #[tokio::test]
    async fn test_pull_ambiguous_reference() {
        let mock = Arc::new(MockRegistry::new());
        let digest = format!("sha256:{}", "c".repeat(64));
        let err = puller(&mock)
            .pull(&args(&format!("repository:v1@{digest}")))
            .await
            .unwrap_err();

        match err {
            PorterError::Reference { source, format, .. } => {
                assert_eq!(source, ReferenceError::AmbiguousReference);
                assert_eq!(format, "[REGISTRY_URI/]REPOSITORY[:TAG|@DIGEST]");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn test_pull_transfer_failure() {
        let mock = Arc::new(MockRegistry::new().failing("pull_image"));
        let err = puller(&mock).pull(&args("repository:v1")).await.unwrap_err();

        assert_eq!(err.step(), Some(Step::Transfer));
        assert!(matches!(err.root(), PorterError::Engine { .. }));
    }
}
