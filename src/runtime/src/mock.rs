//! Recording test double for every collaborator trait.

use std::collections::HashSet;

use async_trait::async_trait;
use parking_lot::Mutex;
use porter_core::error::{PorterError, Result};
use porter_core::{ImageSelector, TagSet};

use crate::services::{
    AccountIdentity, AuthorizationGrant, EngineClient, RegistryAuth, RegistryCredential,
    RepositoryService, ResourceTagging,
};

pub(crate) const ACCOUNT_ID: &str = "012345678912";
pub(crate) const REGISTRY: &str = "https://012345678912.dkr.ecr.us-west-2.amazonaws.com";

/// Records every call in order and fails the calls it was told to fail.
pub(crate) struct MockRegistry {
    calls: Mutex<Vec<String>>,
    failing: HashSet<&'static str>,
    repository_exists: bool,
    create_conflict: bool,
}

impl MockRegistry {
    pub(crate) fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failing: HashSet::new(),
            repository_exists: false,
            create_conflict: false,
        }
    }

    /// Make the named trait method return an error.
    pub(crate) fn failing(mut self, method: &'static str) -> Self {
        self.failing.insert(method);
        self
    }

    pub(crate) fn with_existing_repository(mut self) -> Self {
        self.repository_exists = true;
        self
    }

    /// Simulate another actor creating the repository between check and create.
    pub(crate) fn with_create_conflict(mut self) -> Self {
        self.create_conflict = true;
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn record(&self, method: &'static str, call: String) -> bool {
        self.calls.lock().push(call);
        self.failing.contains(method)
    }

    fn grant() -> AuthorizationGrant {
        AuthorizationGrant {
            registry: REGISTRY.to_string(),
            credential: RegistryCredential {
                username: "AWS".to_string(),
                password: "token".to_string(),
                server_address: REGISTRY.to_string(),
            },
        }
    }
}

#[async_trait]
impl AccountIdentity for MockRegistry {
    async fn account_id(&self) -> Result<String> {
        if self.record("account_id", "account_id".to_string()) {
            return Err(PorterError::Identity("something failed".to_string()));
        }
        Ok(ACCOUNT_ID.to_string())
    }
}

#[async_trait]
impl RegistryAuth for MockRegistry {
    async fn authorization_token(&self, registry: &str) -> Result<AuthorizationGrant> {
        if self.record(
            "authorization_token",
            format!("authorization_token({registry})"),
        ) {
            return Err(PorterError::Authorization {
                registry: registry.to_string(),
                message: "something failed".to_string(),
            });
        }
        Ok(Self::grant())
    }

    async fn authorization_token_for_account(
        &self,
        account_id: &str,
    ) -> Result<AuthorizationGrant> {
        if self.record(
            "authorization_token_for_account",
            format!("authorization_token_for_account({account_id})"),
        ) {
            return Err(PorterError::Authorization {
                registry: account_id.to_string(),
                message: "something failed".to_string(),
            });
        }
        Ok(Self::grant())
    }
}

#[async_trait]
impl RepositoryService for MockRegistry {
    async fn repository_exists(&self, name: &str) -> Result<bool> {
        if self.record("repository_exists", format!("repository_exists({name})")) {
            return Err(PorterError::Repository {
                repository: name.to_string(),
                message: "something failed".to_string(),
            });
        }
        Ok(self.repository_exists)
    }

    async fn create_repository(&self, name: &str) -> Result<String> {
        if self.record("create_repository", format!("create_repository({name})")) {
            return Err(PorterError::Repository {
                repository: name.to_string(),
                message: "something failed".to_string(),
            });
        }
        if self.create_conflict {
            return Err(PorterError::RepositoryAlreadyExists(name.to_string()));
        }
        Ok(name.to_string())
    }
}

#[async_trait]
impl ResourceTagging for MockRegistry {
    async fn tag_resources(&self, resource_arns: &[String], tags: &TagSet) -> Result<()> {
        let tags: Vec<String> = tags.iter().map(|(k, v)| format!("{k}={v}")).collect();
        let call = format!(
            "tag_resources({}; {})",
            resource_arns.join(","),
            tags.join(",")
        );
        if self.record("tag_resources", call) {
            return Err(PorterError::Tagging("something failed".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl EngineClient for MockRegistry {
    async fn tag_image(&self, source: &str, target_uri: &str, tag: &str) -> Result<()> {
        if self.record("tag_image", format!("tag_image({source}, {target_uri}, {tag})")) {
            return Err(PorterError::Engine {
                command: "docker tag".to_string(),
                message: "something failed".to_string(),
            });
        }
        Ok(())
    }

    async fn push_image(
        &self,
        target_uri: &str,
        tag: &str,
        registry: &str,
        credential: &RegistryCredential,
    ) -> Result<()> {
        assert_eq!(credential, &Self::grant().credential);
        if self.record(
            "push_image",
            format!("push_image({target_uri}, {tag}, {registry})"),
        ) {
            return Err(PorterError::Engine {
                command: "docker push".to_string(),
                message: "something failed".to_string(),
            });
        }
        Ok(())
    }

    async fn pull_image(
        &self,
        target_uri: &str,
        selector: &ImageSelector,
        credential: &RegistryCredential,
    ) -> Result<()> {
        assert_eq!(credential, &Self::grant().credential);
        if self.record("pull_image", format!("pull_image({target_uri}, {selector})")) {
            return Err(PorterError::Engine {
                command: "docker pull".to_string(),
                message: "something failed".to_string(),
            });
        }
        Ok(())
    }
}
