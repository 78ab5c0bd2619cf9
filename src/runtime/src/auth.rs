//! Registry authorization resolution.
//!
//! Turns a parsed reference into an [`AuthorizationGrant`] without the
//! caller having to know its account. A reference that names a registry
//! host is authorized against that host directly; otherwise the caller's
//! account is looked up first.

use std::sync::Arc;

use porter_core::error::Result;
use porter_core::ImageReference;

use crate::services::{AccountIdentity, AuthorizationGrant, RegistryAuth};

/// Which registry a grant is requested for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthScope {
    /// The reference named this registry host.
    HostScoped(String),
    /// The default registry of an account; the caller's own account when
    /// no registry id was configured.
    AccountScoped { registry_id: Option<String> },
}

impl AuthScope {
    pub fn for_reference(reference: &ImageReference, registry_id: Option<&str>) -> Self {
        match reference.registry {
            Some(ref host) => AuthScope::HostScoped(host.clone()),
            None => AuthScope::AccountScoped {
                registry_id: registry_id.map(str::to_string),
            },
        }
    }
}

/// Resolves authorization grants. Failures from either service are
/// returned unchanged and never retried.
#[derive(Clone)]
pub struct AuthorizationResolver {
    identity: Arc<dyn AccountIdentity>,
    registry: Arc<dyn RegistryAuth>,
    registry_id: Option<String>,
}

impl AuthorizationResolver {
    pub fn new(identity: Arc<dyn AccountIdentity>, registry: Arc<dyn RegistryAuth>) -> Self {
        Self {
            identity,
            registry,
            registry_id: None,
        }
    }

    /// Use `registry_id` instead of looking up the caller's account.
    pub fn with_registry_id(mut self, registry_id: Option<String>) -> Self {
        self.registry_id = registry_id;
        self
    }

    pub fn scope_for(&self, reference: &ImageReference) -> AuthScope {
        AuthScope::for_reference(reference, self.registry_id.as_deref())
    }

    pub async fn resolve(&self, reference: &ImageReference) -> Result<AuthorizationGrant> {
        self.resolve_scope(&self.scope_for(reference)).await
    }

    pub async fn resolve_scope(&self, scope: &AuthScope) -> Result<AuthorizationGrant> {
        match scope {
            AuthScope::HostScoped(host) => {
                tracing::debug!(registry = %host, "Requesting token for registry host");
                self.registry.authorization_token(host).await
            }
            AuthScope::AccountScoped {
                registry_id: Some(account_id),
            } => {
                tracing::debug!(account = %account_id, "Requesting token for configured registry");
                self.registry.authorization_token_for_account(account_id).await
            }
            AuthScope::AccountScoped { registry_id: None } => {
                let account_id = self.identity.account_id().await?;
                tracing::debug!(account = %account_id, "Requesting token for caller account");
                self.registry.authorization_token_for_account(&account_id).await
            }
        }
    }
}
