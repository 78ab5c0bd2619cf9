use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_sts::error::DisplayErrorContext;
use porter_core::error::{PorterError, Result};

use crate::services::AccountIdentity;

/// Caller identity from STS `GetCallerIdentity`.
pub struct StsIdentity {
    client: aws_sdk_sts::Client,
}

impl StsIdentity {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: aws_sdk_sts::Client::new(config),
        }
    }
}

#[async_trait]
impl AccountIdentity for StsIdentity {
    async fn account_id(&self) -> Result<String> {
        let output = self
            .client
            .get_caller_identity()
            .send()
            .await
            .map_err(|e| PorterError::Identity(DisplayErrorContext(e).to_string()))?;

        output
            .account()
            .map(str::to_string)
            .ok_or_else(|| PorterError::Identity("caller identity has no account".to_string()))
    }
}
