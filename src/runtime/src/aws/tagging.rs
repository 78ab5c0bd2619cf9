use std::collections::HashMap;

use async_trait::async_trait;
use aws_config::{Region, SdkConfig};
use aws_sdk_resourcegroupstagging::error::DisplayErrorContext;
use porter_core::error::{PorterError, Result};
use porter_core::TagSet;

use super::arn_region;
use crate::services::ResourceTagging;

/// Resource Groups Tagging API client.
pub struct TaggingClient {
    sdk_config: SdkConfig,
}

impl TaggingClient {
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self {
            sdk_config: sdk_config.clone(),
        }
    }

    /// Tagging calls must go to the region the resources live in.
    fn client_for(&self, region: Option<&str>) -> aws_sdk_resourcegroupstagging::Client {
        let mut builder = aws_sdk_resourcegroupstagging::config::Builder::from(&self.sdk_config);
        if let Some(region) = region {
            builder = builder.region(Region::new(region.to_string()));
        }
        aws_sdk_resourcegroupstagging::Client::from_conf(builder.build())
    }
}

#[async_trait]
impl ResourceTagging for TaggingClient {
    async fn tag_resources(&self, resource_arns: &[String], tags: &TagSet) -> Result<()> {
        if resource_arns.is_empty() || tags.is_empty() {
            return Ok(());
        }

        let region = resource_arns.first().and_then(|arn| arn_region(arn));
        let tags: HashMap<String, String> = tags
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();

        let output = self
            .client_for(region)
            .tag_resources()
            .set_resource_arn_list(Some(resource_arns.to_vec()))
            .set_tags(Some(tags))
            .send()
            .await
            .map_err(|e| PorterError::Tagging(DisplayErrorContext(e).to_string()))?;

        if let Some(failed) = output.failed_resources_map().filter(|m| !m.is_empty()) {
            let mut failures: Vec<String> = failed
                .iter()
                .map(|(arn, info)| {
                    format!("{}: {}", arn, info.error_message().unwrap_or("unknown error"))
                })
                .collect();
            failures.sort();
            return Err(PorterError::Tagging(failures.join("; ")));
        }

        tracing::debug!(resources = resource_arns.len(), "Resources tagged");
        Ok(())
    }
}
