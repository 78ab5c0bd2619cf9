//! AWS-backed implementations of the registry, identity and tagging
//! services.

mod ecr;
mod sts;
mod tagging;

pub use ecr::EcrRegistry;
pub use sts::StsIdentity;
pub use tagging::TaggingClient;

use aws_config::{BehaviorVersion, Region, SdkConfig};

/// Load shared SDK configuration. `region` and `profile` override what the
/// default provider chain finds in the environment and `~/.aws`.
pub async fn load_sdk_config(region: Option<&str>, profile: Option<&str>) -> SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(region) = region {
        loader = loader.region(Region::new(region.to_string()));
    }
    if let Some(profile) = profile {
        loader = loader.profile_name(profile);
    }
    loader.load().await
}

/// Region field of an ARN (`arn:partition:service:region:account:resource`).
pub(crate) fn arn_region(arn: &str) -> Option<&str> {
    let mut parts = arn.splitn(6, ':');
    if parts.next() != Some("arn") {
        return None;
    }
    parts.nth(2).filter(|region| !region.is_empty())
}
