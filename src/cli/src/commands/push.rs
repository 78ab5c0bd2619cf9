//! `ecr-porter push` command.

use std::sync::Arc;

use clap::Args;
use porter_core::{PorterConfig, TagSet};
use porter_runtime::{ImagePusher, TaggingClient};

use super::Services;

#[derive(Args)]
pub struct PushArgs {
    /// Local image to push: [REGISTRY_URI/]REPOSITORY[:TAG]
    #[arg(value_name = "IMAGE")]
    pub images: Vec<String>,

    /// Tags for the repository, e.g. "team=infra,env=prod"
    #[arg(long, value_name = "KEY=VALUE,...")]
    pub resource_tags: Option<String>,

    /// Registry (account) id to push to instead of the caller's account
    #[arg(long, value_name = "ID")]
    pub registry_id: Option<String>,
}

pub async fn execute(
    args: PushArgs,
    config: &PorterConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    ImagePusher::validate(&args.images)?;
    let tags: TagSet = match args.resource_tags {
        Some(ref tags) => tags.parse()?,
        None => TagSet::new(),
    };

    let services = Services::load(config).await;
    let pusher = ImagePusher::new(
        services.resolver(config),
        services.registry.clone(),
        Services::engine(config),
    )
    .with_tagging(Arc::new(TaggingClient::new(&services.sdk_config)));

    let outcome = pusher.push(&args.images, &tags).await?;

    if let Some(ref name) = outcome.repository.created_name {
        println!("Created repository {name}");
    }
    println!("Pushed {}:{}", outcome.uri, outcome.tag);
    Ok(())
}
