//! `ecr-porter pull` command.

use clap::Args;
use porter_core::PorterConfig;
use porter_runtime::ImagePuller;

use super::Services;

#[derive(Args)]
pub struct PullArgs {
    /// Image to pull: [REGISTRY_URI/]REPOSITORY[:TAG|@DIGEST]
    #[arg(value_name = "IMAGE")]
    pub images: Vec<String>,

    /// Registry (account) id to pull from instead of the caller's account
    #[arg(long, value_name = "ID")]
    pub registry_id: Option<String>,
}

pub async fn execute(
    args: PullArgs,
    config: &PorterConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    ImagePuller::validate(&args.images)?;
    let services = Services::load(config).await;
    let puller = ImagePuller::new(services.resolver(config), Services::engine(config));

    let outcome = puller.pull(&args.images).await?;
    println!("Pulled {}", outcome.image());
    Ok(())
}
