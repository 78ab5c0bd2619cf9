//! CLI command definitions and dispatch.

mod images;
mod pull;
mod push;

use std::path::PathBuf;
use std::sync::Arc;

use aws_config::SdkConfig;
use clap::{Args, Parser, Subcommand};
use porter_core::{ConfigOverrides, PorterConfig};
use porter_runtime::{AuthorizationResolver, DockerCli, EcrRegistry, StsIdentity};

/// ecr-porter - move container images between the local engine and Amazon ECR.
#[derive(Parser)]
#[command(name = "ecr-porter", version, about)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Flags accepted by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// AWS region for account-scoped registry calls
    #[arg(long, global = true, value_name = "REGION")]
    pub region: Option<String>,

    /// Named AWS credentials profile
    #[arg(long, global = true, value_name = "PROFILE")]
    pub aws_profile: Option<String>,

    /// Config file (default: ~/.ecr-porter/config.yaml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Available commands.
#[derive(Subcommand)]
pub enum Command {
    /// Push a local image, creating its repository if needed
    Push(push::PushArgs),
    /// Pull an image into the local engine
    Pull(pull::PullArgs),
    /// List images held in the registry
    Images(images::ImagesArgs),
}

impl Command {
    fn registry_id(&self) -> Option<&String> {
        match self {
            Command::Push(args) => args.registry_id.as_ref(),
            Command::Pull(args) => args.registry_id.as_ref(),
            Command::Images(args) => args.registry_id.as_ref(),
        }
    }
}

impl Cli {
    /// Configuration values given on the command line.
    pub fn config_overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            region: self.global.region.clone(),
            aws_profile: self.global.aws_profile.clone(),
            registry_id: self.command.registry_id().cloned(),
        }
    }

    /// Config file, environment and flags merged.
    pub fn resolve_config(&self) -> porter_core::Result<PorterConfig> {
        PorterConfig::resolve(self.global.config.as_deref(), self.config_overrides())
    }
}

/// AWS-backed services shared by the commands.
pub(crate) struct Services {
    pub sdk_config: SdkConfig,
    pub registry: Arc<EcrRegistry>,
}

impl Services {
    pub(crate) async fn load(config: &PorterConfig) -> Self {
        let sdk_config = porter_runtime::load_sdk_config(
            config.region.as_deref(),
            config.aws_profile.as_deref(),
        )
        .await;
        let registry =
            Arc::new(EcrRegistry::new(&sdk_config).with_registry_id(config.registry_id.clone()));
        Self {
            sdk_config,
            registry,
        }
    }

    pub(crate) fn resolver(&self, config: &PorterConfig) -> AuthorizationResolver {
        AuthorizationResolver::new(
            Arc::new(StsIdentity::new(&self.sdk_config)),
            self.registry.clone(),
        )
        .with_registry_id(config.registry_id.clone())
    }

    pub(crate) fn engine(config: &PorterConfig) -> Arc<DockerCli> {
        Arc::new(DockerCli::new(config.docker.binary.as_str()))
    }
}

/// Dispatch a parsed CLI to the appropriate command handler.
pub async fn dispatch(cli: Cli, config: PorterConfig) -> Result<(), Box<dyn std::error::Error>> {
    tracing::debug!(
        region = ?config.region,
        profile = ?config.aws_profile,
        registry_id = ?config.registry_id,
        "Resolved configuration"
    );
    match cli.command {
        Command::Push(args) => push::execute(args, &config).await,
        Command::Pull(args) => pull::execute(args, &config).await,
        Command::Images(args) => images::execute(args, &config).await,
    }
}
