//! `ecr-porter images` command.

use clap::Args;
use porter_core::PorterConfig;
use porter_runtime::{ImageFilter, TagStatus};

use super::Services;
use crate::lister::{ImageLister, ListMode};

#[derive(Args)]
pub struct ImagesArgs {
    /// Repositories to list (default: every repository in the registry)
    #[arg(value_name = "REPOSITORY")]
    pub repositories: Vec<String>,

    /// Only images with at least one tag
    #[arg(long, conflicts_with = "untagged")]
    pub tagged: bool,

    /// Only images without tags
    #[arg(long)]
    pub untagged: bool,

    /// Registry (account) id to list instead of the caller's account
    #[arg(long, value_name = "ID")]
    pub registry_id: Option<String>,

    /// Only show image digests
    #[arg(short, long)]
    pub quiet: bool,

    /// Format output using placeholders: {{.Repository}}, {{.Tag}}, {{.Digest}},
    /// {{.Pushed}}, {{.Size}}
    #[arg(long, conflicts_with = "quiet")]
    pub format: Option<String>,
}

impl ImagesArgs {
    fn filter(&self, config: &PorterConfig) -> ImageFilter {
        let tag_status = if self.tagged {
            TagStatus::Tagged
        } else if self.untagged {
            TagStatus::Untagged
        } else {
            TagStatus::Any
        };
        ImageFilter {
            repository_names: self.repositories.clone(),
            registry_id: config.registry_id.clone(),
            tag_status,
        }
    }

    fn mode(&self) -> ListMode {
        match self.format {
            Some(ref template) => ListMode::Format(template.clone()),
            None if self.quiet => ListMode::Quiet,
            None => ListMode::Table,
        }
    }
}

pub async fn execute(
    args: ImagesArgs,
    config: &PorterConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let filter = args.filter(config);
    let services = Services::load(config).await;

    let stdout = std::io::stdout();
    let mut sink = stdout.lock();
    ImageLister::new(services.registry.as_ref(), args.mode())
        .list(&filter, &mut sink)
        .await?;
    Ok(())
}
