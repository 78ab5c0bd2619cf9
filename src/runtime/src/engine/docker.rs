//! Docker CLI engine client.
//!
//! Every command runs the `docker` binary as a subprocess. Registry
//! credentials never touch the user's docker configuration: each transfer
//! gets a throwaway config directory holding only the grant, removed as
//! soon as the command exits.

use std::collections::BTreeMap;
use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use base64::Engine;
use porter_core::endpoint::strip_scheme;
use porter_core::error::{PorterError, Result};
use porter_core::ImageSelector;
use serde::Serialize;
use tokio::process::Command;

use crate::services::{EngineClient, RegistryCredential};

/// `config.json` understood by the docker CLI.
#[derive(Debug, Serialize)]
struct DockerConfigFile {
    auths: BTreeMap<String, DockerAuthEntry>,
}

#[derive(Debug, Serialize)]
struct DockerAuthEntry {
    auth: String,
}

/// Engine client backed by the docker CLI.
#[derive(Debug, Clone)]
pub struct DockerCli {
    binary: String,
}

impl DockerCli {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Run `docker [--config dir] args...`, streaming stdout to the
    /// terminal and keeping stderr for the error message.
    async fn run(&self, command: &str, args: &[&str], config_dir: Option<&Path>) -> Result<()> {
        let mut cmd = Command::new(&self.binary);
        if let Some(dir) = config_dir {
            cmd.arg("--config").arg(dir);
        }
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::piped());

        tracing::debug!(binary = %self.binary, args = ?args, "Running engine command");

        let child = cmd.spawn().map_err(|e| PorterError::Engine {
            command: command.to_string(),
            message: format!("failed to run {}: {}", self.binary, e),
        })?;
        let output = child.wait_with_output().await?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let message = match stderr.trim() {
            "" => format!("exited with {}", output.status),
            text => text.to_string(),
        };
        Err(PorterError::Engine {
            command: command.to_string(),
            message,
        })
    }

    /// Run a command that talks to the registry with `credential`.
    async fn run_authorized(
        &self,
        command: &str,
        args: &[&str],
        credential: &RegistryCredential,
    ) -> Result<()> {
        let config_dir = tempfile::Builder::new()
            .prefix("ecr-porter-docker-")
            .tempdir()?;
        write_credential_config(config_dir.path(), credential)?;

        self.run(command, args, Some(config_dir.path())).await
    }
}

#[async_trait]
impl EngineClient for DockerCli {
    async fn tag_image(&self, source: &str, target_uri: &str, tag: &str) -> Result<()> {
        let target = ImageSelector::Tag(tag.to_string()).apply_to(target_uri);
        self.run("docker tag", &["tag", source, &target], None).await
    }

    async fn push_image(
        &self,
        target_uri: &str,
        tag: &str,
        registry: &str,
        credential: &RegistryCredential,
    ) -> Result<()> {
        let target = ImageSelector::Tag(tag.to_string()).apply_to(target_uri);
        tracing::debug!(image = %target, registry = %registry, "docker push");
        self.run_authorized("docker push", &["push", &target], credential)
            .await
    }

    async fn pull_image(
        &self,
        target_uri: &str,
        selector: &ImageSelector,
        credential: &RegistryCredential,
    ) -> Result<()> {
        let image = selector.apply_to(target_uri);
        self.run_authorized("docker pull", &["pull", &image], credential)
            .await
    }
}

/// Write a `config.json` holding only `credential` into `dir`.
fn write_credential_config(dir: &Path, credential: &RegistryCredential) -> Result<()> {
    let auth = base64::engine::general_purpose::STANDARD
        .encode(format!("{}:{}", credential.username, credential.password));

    let mut auths = BTreeMap::new();
    auths.insert(
        strip_scheme(&credential.server_address)
            .trim_end_matches('/')
            .to_string(),
        DockerAuthEntry { auth },
    );

    let json = serde_json::to_string_pretty(&DockerConfigFile { auths })?;
    std::fs::write(dir.join("config.json"), json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn credential() -> RegistryCredential {
        RegistryCredential {
            username: "AWS".to_string(),
            password: "token".to_string(),
            server_address: "https://012345678912.dkr.ecr.us-west-2.amazonaws.com".to_string(),
        }
    }

    #[test]
    fn test_write_credential_config() {
        let dir = TempDir::new().unwrap();
        write_credential_config(dir.path(), &credential()).unwrap();

        let content = std::fs::read_to_string(dir.path().join("config.json")).unwrap();
        let json: serde_json::Value = serde_json::from_str(&content).unwrap();
        let auth = json["auths"]["012345678912.dkr.ecr.us-west-2.amazonaws.com"]["auth"]
            .as_str()
            .unwrap();
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(auth)
            .unwrap();
        assert_eq!(decoded, b"AWS:token");
    }

    #[tokio::test]
    async fn test_missing_binary() {
        let engine = DockerCli::new("/nonexistent/ecr-porter-docker");
        let err = engine.tag_image("app:v1", "host/app", "v1").await.unwrap_err();
        match err {
            PorterError::Engine { command, message } => {
                assert_eq!(command, "docker tag");
                assert!(message.contains("failed to run"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_engine_error() {
        let engine = DockerCli::new("false");
        let err = engine
            .push_image("host/app", "v1", "host", &credential())
            .await
            .unwrap_err();
        assert!(matches!(err, PorterError::Engine { ref command, .. } if command == "docker push"));
    }

    #[tokio::test]
    async fn test_successful_command() {
        let engine = DockerCli::new("true");
        engine
            .pull_image(
                "host/app",
                &ImageSelector::Tag("v1".to_string()),
                &credential(),
            )
            .await
            .unwrap();
    }
}
