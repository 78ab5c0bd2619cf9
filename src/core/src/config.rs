use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PorterError, Result};

/// ecr-porter configuration.
///
/// Precedence, lowest to highest: config file, environment, command-line flags.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PorterConfig {
    /// AWS region used when a reference does not name a registry host
    pub region: Option<String>,

    /// Named AWS credentials profile
    pub aws_profile: Option<String>,

    /// Registry (account) id to use instead of the caller's account
    pub registry_id: Option<String>,

    /// Local container engine settings
    pub docker: DockerConfig,

    /// Log level when RUST_LOG is not set
    pub log_level: LogLevel,
}

/// Local container engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DockerConfig {
    /// Path or name of the docker executable
    pub binary: String,
}

impl Default for DockerConfig {
    fn default() -> Self {
        Self {
            binary: "docker".to_string(),
        }
    }
}

/// Log level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    #[default]
    Warn,
    Error,
}

impl LogLevel {
    /// Directive string understood by `tracing_subscriber::EnvFilter`.
    pub fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub region: Option<String>,
    pub aws_profile: Option<String>,
    pub registry_id: Option<String>,
}

impl PorterConfig {
    /// Path of the default config file (`~/.ecr-porter/config.yaml`).
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| {
            PorterError::ConfigError("Cannot determine home directory for config file".to_string())
        })?;
        Ok(home.join(".ecr-porter").join("config.yaml"))
    }

    /// Load configuration from a YAML file. A missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path).map_err(|e| {
            PorterError::ConfigError(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        serde_yaml::from_str(&data).map_err(|e| {
            PorterError::ConfigError(format!(
                "Failed to parse config file {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// Load the file (explicit or default path), then apply the process
    /// environment and command-line overrides.
    pub fn resolve(path: Option<&Path>, overrides: ConfigOverrides) -> Result<Self> {
        let config = match path {
            Some(path) => {
                if !path.exists() {
                    return Err(PorterError::ConfigError(format!(
                        "Config file not found: {}",
                        path.display()
                    )));
                }
                Self::load(path)?
            }
            None => Self::load(&Self::default_path()?)?,
        };
        Ok(config.with_env().with_overrides(overrides))
    }

    /// Apply overrides from the process environment.
    pub fn with_env(self) -> Self {
        self.with_env_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an environment lookup.
    ///
    /// Reads `AWS_REGION` (falling back to `AWS_DEFAULT_REGION`), `AWS_PROFILE`,
    /// `ECR_PORTER_REGISTRY_ID` and `ECR_PORTER_DOCKER`.
    pub fn with_env_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(region) = non_empty("AWS_REGION").or_else(|| non_empty("AWS_DEFAULT_REGION")) {
            self.region = Some(region);
        }
        if let Some(profile) = non_empty("AWS_PROFILE") {
            self.aws_profile = Some(profile);
        }
        if let Some(registry_id) = non_empty("ECR_PORTER_REGISTRY_ID") {
            self.registry_id = Some(registry_id);
        }
        if let Some(binary) = non_empty("ECR_PORTER_DOCKER") {
            self.docker.binary = binary;
        }
        self
    }

    /// Apply command-line overrides.
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if overrides.region.is_some() {
            self.region = overrides.region;
        }
        if overrides.aws_profile.is_some() {
            self.aws_profile = overrides.aws_profile;
        }
        if overrides.registry_id.is_some() {
            self.registry_id = overrides.registry_id;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = PorterConfig::default();
        assert_eq!(config.region, None);
        assert_eq!(config.docker.binary, "docker");
        assert_eq!(config.log_level, LogLevel::Warn);
    }

    #[test]
    fn test_load_missing_file_is_default() {
        let dir = TempDir::new().unwrap();
        let config = PorterConfig::load(&dir.path().join("config.yaml")).unwrap();
        assert_eq!(config, PorterConfig::default());
    }

    #[test]
    fn test_load_yaml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            "region: us-west-2\nregistry_id: \"012345678912\"\ndocker:\n  binary: /usr/local/bin/docker\nlog_level: debug\n",
        )
        .unwrap();

        let config = PorterConfig::load(&path).unwrap();
        assert_eq!(config.region.as_deref(), Some("us-west-2"));
        assert_eq!(config.registry_id.as_deref(), Some("012345678912"));
        assert_eq!(config.docker.binary, "/usr/local/bin/docker");
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.aws_profile, None);
    }

    #[test]
    fn test_load_invalid_yaml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "region: [unclosed").unwrap();

        let err = PorterConfig::load(&path).unwrap_err();
        assert!(matches!(err, PorterError::ConfigError(_)));
    }

    #[test]
    fn test_resolve_explicit_missing_path() {
        let dir = TempDir::new().unwrap();
        let err = PorterConfig::resolve(
            Some(&dir.path().join("nope.yaml")),
            ConfigOverrides::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }

    #[test]
    fn test_env_overrides_file() {
        let config = PorterConfig {
            region: Some("us-east-1".to_string()),
            ..Default::default()
        }
        .with_env_from(env(&[
            ("AWS_REGION", "eu-west-1"),
            ("AWS_PROFILE", "ci"),
            ("ECR_PORTER_DOCKER", "podman"),
        ]));

        assert_eq!(config.region.as_deref(), Some("eu-west-1"));
        assert_eq!(config.aws_profile.as_deref(), Some("ci"));
        assert_eq!(config.docker.binary, "podman");
    }

    #[test]
    fn test_env_default_region_fallback() {
        let config = PorterConfig::default().with_env_from(env(&[
            ("AWS_REGION", ""),
            ("AWS_DEFAULT_REGION", "ap-south-1"),
        ]));
        assert_eq!(config.region.as_deref(), Some("ap-south-1"));
    }

    #[test]
    fn test_flags_override_env() {
        let config = PorterConfig::default()
            .with_env_from(env(&[
                ("AWS_REGION", "eu-west-1"),
                ("ECR_PORTER_REGISTRY_ID", "111111111111"),
            ]))
            .with_overrides(ConfigOverrides {
                region: Some("us-west-2".to_string()),
                aws_profile: None,
                registry_id: Some("012345678912".to_string()),
            });

        assert_eq!(config.region.as_deref(), Some("us-west-2"));
        assert_eq!(config.registry_id.as_deref(), Some("012345678912"));
        assert_eq!(config.aws_profile, None);
    }

    #[test]
    fn test_log_level_directive() {
        assert_eq!(LogLevel::Debug.as_directive(), "debug");
        assert_eq!(LogLevel::Info.as_directive(), "info");
        assert_eq!(LogLevel::default().as_directive(), "warn");
    }
}
