use std::fmt;

use thiserror::Error;

use crate::reference::ReferenceError;

/// Named steps of push and pull orchestration.
///
/// Failures inside an orchestration are wrapped with the step they
/// happened in so the user can tell how far an operation got.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Authorize,
    Retag,
    CheckRepository,
    CreateRepository,
    TagRepository,
    Transfer,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::Authorize => "registry authorization",
            Step::Retag => "local image retag",
            Step::CheckRepository => "repository existence check",
            Step::CreateRepository => "repository creation",
            Step::TagRepository => "repository tagging",
            Step::Transfer => "image transfer",
        };
        f.write_str(name)
    }
}

/// ecr-porter error types
#[derive(Error, Debug)]
pub enum PorterError {
    /// Wrong number of arguments or malformed flag values
    #[error("Usage error: {0}")]
    Usage(String),

    /// Image reference could not be parsed
    #[error("Invalid image reference '{input}': {source}. Expected format {format}")]
    Reference {
        input: String,
        format: &'static str,
        #[source]
        source: ReferenceError,
    },

    /// Caller account could not be determined
    #[error("Account identity error: {0}")]
    Identity(String),

    /// Registry token exchange failed
    #[error("Authorization error: {registry} - {message}")]
    Authorization { registry: String, message: String },

    /// Repository existence check or creation failed
    #[error("Repository error: {repository} - {message}")]
    Repository { repository: String, message: String },

    /// Repository was created by someone else between check and create
    #[error("Repository already exists: {0}")]
    RepositoryAlreadyExists(String),

    /// Resource tagging failed
    #[error("Tagging error: {0}")]
    Tagging(String),

    /// Local container engine command failed
    #[error("Engine error: {command} - {message}")]
    Engine { command: String, message: String },

    /// Registry listing error
    #[error("Registry error: {0}")]
    Registry(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// An orchestration step failed
    #[error("{step} failed: {source}")]
    StepFailed {
        step: Step,
        #[source]
        source: Box<PorterError>,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl PorterError {
    /// Wrap this error with the orchestration step it happened in.
    pub fn during(self, step: Step) -> Self {
        PorterError::StepFailed {
            step,
            source: Box::new(self),
        }
    }

    /// The step this error was raised in, if it came from an orchestration.
    pub fn step(&self) -> Option<Step> {
        match self {
            PorterError::StepFailed { step, .. } => Some(*step),
            _ => None,
        }
    }

    /// The innermost error, with step context removed.
    pub fn root(&self) -> &PorterError {
        match self {
            PorterError::StepFailed { source, .. } => source.root(),
            other => other,
        }
    }
}

impl From<serde_json::Error> for PorterError {
    fn from(err: serde_json::Error) -> Self {
        PorterError::SerializationError(err.to_string())
    }
}

impl From<serde_yaml::Error> for PorterError {
    fn from(err: serde_yaml::Error) -> Self {
        PorterError::SerializationError(err.to_string())
    }
}

/// Result type alias for ecr-porter operations
pub type Result<T> = std::result::Result<T, PorterError>;
