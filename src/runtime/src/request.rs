//! Argument checks shared by the push and pull orchestrators.
//!
//! Everything here is deterministic and runs before any service call.

use porter_core::error::{PorterError, Result};
use porter_core::{ImageReference, ReferenceSyntax};

/// The single positional image argument of `command`.
pub(crate) fn single_image<'a>(args: &'a [String], command: &str) -> Result<&'a str> {
    match args {
        [image] => Ok(image.as_str()),
        [] => Err(PorterError::Usage(format!(
            "{command} requires an image argument"
        ))),
        _ => Err(PorterError::Usage(format!(
            "{command} takes exactly one image argument, got {}",
            args.len()
        ))),
    }
}

/// Parse `input`, attaching the input and expected format to failures.
pub(crate) fn parse_image(input: &str, syntax: ReferenceSyntax) -> Result<ImageReference> {
    ImageReference::parse(input, syntax).map_err(|source| PorterError::Reference {
        input: input.to_string(),
        format: syntax.format(),
        source,
    })
}

/// URI of `repository` inside `registry`.
pub(crate) fn repository_uri(registry: &str, repository: &str) -> String {
    format!("{}/{}", registry.trim_end_matches('/'), repository)
}

#[cfg(test)]
mod tests {
    use super::*;
    use porter_core::ReferenceError;

    #[test]
    fn test_single_image() {
        let args = vec!["repo:v1".to_string()];
        assert_eq!(single_image(&args, "push").unwrap(), "repo:v1");
    }

    #[test]
    fn test_single_image_none() {
        let err = single_image(&[], "pull").unwrap_err();
        assert_eq!(err.to_string(), "Usage error: pull requires an image argument");
    }

    #[test]
    fn test_single_image_too_many() {
        let args = vec!["a".to_string(), "b".to_string()];
        let err = single_image(&args, "push").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Usage error: push takes exactly one image argument, got 2"
        );
    }

    #[test]
    fn test_parse_image_error_carries_format() {
        let err = parse_image("rep@sha256:ab", ReferenceSyntax::TagOnly).unwrap_err();
        match err {
            PorterError::Reference { input, format, source } => {
                assert_eq!(input, "rep@sha256:ab");
                assert_eq!(format, "[REGISTRY_URI/]REPOSITORY[:TAG]");
                assert_eq!(source, ReferenceError::DigestNotAllowed);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_repository_uri() {
        assert_eq!(
            repository_uri("https://012345678912.dkr.ecr.us-west-2.amazonaws.com", "repository"),
            "https://012345678912.dkr.ecr.us-west-2.amazonaws.com/repository"
        );
        assert_eq!(repository_uri("host/", "hi/repo"), "host/hi/repo");
    }
}
