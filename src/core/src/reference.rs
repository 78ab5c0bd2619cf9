//! Image reference parsing.
//!
//! Parses references like `012345678912.dkr.ecr.us-west-2.amazonaws.com/team/app:v1`
//! into structured components. Unlike Docker-style references no defaults
//! are filled in: the parsed value prints back to exactly the input.

use std::fmt;

use thiserror::Error;

use crate::endpoint::RegistryEndpoint;

/// Tag used when a reference names neither a tag nor a digest.
pub const DEFAULT_TAG: &str = "latest";

/// Longest repository name the registry accepts.
const MAX_REPOSITORY_LEN: usize = 256;

/// Longest tag the registry accepts.
const MAX_TAG_LEN: usize = 128;

/// Which version markers a reference may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceSyntax {
    /// `[REGISTRY_URI/]REPOSITORY[:TAG]`
    TagOnly,
    /// `[REGISTRY_URI/]REPOSITORY[:TAG|@DIGEST]`
    TagOrDigest,
}

impl ReferenceSyntax {
    /// Human-readable format, shown in usage errors.
    pub fn format(self) -> &'static str {
        match self {
            ReferenceSyntax::TagOnly => "[REGISTRY_URI/]REPOSITORY[:TAG]",
            ReferenceSyntax::TagOrDigest => "[REGISTRY_URI/]REPOSITORY[:TAG|@DIGEST]",
        }
    }

    fn allows_digest(self) -> bool {
        matches!(self, ReferenceSyntax::TagOrDigest)
    }
}

/// Why a reference failed to parse.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReferenceError {
    #[error("unsupported registry endpoint '{0}'")]
    UnsupportedEndpoint(String),

    #[error("ambiguous reference, tag and digest both specified")]
    AmbiguousReference,

    #[error("empty repository name")]
    EmptyRepository,

    #[error("digest references are not supported for this command")]
    DigestNotAllowed,

    #[error("invalid repository name '{0}'")]
    InvalidRepositoryName(String),

    #[error("invalid tag '{0}'")]
    InvalidTag(String),

    #[error("invalid digest '{0}', expected algorithm:hex")]
    InvalidDigest(String),
}

/// The version part of a reference: a tag or a digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSelector {
    Tag(String),
    Digest(String),
}

impl ImageSelector {
    /// Append this selector to a repository URI (`uri:tag` or `uri@digest`).
    pub fn apply_to(&self, uri: &str) -> String {
        match self {
            ImageSelector::Tag(tag) => format!("{uri}:{tag}"),
            ImageSelector::Digest(digest) => format!("{uri}@{digest}"),
        }
    }
}

impl fmt::Display for ImageSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageSelector::Tag(tag) => f.write_str(tag),
            ImageSelector::Digest(digest) => f.write_str(digest),
        }
    }
}

/// Parsed image reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    /// Registry host, only when the input named one explicitly
    pub registry: Option<String>,
    /// Repository path (e.g., "repository", "team/app")
    pub repository: String,
    /// Tag (e.g., "v0.1.0")
    pub tag: Option<String>,
    /// Digest (e.g., "sha256:abc123...")
    pub digest: Option<String>,
}

impl ImageReference {
    /// Parse an image reference string.
    ///
    /// Supports formats:
    /// - `repository`
    /// - `team/app:v1`
    /// - `team/app@sha256:0b37...` (only with [`ReferenceSyntax::TagOrDigest`])
    /// - `012345678912.dkr.ecr.us-east-1.amazonaws.com/team/app:v1`
    /// - `012345678912.dkr.ecr-fips.us-gov-west-1.amazonaws.com/app`
    pub fn parse(input: &str, syntax: ReferenceSyntax) -> Result<Self, ReferenceError> {
        let (registry, remainder) = split_registry(input)?;

        // Digest first (@ separator), then tag (: separator)
        let (name, digest) = match remainder.split_once('@') {
            Some((name, digest)) => (name, Some(digest)),
            None => (remainder, None),
        };
        let (repository, tag) = match name.split_once(':') {
            Some((repository, tag)) => (repository, Some(tag)),
            None => (name, None),
        };

        if tag.is_some() && digest.is_some() {
            return Err(ReferenceError::AmbiguousReference);
        }
        if digest.is_some() && !syntax.allows_digest() {
            return Err(ReferenceError::DigestNotAllowed);
        }
        if repository.is_empty() {
            return Err(ReferenceError::EmptyRepository);
        }

        validate_repository(repository)?;
        if let Some(tag) = tag {
            validate_tag(tag)?;
        }
        if let Some(digest) = digest {
            validate_digest(digest)?;
        }

        Ok(ImageReference {
            registry: registry.map(str::to_string),
            repository: repository.to_string(),
            tag: tag.map(str::to_string),
            digest: digest.map(str::to_string),
        })
    }

    /// The tag or digest named by the reference, if any.
    pub fn selector(&self) -> Option<ImageSelector> {
        match (&self.tag, &self.digest) {
            (_, Some(digest)) => Some(ImageSelector::Digest(digest.clone())),
            (Some(tag), None) => Some(ImageSelector::Tag(tag.clone())),
            (None, None) => None,
        }
    }

    /// The tag, or `latest` when none was given.
    pub fn tag_or_default(&self) -> &str {
        self.tag.as_deref().unwrap_or(DEFAULT_TAG)
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref registry) = self.registry {
            write!(f, "{registry}/")?;
        }
        f.write_str(&self.repository)?;
        if let Some(ref tag) = self.tag {
            write!(f, ":{tag}")?;
        }
        if let Some(ref digest) = self.digest {
            write!(f, "@{digest}")?;
        }
        Ok(())
    }
}

/// Split off a leading registry host.
///
/// Only host-shaped segments are considered; everything else, dots and all,
/// is left for the repository path.
fn split_registry(input: &str) -> Result<(Option<&str>, &str), ReferenceError> {
    match input.split_once('/') {
        Some((first, rest)) if RegistryEndpoint::is_host_shaped(first) => {
            if RegistryEndpoint::parse(first).is_none() {
                return Err(ReferenceError::UnsupportedEndpoint(first.to_string()));
            }
            Ok((Some(first), rest))
        }
        Some(_) => Ok((None, input)),
        None => {
            // A bare host with no repository after it
            let name = input.split(['@', ':']).next().unwrap_or(input);
            if RegistryEndpoint::is_host_shaped(name) {
                return Err(match RegistryEndpoint::parse(name) {
                    Some(_) => ReferenceError::EmptyRepository,
                    None => ReferenceError::UnsupportedEndpoint(name.to_string()),
                });
            }
            Ok((None, input))
        }
    }
}

/// Repository names are `/`-joined segments of lowercase alphanumerics
/// separated by single `.`, `_` or `-`.
fn validate_repository(repository: &str) -> Result<(), ReferenceError> {
    let invalid = || ReferenceError::InvalidRepositoryName(repository.to_string());

    if repository.len() > MAX_REPOSITORY_LEN {
        return Err(invalid());
    }

    for segment in repository.split('/') {
        let bytes = segment.as_bytes();
        let (Some(first), Some(last)) = (bytes.first(), bytes.last()) else {
            return Err(invalid());
        };
        if !is_lower_alnum(*first) || !is_lower_alnum(*last) {
            return Err(invalid());
        }

        let mut prev_separator = false;
        for &b in bytes {
            if is_lower_alnum(b) {
                prev_separator = false;
            } else if matches!(b, b'.' | b'_' | b'-') && !prev_separator {
                prev_separator = true;
            } else {
                return Err(invalid());
            }
        }
    }

    Ok(())
}

fn validate_tag(tag: &str) -> Result<(), ReferenceError> {
    let valid = !tag.is_empty()
        && tag.len() <= MAX_TAG_LEN
        && !tag.starts_with(['.', '-'])
        && tag
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'.' | b'-'));

    if valid {
        Ok(())
    } else {
        Err(ReferenceError::InvalidTag(tag.to_string()))
    }
}

fn validate_digest(digest: &str) -> Result<(), ReferenceError> {
    let valid = match digest.split_once(':') {
        Some((algorithm, hex)) => {
            algorithm
                .bytes()
                .next()
                .is_some_and(|b| b.is_ascii_alphanumeric())
                && algorithm
                    .bytes()
                    .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'.' | b'_' | b'-'))
                && !hex.is_empty()
                && hex.bytes().all(|b| b.is_ascii_hexdigit())
        }
        None => false,
    };

    if valid {
        Ok(())
    } else {
        Err(ReferenceError::InvalidDigest(digest.to_string()))
    }
}

fn is_lower_alnum(b: u8) -> bool {
    b.is_ascii_lowercase() || b.is_ascii_digit()
}
