//! ECR registry endpoint grammar.
//!
//! A registry host has the shape
//! `<account-id>.dkr.<service>.<region>.<domain>` where service is `ecr`
//! or the FIPS variant `ecr-fips`, and domain is `amazonaws.com` or
//! `amazonaws.com.cn`.

use std::fmt;

/// Service label of the standard endpoint family.
const STANDARD_SERVICE: &str = "ecr";

/// Service label of the FIPS endpoint family.
const FIPS_SERVICE: &str = "ecr-fips";

/// Recognized registry domain suffixes.
const DOMAIN_SUFFIXES: &[&str] = &["amazonaws.com", "amazonaws.com.cn"];

/// A parsed registry host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEndpoint {
    /// Account (registry) id, e.g. "012345678912"
    pub account_id: String,
    /// Region, e.g. "us-west-2"
    pub region: String,
    /// Whether this is the FIPS endpoint family
    pub fips: bool,
    /// Domain suffix, e.g. "amazonaws.com"
    pub domain: &'static str,
}

impl RegistryEndpoint {
    /// Whether `segment` is an attempt at a registry host: it starts with a
    /// numeric account id and the rest has at least two more dotted labels,
    /// e.g. `012345678912.dkx.ecr.us-east-1.amazonaws.com`.
    ///
    /// Host-shaped segments that fail [`RegistryEndpoint::parse`] are
    /// unsupported endpoints, not repository path components.
    pub fn is_host_shaped(segment: &str) -> bool {
        let rest = segment.trim_start_matches(|c: char| c.is_ascii_digit());
        rest.len() < segment.len() && rest.matches('.').count() >= 2
    }

    /// Parse a registry host. An optional `http://`/`https://` scheme and
    /// trailing slash are ignored.
    pub fn parse(host: &str) -> Option<Self> {
        let host = strip_scheme(host).trim_end_matches('/');

        let (account_id, rest) = host.split_once('.')?;
        if !is_account_id(account_id) {
            return None;
        }

        let rest = rest.strip_prefix("dkr.")?;
        let (service, rest) = rest.split_once('.')?;
        let fips = match service {
            STANDARD_SERVICE => false,
            FIPS_SERVICE => true,
            _ => return None,
        };

        let (region, domain) = rest.split_once('.')?;
        if !is_region(region) {
            return None;
        }
        let domain = DOMAIN_SUFFIXES.iter().copied().find(|d| *d == domain)?;

        Some(Self {
            account_id: account_id.to_string(),
            region: region.to_string(),
            fips,
            domain,
        })
    }

    /// Canonical host name, without scheme.
    pub fn host(&self) -> String {
        let service = if self.fips { FIPS_SERVICE } else { STANDARD_SERVICE };
        format!(
            "{}.dkr.{}.{}.{}",
            self.account_id, service, self.region, self.domain
        )
    }

    /// AWS partition the endpoint belongs to.
    pub fn partition(&self) -> &'static str {
        if self.domain == "amazonaws.com.cn" {
            "aws-cn"
        } else if self.region.starts_with("us-gov-") {
            "aws-us-gov"
        } else {
            "aws"
        }
    }

    /// ARN of a repository hosted behind this endpoint.
    pub fn repository_arn(&self, repository: &str) -> String {
        format!(
            "arn:{}:ecr:{}:{}:repository/{}",
            self.partition(),
            self.region,
            self.account_id,
            repository
        )
    }
}

impl fmt::Display for RegistryEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.host())
    }
}

/// Strip a leading `https://` or `http://`.
pub fn strip_scheme(address: &str) -> &str {
    address
        .strip_prefix("https://")
        .or_else(|| address.strip_prefix("http://"))
        .unwrap_or(address)
}

fn is_account_id(label: &str) -> bool {
    !label.is_empty() && label.bytes().all(|b| b.is_ascii_digit())
}

fn is_region(label: &str) -> bool {
    !label.is_empty()
        && !label.starts_with('-')
        && !label.ends_with('-')
        && label
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
}
