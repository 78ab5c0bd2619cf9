//! Resource tags applied to a repository on push.

use std::collections::BTreeMap;
use std::str::FromStr;

use crate::error::PorterError;

/// Key/value tags for a registry resource.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet(BTreeMap<String, String>);

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tag, replacing any previous value for the key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Parses `Key1=Value1,Key2=Value2`. Values may be empty; keys may not.
impl FromStr for TagSet {
    type Err = PorterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut tags = TagSet::new();
        if s.trim().is_empty() {
            return Ok(tags);
        }

        for pair in s.split(',') {
            let (key, value) = pair.split_once('=').ok_or_else(|| {
                PorterError::Usage(format!(
                    "invalid resource tag '{pair}', expected Key=Value"
                ))
            })?;
            let key = key.trim();
            if key.is_empty() {
                return Err(PorterError::Usage(format!(
                    "invalid resource tag '{pair}', key cannot be empty"
                )));
            }
            tags.insert(key, value.trim());
        }

        Ok(tags)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TagSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut tags = TagSet::new();
        for (k, v) in iter {
            tags.insert(k, v);
        }
        tags
    }
}
