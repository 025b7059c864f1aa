use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer};

use crate::error::Error;

static RELEASE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\d+\.\d+$").expect("valid release regex"));

/// A Kubernetes release to bootstrap, e.g. `1.30.10`.
///
/// Displays with a leading `v`, matching the API server's reported `gitVersion`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct K8sVersion {
    release: Cow<'static, str>,
}

impl K8sVersion {
    pub const V1_30_10: K8sVersion = K8sVersion::from_static("1.30.10");

    pub const fn from_static(release: &'static str) -> Self {
        Self {
            release: Cow::Borrowed(release),
        }
    }

    /// Bare release string without the `v` prefix.
    pub fn release(&self) -> &str {
        &self.release
    }
}

impl fmt::Display for K8sVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.release)
    }
}

impl FromStr for K8sVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let release = trimmed.strip_prefix('v').unwrap_or(trimmed);
        if !RELEASE_RE.is_match(release) {
            return Err(Error::InvalidVersion(s.to_string()));
        }
        Ok(Self {
            release: Cow::Owned(release.to_string()),
        })
    }
}

impl<'de> Deserialize<'de> for K8sVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl Default for K8sVersion {
    fn default() -> Self {
        Self::V1_30_10
    }
}
