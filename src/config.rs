//! Loader settings, optionally read from a TOML file:
//!
//! ```toml
//! # xps.toml
//! groups = "always-create"
//! on-shape-mismatch = "repair"
//! ```

use std::fmt::{Display, Formatter};
use std::path::Path;
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use crate::XpsError;


/// What happens when a Group line names a group that already exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GroupPolicy {
    /// reopen the existing group, new regions are appended to it
    #[default]
    Merge,
    /// every Group line creates a new node, names may repeat
    AlwaysCreate,
}

/// What happens when a sweep does not fit its region's energy axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MismatchPolicy {
    /// drop the sweep but keep its timestamp, so `time` can be longer than `data`
    #[default]
    Skip,
    /// drop the sweep together with its timestamp
    Repair,
    /// abort the load of the file
    Fail,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct LoaderConfig {
    pub groups: GroupPolicy,
    pub on_shape_mismatch: MismatchPolicy,
}

impl LoaderConfig {

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, XpsError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| XpsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        content.parse()
    }

    pub fn with_groups(mut self, groups: GroupPolicy) -> Self {
        self.groups = groups;
        self
    }

    pub fn with_mismatch(mut self, policy: MismatchPolicy) -> Self {
        self.on_shape_mismatch = policy;
        self
    }
}

impl FromStr for LoaderConfig {
    type Err = XpsError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(toml::from_str(s)?)
    }
}

impl FromStr for GroupPolicy {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "merge" => Ok(GroupPolicy::Merge),
            "always-create" => Ok(GroupPolicy::AlwaysCreate),
            _ => Err(format!("unknown group policy '{s}' (expected merge or always-create)")),
        }
    }
}

impl Display for GroupPolicy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            GroupPolicy::Merge => write!(f, "merge"),
            GroupPolicy::AlwaysCreate => write!(f, "always-create"),
        }
    }
}

impl FromStr for MismatchPolicy {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "skip" => Ok(MismatchPolicy::Skip),
            "repair" => Ok(MismatchPolicy::Repair),
            "fail" => Ok(MismatchPolicy::Fail),
            _ => Err(format!("unknown mismatch policy '{s}' (expected skip, repair or fail)")),
        }
    }
}

impl Display for MismatchPolicy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            MismatchPolicy::Skip => write!(f, "skip"),
            MismatchPolicy::Repair => write!(f, "repair"),
            MismatchPolicy::Fail => write!(f, "fail"),
        }
    }
}
