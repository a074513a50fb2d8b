//! Permission grants on repositories and repository groups
//!
//! Subjects are users or user groups. The server reports the current
//! permissions of a user through `get_user`, but has no call that reports
//! what a user group holds. Targets for user groups are therefore always the
//! full requested set, and a grant or revoke involving one always reports a
//! change.

pub mod grant;
pub mod resolver;

pub use grant::PermissionResource;

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// Permission level
///
/// `None` is a real entry that denies access; it differs from having no
/// entry at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    None,
    Read,
    Write,
    Admin,
}

impl Level {
    pub fn as_str(self) -> &'static str {
        match self {
            Level::None => "none",
            Level::Read => "read",
            Level::Write => "write",
            Level::Admin => "admin",
        }
    }
}

impl FromStr for Level {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "none" => Ok(Level::None),
            "read" => Ok(Level::Read),
            "write" => Ok(Level::Write),
            "admin" => Ok(Level::Admin),
            other => bail!("unknown permission level '{}'", other),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who a permission applies to
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Subject {
    User(String),
    UserGroup(String),
}

impl Subject {
    pub fn name(&self) -> &str {
        match self {
            Subject::User(name) | Subject::UserGroup(name) => name,
        }
    }

    /// Whether the server can report this subject's current permissions
    pub fn is_queryable(&self) -> bool {
        matches!(self, Subject::User(_))
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subject::User(name) => write!(f, "user {name}"),
            Subject::UserGroup(name) => write!(f, "user group {name}"),
        }
    }
}

/// Repositories and repository groups a permission change applies to
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Targets {
    #[serde(default)]
    pub repositories: BTreeSet<String>,
    #[serde(default)]
    pub repo_groups: BTreeSet<String>,
}

impl Targets {
    pub fn new<R, G>(repositories: R, repo_groups: G) -> Self
    where
        R: IntoIterator,
        R::Item: Into<String>,
        G: IntoIterator,
        G::Item: Into<String>,
    {
        Self {
            repositories: repositories.into_iter().map(Into::into).collect(),
            repo_groups: repo_groups.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.repositories.is_empty() && self.repo_groups.is_empty()
    }
}

/// Permission entries a user currently holds; missing keys have no entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CurrentPermissions {
    pub repositories: BTreeMap<String, Level>,
    pub repo_groups: BTreeMap<String, Level>,
}

/// What is known about a subject's current permissions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observed {
    Known(CurrentPermissions),
    /// The server cannot report them (user groups)
    Unqueryable,
}
