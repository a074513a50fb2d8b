//! Server identification and behavior profiles.
//!
//! Kallithea and RhodeCode expose nearly the same API. The few differences
//! live in a [`Profile`] picked once per run from the `get_server_info`
//! probe, so reconcilers never branch on the product themselves.

use crate::client::RpcClient;
use crate::error::{Error, Result};
use crate::version::Version;
use serde::Serialize;
use serde_json::{Value, json};
use std::fmt;

/// Canonical name for the built-in password authentication method.
pub const INTERNAL_AUTH: &str = "internal";

/// Server product family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductFamily {
    Kallithea,
    RhodeCode,
}

impl ProductFamily {
    /// All families, in probe order.
    #[must_use]
    pub fn all() -> &'static [ProductFamily] {
        &[ProductFamily::Kallithea, ProductFamily::RhodeCode]
    }

    /// Get the behavior profile for this family.
    #[must_use]
    pub fn profile(self) -> &'static Profile {
        match self {
            ProductFamily::Kallithea => &KALLITHEA,
            ProductFamily::RhodeCode => &RHODECODE,
        }
    }
}

impl fmt::Display for ProductFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProductFamily::Kallithea => write!(f, "Kallithea"),
            ProductFamily::RhodeCode => write!(f, "RhodeCode"),
        }
    }
}

/// Per-family behavior differences.
#[derive(Debug)]
pub struct Profile {
    pub family: ProductFamily,
    /// Key in `get_server_info` carrying the version.
    pub version_key: &'static str,
    /// Oldest supported version.
    pub minimum_version: &'static str,
    /// Server name for [`INTERNAL_AUTH`].
    pub internal_auth: &'static str,
    /// Permission string prefix for repositories.
    pub repository_perm_prefix: &'static str,
    /// Permission string prefix for repository groups.
    pub repo_group_perm_prefix: &'static str,
}

static KALLITHEA: Profile = Profile {
    family: ProductFamily::Kallithea,
    version_key: "kallithea_version",
    minimum_version: "0.3",
    internal_auth: "internal",
    repository_perm_prefix: "repository",
    repo_group_perm_prefix: "group",
};

static RHODECODE: Profile = Profile {
    family: ProductFamily::RhodeCode,
    version_key: "rhodecode_version",
    minimum_version: "2.2.5",
    internal_auth: "rhodecode",
    repository_perm_prefix: "repository",
    repo_group_perm_prefix: "group",
};

impl Profile {
    /// Translate a canonical attribute value into what this server expects.
    #[must_use]
    pub fn outgoing(&self, attribute: &str, value: &Value) -> Value {
        match (attribute, value.as_str()) {
            ("extern_type", Some(INTERNAL_AUTH)) => json!(self.internal_auth),
            _ => value.clone(),
        }
    }

    /// Translate a value reported by this server into canonical form.
    #[must_use]
    pub fn incoming(&self, attribute: &str, value: &Value) -> Value {
        match (attribute, value.as_str()) {
            ("extern_type", Some(name)) if name == self.internal_auth => json!(INTERNAL_AUTH),
            _ => value.clone(),
        }
    }

    /// Full permission string for a repository, e.g. `repository.write`.
    #[must_use]
    pub fn repository_perm(&self, level: &str) -> String {
        format!("{}.{}", self.repository_perm_prefix, level)
    }

    /// Full permission string for a repository group, e.g. `group.write`.
    #[must_use]
    pub fn repo_group_perm(&self, level: &str) -> String {
        format!("{}.{}", self.repo_group_perm_prefix, level)
    }
}

/// Identity of the server for this run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerIdentity {
    pub family: ProductFamily,
    pub version: Version,
}

impl ServerIdentity {
    /// Get the behavior profile for this server.
    #[must_use]
    pub fn profile(&self) -> &'static Profile {
        self.family.profile()
    }
}

impl fmt::Display for ServerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.family, self.version)
    }
}

/// Probe the server and select its profile.
///
/// # Errors
///
/// - `Error::UnknownServer` if no known version marker is present
/// - `Error::UnsupportedServer` if the version is below the family minimum
pub fn identify(client: &RpcClient) -> Result<ServerIdentity> {
    let info = client.call("get_server_info", json!({}))?;
    identify_from_info(&info)
}

/// Select a profile from a `get_server_info` result.
pub fn identify_from_info(info: &Value) -> Result<ServerIdentity> {
    for family in ProductFamily::all() {
        let profile = family.profile();
        let Some(raw) = info.get(profile.version_key).and_then(Value::as_str) else {
            continue;
        };

        let version = Version::parse(raw);
        let minimum = Version::parse(profile.minimum_version);
        if !version.at_least(&minimum) {
            return Err(Error::UnsupportedServer {
                product: family.to_string(),
                version: version.to_string(),
                minimum: minimum.to_string(),
            });
        }

        log::info!("Connected to {} {}", family, version);
        return Ok(ServerIdentity {
            family: *family,
            version,
        });
    }

    Err(Error::UnknownServer)
}
