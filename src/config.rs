//! Connection settings
//!
//! Sources, highest priority first: command-line flags, `REPOCONVERGE_*`
//! environment variables (read by clap), then the `[server]` table of
//! `<config_dir>/config.toml`.

use anyhow::{Context, Result, bail};
use rpckit::{HttpTransport, RpcClient};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::paths;

/// Path of the API below the server base URL
const API_PATH: &str = "/_admin/api";

/// Contents of `config.toml`
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub insecure: Option<bool>,
}

impl FileConfig {
    /// Load `config.toml` from the config directory; a missing file is empty
    pub fn load() -> Result<Self> {
        let path = paths::config_dir()?.join("config.toml");
        if !path.exists() {
            log::debug!("No config file at {}", path.display());
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Invalid config file {}", path.display()))
    }
}

/// Connection overrides from the command line
#[derive(Debug, Default, Clone)]
pub struct ConnectionArgs {
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub insecure: bool,
}

/// Resolved connection to one server
#[derive(Clone)]
pub struct Connection {
    pub url: String,
    pub api_key: String,
    pub insecure: bool,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("url", &self.url)
            .field("insecure", &self.insecure)
            .finish_non_exhaustive()
    }
}

impl Connection {
    /// Merge command-line overrides over the config file
    pub fn resolve(args: &ConnectionArgs, file: &FileConfig) -> Result<Self> {
        let Some(url) = args.url.clone().or_else(|| file.server.url.clone()) else {
            bail!("No server URL: pass --url, set REPOCONVERGE_URL or add [server] url to config.toml");
        };
        let Some(api_key) = args.api_key.clone().or_else(|| file.server.api_key.clone()) else {
            bail!(
                "No API key: pass --api-key, set REPOCONVERGE_API_KEY or add [server] api_key to config.toml"
            );
        };

        Ok(Self {
            url,
            api_key,
            insecure: args.insecure || file.server.insecure.unwrap_or(false),
        })
    }

    /// Full API endpoint URL
    pub fn endpoint(&self) -> String {
        let base = self.url.trim_end_matches('/');
        if base.ends_with(API_PATH) {
            base.to_string()
        } else {
            format!("{base}{API_PATH}")
        }
    }

    /// RPC client over HTTP
    ///
    /// Certificates are verified unless the host is loopback or `insecure`
    /// is set.
    pub fn client(&self) -> RpcClient {
        let transport = if self.insecure {
            log::warn!("Certificate verification disabled for {}", self.url);
            HttpTransport::with_verification(self.endpoint(), false)
        } else {
            HttpTransport::new(self.endpoint())
        };
        RpcClient::new(Box::new(transport), self.api_key.clone())
    }
}
