//! HTTP transport.
//!
//! One POST per call against the server's JSON-RPC endpoint (`/_admin/api`).
//!
//! # Certificate validation
//!
//! Endpoints on `localhost` or a loopback address are contacted without
//! certificate validation so that self-signed test instances work. Every
//! other host gets full validation unless the caller explicitly opts out
//! with [`HttpTransport::with_verification`].

use crate::error::{Error, Result};
use crate::transport::Transport;
use serde_json::Value;
use std::net::IpAddr;

/// HTTP transport backed by a blocking `ureq` agent.
pub struct HttpTransport {
    /// HTTP agent for requests.
    agent: ureq::Agent,
    /// Full endpoint URL.
    url: String,
}

impl HttpTransport {
    /// Create a transport for `url`, validating certificates unless the host
    /// is a loopback address.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into();
        let verify = !is_loopback_url(&url);
        Self::with_verification(url, verify)
    }

    /// Create a transport with explicit certificate validation.
    #[must_use]
    pub fn with_verification(url: impl Into<String>, verify: bool) -> Self {
        let url = url.into();
        if !verify {
            log::debug!("TLS certificate validation disabled for {}", url);
        }

        let tls = ureq::tls::TlsConfig::builder()
            .disable_verification(!verify)
            .build();
        let config = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .tls_config(tls)
            .build();

        Self {
            agent: ureq::Agent::new_with_config(config),
            url,
        }
    }

    /// Get the endpoint URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: &Value) -> Result<Value> {
        let mut response = self
            .agent
            .post(&self.url)
            .header("Accept", "application/json")
            .header("User-Agent", "repoconverge")
            .send_json(request)?;

        let status = response.status().as_u16();
        if status != 200 {
            return Err(Error::transport(format!("HTTP {}", status), Some(status)));
        }

        let body = response.body_mut().read_to_string()?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// Extract the host part of a URL, without IPv6 brackets.
pub fn url_hostname(url: &str) -> Option<String> {
    let uri: ureq::http::Uri = url.parse().ok()?;
    uri.host()
        .map(|host| host.trim_start_matches('[').trim_end_matches(']').to_string())
}

/// Whether a URL points at this machine.
pub fn is_loopback_url(url: &str) -> bool {
    match url_hostname(url) {
        Some(host) if host.eq_ignore_ascii_case("localhost") => true,
        Some(host) => host.parse::<IpAddr>().is_ok_and(|ip| ip.is_loopback()),
        None => false,
    }
}
