//! # rpckit
//!
//! Blocking JSON-RPC client for Kallithea and RhodeCode servers.
//!
//! This crate provides:
//! - A single generic [`RpcClient::call`] entry point with per-call
//!   correlation ids and distinct transport/protocol/API errors
//! - Dotted [`Version`] parsing and comparison
//! - Server identification that picks a behavior [`Profile`]
//!
//! ## Example
//!
//! ```no_run
//! use rpckit::{HttpTransport, RpcClient, identify};
//! use serde_json::json;
//!
//! let transport = HttpTransport::new("https://scm.example.com/_admin/api");
//! let client = RpcClient::new(Box::new(transport), "api-key");
//!
//! let server = identify(&client).expect("unsupported server");
//! println!("talking to {}", server);
//!
//! let repos = client.call("get_repos", json!({})).unwrap();
//! println!("{} repositories", repos.as_array().map_or(0, Vec::len));
//! ```
//!
//! ## Profiles
//!
//! | Product   | Version marker      | Minimum | Internal auth |
//! |-----------|---------------------|---------|---------------|
//! | Kallithea | `kallithea_version` | 0.3     | `internal`    |
//! | RhodeCode | `rhodecode_version` | 2.2.5   | `rhodecode`   |

#![warn(clippy::all)]

pub mod client;
pub mod error;
pub mod server;
pub mod transport;
pub mod version;

pub use client::RpcClient;
pub use error::{Error, ErrorCategory, Result};
pub use server::{INTERNAL_AUTH, ProductFamily, Profile, ServerIdentity, identify};
pub use transport::http::HttpTransport;
pub use transport::{MockTransport, RecordedCall, Transport};
pub use version::Version;
