//! Execution engine for repoconverge
//!
//! The engine orchestrates:
//! 1. Connecting - Probe the server once and pick its profile
//! 2. Planning - Build resources from a manifest or the command line
//! 3. Executing - Converge each resource in order and report

pub mod differ;
pub mod executor;

use anyhow::{Context, Result};
use rpckit::{Profile, RpcClient, ServerIdentity};
use std::rc::Rc;

pub use executor::{Output, run};

/// Connection to one identified server, shared by every resource of a run
pub struct Session {
    pub client: RpcClient,
    pub identity: ServerIdentity,
}

impl Session {
    /// Identify the server behind `client`
    ///
    /// Fails before any other call when the server is unknown or too old.
    pub fn connect(client: RpcClient) -> Result<Rc<Self>> {
        let identity = rpckit::identify(&client).context("Could not identify server")?;
        Ok(Rc::new(Self { client, identity }))
    }

    /// Behavior profile of the connected server
    pub fn profile(&self) -> &'static Profile {
        self.identity.profile()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::Session;
    use rpckit::{MockTransport, ProductFamily, RpcClient, ServerIdentity, Version};
    use std::rc::Rc;

    /// Session against a mock server that already identified as `family`
    pub fn session(mock: &MockTransport, family: ProductFamily) -> Rc<Session> {
        let version = match family {
            ProductFamily::Kallithea => "0.7.0",
            ProductFamily::RhodeCode => "2.2.5",
        };
        Rc::new(Session {
            client: RpcClient::new(Box::new(mock.clone()), "test-key"),
            identity: ServerIdentity {
                family,
                version: Version::parse(version),
            },
        })
    }

    /// Kallithea session, the common case in tests
    pub fn kallithea(mock: &MockTransport) -> Rc<Session> {
        session(mock, ProductFamily::Kallithea)
    }
}
