//! JSON-RPC client.
//!
//! Any method name is callable through [`RpcClient::call`]; call sites name
//! remote operations as string constants and the server decides what is
//! valid.

use crate::error::{Error, Result};
use crate::transport::Transport;
use serde::Serialize;
use serde_json::Value;

/// Request envelope sent to the server.
#[derive(Debug, Serialize)]
struct Request<'a> {
    id: &'a str,
    /// The server reads the opaque credential from `api_key`.
    api_key: &'a str,
    method: &'a str,
    args: &'a Value,
}

/// Client for one server and one credential.
pub struct RpcClient {
    transport: Box<dyn Transport>,
    credential: String,
}

impl RpcClient {
    /// Create a client on top of a transport.
    pub fn new(transport: Box<dyn Transport>, credential: impl Into<String>) -> Self {
        Self {
            transport,
            credential: credential.into(),
        }
    }

    /// Call a remote method and return its `result` field.
    ///
    /// `args` must be a JSON object of named parameters.
    ///
    /// # Errors
    ///
    /// - `Error::Transport` if the channel fails
    /// - `Error::Protocol` if the response id does not echo ours
    /// - `Error::Api` if the server returned a non-null `error`
    pub fn call(&self, method: &str, args: Value) -> Result<Value> {
        if !args.is_object() {
            return Err(Error::InvalidResponse(format!(
                "arguments for {} must be an object",
                method
            )));
        }

        let id = uuid::Uuid::new_v4().to_string();
        log::debug!("rpc {} -> {}", id, method);

        let request = serde_json::to_value(Request {
            id: &id,
            api_key: &self.credential,
            method,
            args: &args,
        })?;
        let mut response = self.transport.send(&request)?;

        match response.get("id") {
            Some(Value::String(received)) if *received == id => {}
            other => {
                return Err(Error::Protocol {
                    sent: id,
                    received: other.map_or_else(|| "null".to_string(), render_id),
                });
            }
        }

        match response.get_mut("error").map(Value::take) {
            None | Some(Value::Null) => {}
            Some(error) => {
                log::debug!("rpc {} <- error", id);
                return Err(Error::Api(error));
            }
        }

        Ok(response
            .get_mut("result")
            .map(Value::take)
            .unwrap_or(Value::Null))
    }
}

fn render_id(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
