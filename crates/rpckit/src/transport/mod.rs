//! Transport trait and implementations for carrying RPC envelopes.
//!
//! The [`Transport`] moves one JSON request object to the server and hands
//! back the decoded JSON response object. It knows nothing about ids, errors
//! or results; that is [`crate::RpcClient`]'s job. The production
//! implementation is [`http::HttpTransport`].
//!
//! # Testing
//!
//! Use [`MockTransport`] to play the server without network access:
//!
//! ```
//! use rpckit::{MockTransport, RpcClient};
//! use serde_json::json;
//!
//! let mock = MockTransport::new();
//! mock.respond("get_server_info", json!({"kallithea_version": "0.7.0"}));
//!
//! let client = RpcClient::new(Box::new(mock.clone()), "secret");
//! let info = client.call("get_server_info", json!({})).unwrap();
//! assert_eq!(info["kallithea_version"], "0.7.0");
//! assert_eq!(mock.calls().len(), 1);
//! ```

pub mod http;

use crate::error::{Error, Result};
use serde_json::{Map, Value, json};
use std::sync::{Arc, Mutex};

/// Carries one request envelope to the server and returns the response.
pub trait Transport: Send + Sync {
    /// Send a request object and decode the response object.
    ///
    /// # Errors
    ///
    /// Returns `Error::Transport` for non-success statuses or I/O failures
    /// and `Error::InvalidResponse` if the body is not JSON.
    fn send(&self, request: &Value) -> Result<Value>;
}

/// A call the mock transport has seen.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    /// Remote method name.
    pub method: String,
    /// Named arguments.
    pub args: Map<String, Value>,
}

impl RecordedCall {
    /// Get a string argument.
    #[must_use]
    pub fn arg(&self, name: &str) -> Option<&str> {
        self.args.get(name).and_then(Value::as_str)
    }

    /// Whether this call reads state only.
    #[must_use]
    pub fn is_read(&self) -> bool {
        self.method.starts_with("get_")
    }
}

#[derive(Debug, Clone)]
enum Reply {
    Result(Value),
    Error(Value),
}

#[derive(Debug, Clone)]
struct Rule {
    method: String,
    when: Option<(String, Value)>,
    reply: Reply,
}

impl Rule {
    fn matches(&self, method: &str, args: &Map<String, Value>) -> bool {
        self.method == method
            && match &self.when {
                Some((name, value)) => args.get(name) == Some(value),
                None => true,
            }
    }
}

#[derive(Debug, Default)]
struct MockState {
    rules: Vec<Rule>,
    fallback: Option<Value>,
    calls: Vec<RecordedCall>,
    status: Option<u16>,
    corrupt_ids: bool,
}

/// In-memory server double.
///
/// Rules are matched newest first, so a later `respond` overrides an earlier
/// one for the same method. Methods with no rule answer with an API error
/// unless a fallback result is set. Clones share state, so a test can keep a
/// handle after boxing one into a client.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    /// Create a new mock with no rules.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every call to `method` with `result`.
    pub fn respond(&self, method: &str, result: Value) {
        self.push_rule(method, None, Reply::Result(result));
    }

    /// Answer calls to `method` whose argument `arg` equals `value`.
    pub fn respond_when(&self, method: &str, arg: &str, value: impl Into<Value>, result: Value) {
        self.push_rule(method, Some((arg.to_string(), value.into())), Reply::Result(result));
    }

    /// Answer every call to `method` with an API error payload.
    pub fn fail(&self, method: &str, error: Value) {
        self.push_rule(method, None, Reply::Error(error));
    }

    /// Answer methods without a rule with `result` instead of an error.
    pub fn respond_by_default(&self, result: Value) {
        self.state.lock().unwrap().fallback = Some(result);
    }

    /// Make every request fail at the transport level with `status`.
    pub fn fail_with_status(&self, status: u16) {
        self.state.lock().unwrap().status = Some(status);
    }

    /// Echo a different id than the one received.
    pub fn corrupt_ids(&self) {
        self.state.lock().unwrap().corrupt_ids = true;
    }

    /// Every call seen so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Calls that are not reads (`get_*`), in order.
    #[must_use]
    pub fn write_calls(&self) -> Vec<RecordedCall> {
        self.calls().into_iter().filter(|c| !c.is_read()).collect()
    }

    /// Calls to one method, in order.
    #[must_use]
    pub fn calls_to(&self, method: &str) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.method == method)
            .collect()
    }

    fn push_rule(&self, method: &str, when: Option<(String, Value)>, reply: Reply) {
        self.state.lock().unwrap().rules.push(Rule {
            method: method.to_string(),
            when,
            reply,
        });
    }
}

impl Transport for MockTransport {
    fn send(&self, request: &Value) -> Result<Value> {
        let mut state = self.state.lock().unwrap();

        if let Some(status) = state.status {
            return Err(Error::transport(format!("HTTP {}", status), Some(status)));
        }

        let method = request["method"]
            .as_str()
            .ok_or_else(|| Error::InvalidResponse("request without method".to_string()))?
            .to_string();
        let args = request["args"].as_object().cloned().unwrap_or_default();

        state.calls.push(RecordedCall {
            method: method.clone(),
            args: args.clone(),
        });

        let id = if state.corrupt_ids {
            json!(format!("{}-corrupted", request["id"].as_str().unwrap_or_default()))
        } else {
            request["id"].clone()
        };

        let reply = state
            .rules
            .iter()
            .rev()
            .find(|rule| rule.matches(&method, &args))
            .map(|rule| rule.reply.clone())
            .or_else(|| state.fallback.clone().map(Reply::Result))
            .unwrap_or_else(|| Reply::Error(json!(format!("no mock response for {}", method))));

        Ok(match reply {
            Reply::Result(result) => json!({"id": id, "result": result, "error": null}),
            Reply::Error(error) => json!({"id": id, "result": null, "error": error}),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(method: &str, args: Value) -> Value {
        json!({"id": "abc", "api_key": "k", "method": method, "args": args})
    }

    #[test]
    fn test_mock_echoes_id_and_result() {
        let mock = MockTransport::new();
        mock.respond("get_repos", json!([]));

        let response = mock.send(&request("get_repos", json!({}))).unwrap();
        assert_eq!(response["id"], "abc");
        assert_eq!(response["result"], json!([]));
        assert!(response["error"].is_null());
    }

    #[test]
    fn test_mock_unknown_method_is_api_error() {
        let mock = MockTransport::new();
        let response = mock.send(&request("get_repo", json!({}))).unwrap();
        assert!(response["result"].is_null());
        assert_eq!(response["error"], "no mock response for get_repo");
    }

    #[test]
    fn test_mock_later_rule_wins() {
        let mock = MockTransport::new();
        mock.respond("get_repos", json!([1]));
        mock.respond("get_repos", json!([2]));

        let response = mock.send(&request("get_repos", json!({}))).unwrap();
        assert_eq!(response["result"], json!([2]));
    }

    #[test]
    fn test_mock_respond_when_matches_argument() {
        let mock = MockTransport::new();
        mock.respond("get_user", json!({"username": "default"}));
        mock.respond_when("get_user", "userid", "alice", json!({"username": "alice"}));

        let alice = mock.send(&request("get_user", json!({"userid": "alice"}))).unwrap();
        let bob = mock.send(&request("get_user", json!({"userid": "bob"}))).unwrap();
        assert_eq!(alice["result"]["username"], "alice");
        assert_eq!(bob["result"]["username"], "default");
    }

    #[test]
    fn test_mock_fallback() {
        let mock = MockTransport::new();
        mock.respond_by_default(json!({"msg": "ok"}));
        let response = mock.send(&request("delete_repo", json!({}))).unwrap();
        assert_eq!(response["result"]["msg"], "ok");
    }

    #[test]
    fn test_mock_records_calls_and_writes() {
        let mock = MockTransport::new();
        mock.respond_by_default(json!(null));
        mock.send(&request("get_repos", json!({}))).unwrap();
        mock.send(&request("delete_repo", json!({"repoid": "x"}))).unwrap();

        assert_eq!(mock.calls().len(), 2);
        let writes = mock.write_calls();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].method, "delete_repo");
        assert_eq!(writes[0].arg("repoid"), Some("x"));
        assert_eq!(mock.calls_to("get_repos").len(), 1);
    }

    #[test]
    fn test_mock_status_failure() {
        let mock = MockTransport::new();
        mock.fail_with_status(503);
        let err = mock.send(&request("get_repos", json!({}))).unwrap_err();
        assert!(matches!(err, Error::Transport { status: Some(503), .. }));
        assert!(mock.calls().is_empty());
    }

    #[test]
    fn test_mock_clone_shares_state() {
        let mock = MockTransport::new();
        let handle = mock.clone();
        mock.respond("get_repos", json!([]));
        handle.send(&request("get_repos", json!({}))).unwrap();
        assert_eq!(mock.calls().len(), 1);
    }
}
