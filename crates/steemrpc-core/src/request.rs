//! JSON-RPC wire types for the `call` envelope.
//!
//! Every request is sent as
//! `{"method":"call","params":[<api>, <method>, [args...]],"jsonrpc":"2.0","id":<n>}`
//! where `<api>` is either a numeric capability id (WebSocket nodes) or a
//! capability name such as `"database_api"` (HTTP nodes).

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Capability identifier the login and API lookup calls are sent to.
pub const LOGIN_API_ID: u64 = 1;

/// Capability id used when a WebSocket call names no API.
pub const DEFAULT_API_ID: u64 = 0;

/// Capability name used when an HTTP call names no API.
pub const DEFAULT_API_NAME: &str = "database_api";

/// The capability a call is addressed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ApiTarget {
    /// Server-assigned numeric id (WebSocket sessions).
    Id(u64),
    /// Full capability name, e.g. `"database_api"` (HTTP sessions).
    Name(String),
}

impl fmt::Display for ApiTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Name(name) => write!(f, "{name}"),
        }
    }
}

impl From<u64> for ApiTarget {
    fn from(id: u64) -> Self {
        Self::Id(id)
    }
}

impl From<&str> for ApiTarget {
    fn from(name: &str) -> Self {
        Self::Name(name.to_owned())
    }
}

/// Strip a trailing `_api` so `"database_api"` and `"database"` name the
/// same capability.
pub fn short_api_name(name: &str) -> &str {
    name.strip_suffix("_api").unwrap_or(name)
}

/// A single `call` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    pub params: (ApiTarget, String, Vec<Value>),
    pub id: u64,
}

impl JsonRpcRequest {
    /// Build a `call` envelope for `method` on `api`.
    pub fn call(id: u64, api: ApiTarget, method: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            method: "call".into(),
            params: (api, method.into(), args),
            id,
        }
    }

    /// Target capability.
    pub fn api(&self) -> &ApiTarget {
        &self.params.0
    }

    /// Name of the remote method being invoked.
    pub fn remote_method(&self) -> &str {
        &self.params.1
    }

    /// Encode the envelope as JSON text.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn call_envelope_shape() {
        let req = JsonRpcRequest::call(7, ApiTarget::Id(2), "get_block", vec![json!(100)]);
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(
            value,
            json!({
                "jsonrpc": "2.0",
                "method": "call",
                "params": [2, "get_block", [100]],
                "id": 7
            })
        );
    }

    #[test]
    fn named_target_serializes_as_string() {
        let req = JsonRpcRequest::call(1, "condenser_api".into(), "get_config", vec![]);
        let json = req.to_json().unwrap();
        assert!(json.contains(r#""params":["condenser_api","get_config",[]]"#));
    }

    #[test]
    fn envelope_parses_back() {
        let raw = r#"{"method":"call","params":[1,"login",["",""]],"jsonrpc":"2.0","id":1}"#;
        let req: JsonRpcRequest = serde_json::from_str(raw).unwrap();
        assert_eq!(req.api(), &ApiTarget::Id(LOGIN_API_ID));
        assert_eq!(req.remote_method(), "login");
        assert_eq!(req.params.2, vec![json!(""), json!("")]);
    }

    #[test]
    fn short_names() {
        assert_eq!(short_api_name("database_api"), "database");
        assert_eq!(short_api_name("network_broadcast"), "network_broadcast");
        assert_eq!(short_api_name("_api"), "");
    }
}
