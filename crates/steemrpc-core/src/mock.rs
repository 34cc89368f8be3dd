//! Scripted in-memory node used by the client tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::TransportError;
use crate::pool::{Endpoint, EndpointKind};
use crate::request::JsonRpcRequest;
use crate::session::{Connector, Session};

#[derive(Debug, Default)]
pub(crate) struct MockState {
    /// Full capability name → id answered by `get_api_by_name`.
    pub apis: HashMap<String, u64>,
    pub supply: String,
    /// Number of upcoming `open` calls to refuse.
    pub fail_opens: u32,
    pub always_fail_open: bool,
    /// Method → number of upcoming sends of it to drop.
    pub fail_calls: HashMap<String, u32>,
    /// Method → canned reply object.
    pub replies: HashMap<String, Value>,
    /// Never answer sends.
    pub hang_sends: bool,
    pub open_attempts: Vec<String>,
    pub sent: Vec<(String, JsonRpcRequest)>,
    pub closed: u32,
}

impl MockState {
    /// A STEEM node exposing `database_api` (2) and `network_broadcast_api` (3).
    pub fn steem() -> Self {
        Self {
            apis: HashMap::from([
                ("database_api".to_owned(), 2),
                ("network_broadcast_api".to_owned(), 3),
            ]),
            supply: "271578.000 STEEM".into(),
            ..Default::default()
        }
    }

    fn answer(&mut self, url: &str, envelope: &str) -> Result<String, TransportError> {
        let request: JsonRpcRequest =
            serde_json::from_str(envelope).map_err(|e| TransportError::Other(e.to_string()))?;
        self.sent.push((url.to_owned(), request.clone()));

        let method = request.remote_method().to_owned();
        if let Some(left) = self.fail_calls.get_mut(&method).filter(|n| **n > 0) {
            *left -= 1;
            return Err(TransportError::Closed);
        }

        let mut reply = match method.as_str() {
            "login" => json!({ "result": true }),
            "get_api_by_name" => {
                let name = request.params.2.first().and_then(Value::as_str).unwrap_or("");
                json!({ "result": self.apis.get(name) })
            }
            "get_dynamic_global_properties" => json!({
                "result": { "head_block_number": 1, "current_supply": self.supply }
            }),
            other => self.replies.get(other).cloned().unwrap_or_else(|| {
                json!({ "result": { "method": other, "args": request.params.2 } })
            }),
        };
        reply["jsonrpc"] = json!("2.0");
        reply["id"] = json!(request.id);
        Ok(reply.to_string())
    }
}

#[derive(Debug, Clone)]
pub(crate) struct MockConnector {
    state: Arc<Mutex<MockState>>,
}

impl MockConnector {
    pub fn new(state: MockState) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    pub fn with_state(&self, f: impl FnOnce(&mut MockState)) {
        f(&mut self.lock());
    }

    pub fn sent(&self) -> Vec<(String, JsonRpcRequest)> {
        self.lock().sent.clone()
    }

    pub fn last_sent(&self) -> JsonRpcRequest {
        self.lock().sent.last().map(|(_, r)| r.clone()).unwrap()
    }

    pub fn open_attempts(&self) -> Vec<String> {
        self.lock().open_attempts.clone()
    }

    pub fn closed(&self) -> u32 {
        self.lock().closed
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn open(&mut self, endpoint: &Endpoint) -> Result<Box<dyn Session>, TransportError> {
        let mut state = self.lock();
        state.open_attempts.push(endpoint.url().to_owned());
        if state.always_fail_open {
            return Err(TransportError::WebSocket("connection refused".into()));
        }
        if state.fail_opens > 0 {
            state.fail_opens -= 1;
            return Err(TransportError::WebSocket("connection refused".into()));
        }
        Ok(Box::new(MockSession {
            url: endpoint.url().to_owned(),
            kind: endpoint.kind(),
            state: Arc::clone(&self.state),
        }))
    }
}

struct MockSession {
    url: String,
    kind: EndpointKind,
    state: Arc<Mutex<MockState>>,
}

#[async_trait]
impl Session for MockSession {
    async fn send(&mut self, envelope: &str) -> Result<String, TransportError> {
        let outcome = {
            let mut state = self.state.lock().unwrap();
            if state.hang_sends {
                None
            } else {
                Some(state.answer(&self.url, envelope))
            }
        };
        match outcome {
            Some(reply) => reply,
            None => std::future::pending().await,
        }
    }

    async fn close(&mut self) {
        self.state.lock().unwrap().closed += 1;
    }

    fn kind(&self) -> EndpointKind {
        self.kind
    }

    fn url(&self) -> &str {
        &self.url
    }
}
