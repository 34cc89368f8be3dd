//! Client construction parameters.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::policy::RetryConfig;

fn default_apis() -> Vec<String> {
    vec!["database".into(), "network_broadcast".into()]
}

fn default_backoff_unit_ms() -> u64 {
    1000
}

/// Configuration for a [`NodeRpc`](crate::client::NodeRpc) instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Node addresses, tried in order and cycled on failure.
    pub urls: Vec<String>,
    /// Login name sent to WebSocket nodes. Empty for anonymous access.
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
    /// Capabilities registered on every WebSocket session.
    #[serde(default = "default_apis")]
    pub apis: Vec<String>,
    /// Retry bound for both connect and call phases. `None` = unlimited.
    #[serde(default)]
    pub num_retries: Option<u32>,
    /// Backoff time unit in milliseconds.
    #[serde(default = "default_backoff_unit_ms")]
    pub backoff_unit_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            urls: Vec::new(),
            user: String::new(),
            password: String::new(),
            apis: default_apis(),
            num_retries: None,
            backoff_unit_ms: default_backoff_unit_ms(),
        }
    }
}

impl ClientConfig {
    pub fn new<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            urls: urls.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn with_credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.user = user.into();
        self.password = password.into();
        self
    }

    pub fn with_apis<I, S>(mut self, apis: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.apis = apis.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_num_retries(mut self, num_retries: Option<u32>) -> Self {
        self.num_retries = num_retries;
        self
    }

    pub fn with_backoff_unit(mut self, unit: Duration) -> Self {
        self.backoff_unit_ms = unit.as_millis().try_into().unwrap_or(u64::MAX);
        self
    }

    /// Retry settings derived from this configuration.
    pub fn retry(&self) -> RetryConfig {
        RetryConfig {
            max_retries: self.num_retries,
            backoff_unit: Duration::from_millis(self.backoff_unit_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_from_minimal_json() {
        let cfg: ClientConfig = serde_json::from_str(r#"{"urls":["wss://node.example.com"]}"#).unwrap();
        assert_eq!(cfg.user, "");
        assert_eq!(cfg.apis, vec!["database", "network_broadcast"]);
        assert_eq!(cfg.num_retries, None);
        assert_eq!(cfg.retry().backoff_unit, Duration::from_secs(1));
    }

    #[test]
    fn builder_overrides() {
        let cfg = ClientConfig::new(["https://a.example.com", "https://b.example.com"])
            .with_credentials("alice", "secret")
            .with_apis(["database_api", "follow"])
            .with_num_retries(Some(3))
            .with_backoff_unit(Duration::from_millis(5));
        assert_eq!(cfg.urls.len(), 2);
        assert_eq!(cfg.user, "alice");
        assert_eq!(cfg.apis, vec!["database_api", "follow"]);
        let retry = cfg.retry();
        assert_eq!(retry.max_retries, Some(3));
        assert_eq!(retry.backoff_unit, Duration::from_millis(5));
    }
}
