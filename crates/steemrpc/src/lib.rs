//! steemrpc: resilient JSON-RPC client for Steem-family blockchain nodes.
//!
//! # Quick start
//! ```rust,no_run
//! use steemrpc::ClientConfig;
//!
//! # async fn run() -> Result<(), steemrpc::RpcError> {
//! let config = ClientConfig::new(["wss://node.example.com", "https://api.example.com"]);
//! let mut rpc = steemrpc::connect(config).await?;
//! let block = rpc.call("get_block", vec![1.into()]).await?;
//! println!("{block}");
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use tracing::debug;

pub use steemrpc_chains as chains;
pub use steemrpc_core::{
    classify, ApiError, ApiTarget, CallOptions, ChainParams, ClientConfig, Connector, Endpoint,
    EndpointKind, EndpointPool, Interrupt, NodeRpc, RetryConfig, RpcError, Session,
    TransportError,
};
pub use steemrpc_http::{HttpPool, HttpSession, HttpSessionConfig};
pub use steemrpc_ws::WsSession;

/// Opens a [`WsSession`] for `ws`/`wss` endpoints and an [`HttpSession`]
/// for `http`/`https` ones.
///
/// The HTTP pool is built on first use and shared by every later HTTP
/// session, so reconnections reuse pooled connections.
#[derive(Debug, Default)]
pub struct NetworkConnector {
    http_config: HttpSessionConfig,
    http: Option<HttpPool>,
}

impl NetworkConnector {
    pub fn new(http_config: HttpSessionConfig) -> Self {
        Self {
            http_config,
            http: None,
        }
    }

    fn http_pool(&mut self) -> Result<&HttpPool, TransportError> {
        let pool = match self.http.take() {
            Some(pool) => pool,
            None => HttpPool::new(self.http_config.clone())?,
        };
        Ok(self.http.insert(pool))
    }
}

#[async_trait]
impl Connector for NetworkConnector {
    async fn open(&mut self, endpoint: &Endpoint) -> Result<Box<dyn Session>, TransportError> {
        debug!(url = %endpoint, kind = %endpoint.kind(), "opening");
        match endpoint.kind() {
            EndpointKind::Stream => Ok(Box::new(WsSession::connect(endpoint.url()).await?)),
            EndpointKind::RequestResponse => Ok(Box::new(self.http_pool()?.session(endpoint.url()))),
        }
    }
}

/// Client over real WebSocket and HTTP transports.
pub type SteemNodeRpc = NodeRpc<NetworkConnector>;

/// Connect with default HTTP settings.
pub async fn connect(config: ClientConfig) -> Result<SteemNodeRpc, RpcError> {
    NodeRpc::connect(config, NetworkConnector::default()).await
}

/// Connect, observing a caller-owned [`Interrupt`].
pub async fn connect_with_interrupt(
    config: ClientConfig,
    interrupt: Interrupt,
) -> Result<SteemNodeRpc, RpcError> {
    NodeRpc::connect_with_interrupt(config, NetworkConnector::default(), interrupt).await
}
