//! steemrpc-core: connection, retry and dispatch engine for Steem-family
//! JSON-RPC nodes.
//!
//! # Overview
//!
//! The core crate defines:
//!
//! - [`Session`] / [`Connector`]: the transport abstraction (WebSocket and
//!   HTTP implementations live in `steemrpc-ws` and `steemrpc-http`)
//! - [`EndpointPool`]: round-robin list of node addresses
//! - [`policy`] module: bounded retry with linear backoff and interruption
//! - [`NodeRpc`]: the client, with connection lifecycle, API registration and
//!   the generic `call` dispatcher
//! - [`classify`] module: maps node error messages to [`ApiError`]s
//! - [`RpcError`]: structured error type

pub mod classify;
pub mod client;
pub mod config;
pub mod error;
pub mod policy;
pub mod pool;
pub mod request;
pub mod session;

#[cfg(test)]
mod mock;

pub use client::{CallOptions, NodeRpc};
pub use config::ClientConfig;
pub use error::{ApiError, RpcError, TransportError};
pub use policy::{Interrupt, RetryConfig, RetryPolicy};
pub use pool::{Endpoint, EndpointKind, EndpointPool};
pub use request::{ApiTarget, JsonRpcRequest};
pub use session::{Connector, Session};
pub use steemrpc_chains::ChainParams;
