//! steemrpc-ws: persistent-stream [`Session`](steemrpc_core::Session) over
//! WebSocket.
//!
//! # Features
//! - One long-lived connection per session, strict request/reply order
//! - Ping frames answered with pong
//! - `wss://` through rustls with the webpki root store

pub mod client;

pub use client::WsSession;
