//! steemrpc-http: request-response [`Session`](steemrpc_core::Session) over
//! HTTP POST.
//!
//! One [`HttpPool`] owns a `reqwest::Client` and hands out cheap
//! [`HttpSession`]s that share its connection pool.

pub mod client;

pub use client::{HttpPool, HttpSession, HttpSessionConfig};
