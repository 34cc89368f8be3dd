//! The `Session` trait (one live connection to one node) and the
//! `Connector` that opens sessions for endpoints.

use async_trait::async_trait;

use crate::error::TransportError;
use crate::pool::{Endpoint, EndpointKind};

/// A live connection to a single endpoint.
///
/// # Ordering
/// One `send` yields exactly the reply to the envelope it sent. Sessions
/// are used by one call at a time and need not be `Sync`.
///
/// # Object Safety
/// The trait is object-safe and is stored as `Box<dyn Session>`.
#[async_trait]
pub trait Session: Send {
    /// Send one JSON envelope and return the raw reply text.
    async fn send(&mut self, envelope: &str) -> Result<String, TransportError>;

    /// Tear the connection down. Errors while closing are logged, not returned.
    async fn close(&mut self);

    /// Transport family of this session.
    fn kind(&self) -> EndpointKind;

    /// The endpoint address this session is connected to.
    fn url(&self) -> &str;
}

/// Opens sessions, choosing the transport by [`Endpoint::kind`].
///
/// Implementations may keep resources (such as an HTTP connection pool)
/// alive across sessions.
#[async_trait]
pub trait Connector: Send {
    async fn open(&mut self, endpoint: &Endpoint) -> Result<Box<dyn Session>, TransportError>;
}
