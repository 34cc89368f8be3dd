//! Error types for the transport, classification and client layers.

use serde_json::Value;
use thiserror::Error;

/// Errors raised by a [`Session`](crate::session::Session) while talking to a node.
///
/// Every variant is transient from the client's point of view: the retry
/// engine closes the session, rotates to the next endpoint and tries again.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// HTTP request failed (connection refused, reset, bad gateway, etc.).
    #[error("HTTP error: {0}")]
    Http(String),

    /// WebSocket connection/send/receive error.
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// Request timed out after the configured duration.
    #[error("Request timed out after {ms}ms")]
    Timeout { ms: u64 },

    /// The peer closed the connection before replying.
    #[error("connection closed by peer")]
    Closed,

    /// An unexpected error.
    #[error("{0}")]
    Other(String),
}

/// Known application-level failures reported by a node.
///
/// Each variant carries the decoded server message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("already transacted this block: {0}")]
    AlreadyTransactedThisBlock(String),

    #[error("missing required posting authority: {0}")]
    MissingRequiredPostingAuthority(String),

    #[error("vote weight too small: {0}")]
    VoteWeightTooSmall(String),

    #[error("only one vote every 3 seconds: {0}")]
    OnlyVoteOnceEvery3Seconds(String),

    #[error("already voted similarly: {0}")]
    AlreadyVotedSimilarly(String),

    #[error("only one post every 5 minutes: {0}")]
    PostOnlyEvery5Min(String),

    #[error("duplicate transaction: {0}")]
    DuplicateTransaction(String),

    #[error("exceeded allowed bandwidth: {0}")]
    ExceededAllowedBandwidth(String),

    #[error("no such method: {0}")]
    NoMethodWithName(String),
}

impl ApiError {
    /// The server message this error was classified from.
    pub fn message(&self) -> &str {
        match self {
            Self::AlreadyTransactedThisBlock(m)
            | Self::MissingRequiredPostingAuthority(m)
            | Self::VoteWeightTooSmall(m)
            | Self::OnlyVoteOnceEvery3Seconds(m)
            | Self::AlreadyVotedSimilarly(m)
            | Self::PostOnlyEvery5Min(m)
            | Self::DuplicateTransaction(m)
            | Self::ExceededAllowedBandwidth(m)
            | Self::NoMethodWithName(m) => m,
        }
    }
}

/// Errors surfaced by [`NodeRpc`](crate::client::NodeRpc).
#[derive(Debug, Error)]
pub enum RpcError {
    /// A transport failure. Absorbed by the retry engine; callers only see
    /// it wrapped in [`RpcError::MaxRetriesReached`].
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The retry bound was exceeded.
    #[error("maximum retries reached after {attempts} attempts: {last_error}")]
    MaxRetriesReached {
        attempts: u32,
        #[source]
        last_error: TransportError,
    },

    /// The node replied with something that is not a JSON-RPC reply.
    #[error("Client returned invalid format. Expected JSON! ({0})")]
    InvalidResponse(String),

    /// A capability name could not be resolved during registration.
    #[error("No permission to access {api} API")]
    NoAccessApi { api: String },

    /// A call named a capability that was never registered.
    #[error("Unknown API! Verify that you have registered to {api}")]
    UnknownApi { api: String },

    /// The connected node reports a supply symbol missing from the registry.
    #[error("The chain you are connecting to is not supported (symbol: {symbol})")]
    UnsupportedChain { symbol: String },

    /// An endpoint address could not be used.
    #[error("invalid endpoint `{url}`: {reason}")]
    InvalidEndpoint { url: String, reason: String },

    /// The endpoint list is empty.
    #[error("no endpoints configured")]
    NoEndpoints,

    /// A recognised application-level failure.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// A non-empty server error message that matched no known condition.
    #[error("Unhandled RPC error: {0}")]
    UnhandledRpcError(String),

    /// A server error without any message text, passed through unchanged.
    #[error("RPC error: {0}")]
    Rpc(Value),

    /// The caller interrupted the operation.
    #[error("interrupted")]
    Interrupted,

    /// The request could not be encoded.
    #[error("failed to encode request: {0}")]
    Encode(#[from] serde_json::Error),
}

impl RpcError {
    /// Returns `true` if the node answered with an application-level error.
    pub fn is_application_error(&self) -> bool {
        matches!(
            self,
            Self::Api(_) | Self::UnhandledRpcError(_) | Self::Rpc(_)
        )
    }

    /// Returns `true` for errors caused by invalid client configuration.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownApi { .. }
                | Self::UnsupportedChain { .. }
                | Self::InvalidEndpoint { .. }
                | Self::NoEndpoints
        )
    }
}
