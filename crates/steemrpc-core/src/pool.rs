//! Endpoint list with round-robin selection.

use std::fmt;
use std::str::FromStr;

use url::Url;

use crate::error::RpcError;

/// Transport family of an endpoint, decided by its URL scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointKind {
    /// `ws://` or `wss://`: one long-lived connection with login and API registration.
    Stream,
    /// `http://` or `https://`: one POST per call, no handshake.
    RequestResponse,
}

impl fmt::Display for EndpointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stream => write!(f, "stream"),
            Self::RequestResponse => write!(f, "request-response"),
        }
    }
}

/// A node address plus its transport family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    url: String,
    kind: EndpointKind,
}

impl Endpoint {
    /// Parse `url`, accepting the `ws`, `wss`, `http` and `https` schemes.
    pub fn parse(url: &str) -> Result<Self, RpcError> {
        let parsed = Url::parse(url).map_err(|e| RpcError::InvalidEndpoint {
            url: url.to_owned(),
            reason: e.to_string(),
        })?;
        let kind = match parsed.scheme() {
            "ws" | "wss" => EndpointKind::Stream,
            "http" | "https" => EndpointKind::RequestResponse,
            other => {
                return Err(RpcError::InvalidEndpoint {
                    url: url.to_owned(),
                    reason: format!("unsupported scheme `{other}`; expected ws, wss, http or https"),
                })
            }
        };
        Ok(Self {
            url: url.to_owned(),
            kind,
        })
    }

    /// The address exactly as configured.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn kind(&self) -> EndpointKind {
        self.kind
    }
}

impl FromStr for Endpoint {
    type Err = RpcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

/// Cyclic, ordered list of endpoints.
///
/// [`next`](Self::next) never runs out: after the last endpoint it starts
/// over at the first, so connection loss can cycle through the pool without
/// bound. A single endpoint is a pool of size one.
#[derive(Debug, Clone)]
pub struct EndpointPool {
    endpoints: Vec<Endpoint>,
    cursor: usize,
}

impl EndpointPool {
    /// Build a pool from already-parsed endpoints.
    pub fn new(endpoints: Vec<Endpoint>) -> Result<Self, RpcError> {
        if endpoints.is_empty() {
            return Err(RpcError::NoEndpoints);
        }
        Ok(Self {
            endpoints,
            cursor: 0,
        })
    }

    /// Parse and pool a list of addresses.
    pub fn from_urls<I, S>(urls: I) -> Result<Self, RpcError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let endpoints = urls
            .into_iter()
            .map(|u| Endpoint::parse(u.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(endpoints)
    }

    /// Return the endpoint at the cursor and advance it.
    pub fn next(&mut self) -> &Endpoint {
        let idx = self.cursor;
        self.cursor = (self.cursor + 1) % self.endpoints.len();
        &self.endpoints[idx]
    }

    /// The endpoint the next call to [`next`](Self::next) will return.
    pub fn peek(&self) -> &Endpoint {
        &self.endpoints[self.cursor]
    }

    /// Number of endpoints in the pool.
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    /// Always `false`: an empty pool cannot be constructed.
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Endpoint> {
        self.endpoints.iter()
    }
}
