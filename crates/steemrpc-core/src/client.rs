//! The client. Owns the connection lifecycle, API registration, retry and
//! the generic `call` dispatcher.
//!
//! ```text
//! call ──► [Interrupt check] ──► session? ──no──► next endpoint ─► open ─► login ─► register
//!                                   │yes                                             │
//!                                   ▼                                                ▼
//!                                 send ◄─────────────────────────────────────────────┘
//!                                   │ transport error: close, back off, retry same id
//!                                   ▼
//!                               classify ──► result | ApiError | ...
//! ```

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use steemrpc_chains::ChainParams;

use crate::classify::classify_reply;
use crate::config::ClientConfig;
use crate::error::{RpcError, TransportError};
use crate::policy::{Interrupt, RetryConfig, RetryPolicy};
use crate::pool::{Endpoint, EndpointKind, EndpointPool};
use crate::request::{
    short_api_name, ApiTarget, JsonRpcRequest, DEFAULT_API_ID, DEFAULT_API_NAME, LOGIN_API_ID,
};
use crate::session::{Connector, Session};

/// Per-call overrides for [`NodeRpc::call_with`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallOptions {
    /// Capability name, with or without the `_api` suffix.
    pub api: Option<String>,
    /// Explicit target. Takes precedence over `api`.
    pub api_id: Option<ApiTarget>,
    /// Retry bound for this call only. `Some(None)` = unlimited.
    pub num_retries: Option<Option<u32>>,
}

impl CallOptions {
    pub fn with_api(mut self, api: impl Into<String>) -> Self {
        self.api = Some(api.into());
        self
    }

    pub fn with_api_id(mut self, target: impl Into<ApiTarget>) -> Self {
        self.api_id = Some(target.into());
        self
    }

    pub fn with_num_retries(mut self, num_retries: Option<u32>) -> Self {
        self.num_retries = Some(num_retries);
        self
    }
}

/// Resilient client for one Steem-family network.
///
/// Methods take `&mut self`, so one call is in flight at a time. Wrap the
/// client in a `tokio::sync::Mutex` to share it between tasks.
pub struct NodeRpc<C: Connector> {
    connector: C,
    pool: EndpointPool,
    session: Option<Box<dyn Session>>,
    kind: EndpointKind,
    /// Address of the most recently opened endpoint.
    url: String,
    user: String,
    password: String,
    /// Short capability names registered on every stream session.
    apis: Vec<String>,
    api_ids: HashMap<String, u64>,
    retry: RetryConfig,
    next_id: u64,
    interrupt: Interrupt,
    chain: Option<&'static ChainParams>,
}

impl<C: Connector> NodeRpc<C> {
    /// Build a client without touching the network.
    pub fn new(config: ClientConfig, connector: C) -> Result<Self, RpcError> {
        let pool = EndpointPool::from_urls(&config.urls)?;
        let first = pool.peek();
        let kind = first.kind();
        let url = first.url().to_owned();
        let mut apis: Vec<String> = Vec::with_capacity(config.apis.len());
        for name in &config.apis {
            let short = short_api_name(name).to_owned();
            if !apis.contains(&short) {
                apis.push(short);
            }
        }
        Ok(Self {
            connector,
            pool,
            session: None,
            kind,
            url,
            retry: config.retry(),
            user: config.user,
            password: config.password,
            apis,
            api_ids: HashMap::new(),
            next_id: 1,
            interrupt: Interrupt::new(),
            chain: None,
        })
    }

    /// Connect, register capabilities and identify the network.
    pub async fn connect(config: ClientConfig, connector: C) -> Result<Self, RpcError> {
        Self::connect_with_interrupt(config, connector, Interrupt::new()).await
    }

    /// Like [`connect`](Self::connect), observing a caller-owned interrupt.
    pub async fn connect_with_interrupt(
        config: ClientConfig,
        connector: C,
        interrupt: Interrupt,
    ) -> Result<Self, RpcError> {
        let mut rpc = Self::new(config, connector)?;
        rpc.interrupt = interrupt;
        rpc.reconnect().await?;
        rpc.get_network().await?;
        Ok(rpc)
    }

    /// A handle that aborts this client's retry loops when triggered.
    pub fn interrupt(&self) -> Interrupt {
        self.interrupt.clone()
    }

    /// Chain identified at connect time.
    pub fn chain_params(&self) -> Option<&'static ChainParams> {
        self.chain
    }

    /// Transport family of the current (or next) session.
    pub fn endpoint_kind(&self) -> EndpointKind {
        self.kind
    }

    /// Address of the most recently opened endpoint.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Numeric id the current stream session assigned to `api`.
    pub fn api_id(&self, api: &str) -> Option<u64> {
        self.api_ids.get(short_api_name(api)).copied()
    }

    /// Call `method` with positional `args` on the default capability.
    pub async fn call(&mut self, method: &str, args: Vec<Value>) -> Result<Value, RpcError> {
        self.call_with(method, args, CallOptions::default()).await
    }

    /// Call `method` with per-call options.
    pub async fn call_with(
        &mut self,
        method: &str,
        args: Vec<Value>,
        options: CallOptions,
    ) -> Result<Value, RpcError> {
        let policy = RetryPolicy::new(RetryConfig {
            max_retries: options.num_retries.unwrap_or(self.retry.max_retries),
            backoff_unit: self.retry.backoff_unit,
        });
        let mut id = None;
        let mut attempt = 0u32;
        loop {
            self.interrupt.check()?;
            match self.try_send(&mut id, method, &args, &options).await {
                Err(RpcError::Transport(err)) => {
                    attempt += 1;
                    back_off(&self.interrupt, &policy, attempt, err, "call", &self.url).await?;
                }
                outcome => return outcome,
            }
        }
    }

    /// Call `method` and deserialize the result into `T`.
    pub async fn call_as<T: DeserializeOwned>(
        &mut self,
        method: &str,
        args: Vec<Value>,
    ) -> Result<T, RpcError> {
        let value = self.call(method, args).await?;
        serde_json::from_value(value).map_err(|e| RpcError::InvalidResponse(e.to_string()))
    }

    /// Add capabilities to the registration list and resolve them on the
    /// current stream session. No-op on request-response sessions.
    ///
    /// Names that fail to resolve are not kept for later reconnections.
    pub async fn register_apis(&mut self, names: &[&str]) -> Result<(), RpcError> {
        let previous = self.apis.clone();
        for name in names {
            let short = short_api_name(name).to_owned();
            if !self.apis.contains(&short) {
                self.apis.push(short);
            }
        }
        let outcome = self.register_on_session().await;
        if matches!(outcome, Err(RpcError::NoAccessApi { .. })) {
            self.apis = previous;
        }
        outcome
    }

    async fn register_on_session(&mut self) -> Result<(), RpcError> {
        if self.kind != EndpointKind::Stream {
            return Ok(());
        }
        let Some(mut session) = self.session.take() else {
            return self.reconnect().await;
        };
        match self.resolve_apis(session.as_mut()).await {
            Err(RpcError::Transport(err)) => {
                warn!(url = %self.url, error = %err, "registration failed, reconnecting");
                session.close().await;
                self.reconnect().await
            }
            Err(RpcError::Interrupted) => {
                session.close().await;
                Err(RpcError::Interrupted)
            }
            outcome => {
                self.session = Some(session);
                outcome
            }
        }
    }

    /// Query `get_dynamic_global_properties` and match the supply symbol
    /// against the chain registry.
    pub async fn get_network(&mut self) -> Result<&'static ChainParams, RpcError> {
        let props = self.call("get_dynamic_global_properties", vec![]).await?;
        let supply = props
            .get("current_supply")
            .and_then(Value::as_str)
            .ok_or_else(|| RpcError::InvalidResponse("missing `current_supply`".into()))?;
        let symbol = supply
            .split_whitespace()
            .nth(1)
            .ok_or_else(|| RpcError::InvalidResponse(format!("malformed supply `{supply}`")))?;
        let params = steemrpc_chains::by_symbol(symbol).ok_or_else(|| RpcError::UnsupportedChain {
            symbol: symbol.to_owned(),
        })?;
        info!(symbol, prefix = params.prefix, "identified chain");
        self.chain = Some(params);
        Ok(params)
    }

    /// Close the current session, if any. The next call reconnects.
    pub async fn close(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.close().await;
        }
    }

    // ─── Connection lifecycle ──────────────────────────────────────────────

    /// Replace the current session, cycling through the pool under the
    /// connect-phase retry bound.
    async fn reconnect(&mut self) -> Result<(), RpcError> {
        self.close().await;
        let policy = RetryPolicy::new(self.retry.clone());
        let mut attempt = 0u32;
        loop {
            self.interrupt.check()?;
            let endpoint = self.pool.next().clone();
            match self.establish(&endpoint).await {
                Ok(session) => {
                    self.session = Some(session);
                    return Ok(());
                }
                Err(RpcError::Transport(err)) => {
                    attempt += 1;
                    back_off(&self.interrupt, &policy, attempt, err, "connect", endpoint.url())
                        .await?;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Open `endpoint`; on stream sessions log in and register capabilities.
    async fn establish(&mut self, endpoint: &Endpoint) -> Result<Box<dyn Session>, RpcError> {
        self.url = endpoint.url().to_owned();
        debug!(url = %endpoint, kind = %endpoint.kind(), "opening session");
        let mut session = self
            .interrupt
            .guard(self.connector.open(endpoint))
            .await??;
        if endpoint.kind() == EndpointKind::Stream {
            if let Err(e) = self.handshake(session.as_mut()).await {
                session.close().await;
                return Err(e);
            }
        } else {
            self.api_ids.clear();
        }
        self.kind = endpoint.kind();
        info!(url = %endpoint, kind = %endpoint.kind(), "connected");
        Ok(session)
    }

    async fn handshake(&mut self, session: &mut dyn Session) -> Result<(), RpcError> {
        let login = JsonRpcRequest::call(
            self.take_id(),
            ApiTarget::Id(LOGIN_API_ID),
            "login",
            vec![Value::from(self.user.as_str()), Value::from(self.password.as_str())],
        );
        exchange(&self.interrupt, session, &login).await?;
        self.resolve_apis(session).await
    }

    /// Rebuild the capability table from scratch on `session`.
    async fn resolve_apis(&mut self, session: &mut dyn Session) -> Result<(), RpcError> {
        let mut ids = HashMap::with_capacity(self.apis.len());
        for short in self.apis.clone() {
            let full = format!("{short}_api");
            let request = JsonRpcRequest::call(
                self.take_id(),
                ApiTarget::Id(LOGIN_API_ID),
                "get_api_by_name",
                vec![Value::from(full.as_str())],
            );
            let id = exchange(&self.interrupt, session, &request)
                .await?
                .as_u64()
                .ok_or(RpcError::NoAccessApi { api: full })?;
            debug!(api = %short, id, "registered capability");
            ids.insert(short, id);
        }
        self.api_ids = ids;
        Ok(())
    }

    // ─── Dispatch ──────────────────────────────────────────────────────────

    /// One attempt: make sure a session exists, then send the envelope.
    /// The request id is allocated on the first attempt and reused afterwards.
    async fn try_send(
        &mut self,
        id: &mut Option<u64>,
        method: &str,
        args: &[Value],
        options: &CallOptions,
    ) -> Result<Value, RpcError> {
        let mut session = match self.session.take() {
            Some(session) => session,
            None => {
                let endpoint = self.pool.next().clone();
                self.establish(&endpoint).await?
            }
        };
        let target = match self.resolve_target(session.kind(), options) {
            Ok(target) => target,
            Err(e) => {
                self.session = Some(session);
                return Err(e);
            }
        };
        let id = *id.get_or_insert_with(|| self.take_id());
        let request = JsonRpcRequest::call(id, target, method, args.to_vec());
        let outcome = exchange(&self.interrupt, session.as_mut(), &request).await;
        match &outcome {
            Err(RpcError::Transport(_)) | Err(RpcError::Interrupted) => session.close().await,
            _ => self.session = Some(session),
        }
        outcome
    }

    fn resolve_target(&self, kind: EndpointKind, options: &CallOptions) -> Result<ApiTarget, RpcError> {
        if let Some(target) = &options.api_id {
            return Ok(target.clone());
        }
        match (options.api.as_deref(), kind) {
            (Some(api), EndpointKind::Stream) => self
                .api_ids
                .get(short_api_name(api))
                .map(|id| ApiTarget::Id(*id))
                .ok_or_else(|| RpcError::UnknownApi { api: api.to_owned() }),
            (Some(api), EndpointKind::RequestResponse) => {
                Ok(ApiTarget::Name(format!("{}_api", short_api_name(api))))
            }
            (None, EndpointKind::Stream) => Ok(ApiTarget::Id(DEFAULT_API_ID)),
            (None, EndpointKind::RequestResponse) => Ok(ApiTarget::Name(DEFAULT_API_NAME.into())),
        }
    }

    fn take_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

/// Send one envelope on `session` and classify the reply.
async fn exchange(
    interrupt: &Interrupt,
    session: &mut dyn Session,
    request: &JsonRpcRequest,
) -> Result<Value, RpcError> {
    let envelope = request.to_json()?;
    debug!(
        id = request.id,
        api = %request.api(),
        method = request.remote_method(),
        url = session.url(),
        "sending"
    );
    let reply = interrupt.guard(session.send(&envelope)).await??;
    debug!(id = request.id, bytes = reply.len(), "reply received");
    classify_reply(&reply)
}

/// Record a failed attempt: fail once the bound is exceeded, otherwise wait
/// out the backoff.
async fn back_off(
    interrupt: &Interrupt,
    policy: &RetryPolicy,
    attempt: u32,
    err: TransportError,
    phase: &str,
    url: &str,
) -> Result<(), RpcError> {
    if !policy.should_retry(attempt) {
        error!(phase, attempt, url, error = %err, "retry bound exceeded");
        return Err(RpcError::MaxRetriesReached {
            attempts: attempt,
            last_error: err,
        });
    }
    let delay = policy.next_delay(attempt);
    warn!(
        phase,
        attempt,
        max_retries = ?policy.config.max_retries,
        delay_ms = delay.as_millis() as u64,
        url,
        error = %err,
        "attempt failed, retrying"
    );
    if !delay.is_zero() {
        interrupt.sleep(delay).await?;
    }
    Ok(())
}
