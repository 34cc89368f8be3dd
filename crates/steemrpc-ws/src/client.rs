//! WebSocket session: one text frame out, one text frame back.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::debug;

use steemrpc_core::error::TransportError;
use steemrpc_core::pool::EndpointKind;
use steemrpc_core::session::Session;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// An open WebSocket connection to one node.
pub struct WsSession {
    url: String,
    stream: WsStream,
}

impl WsSession {
    /// Open the connection. No login is performed here.
    pub async fn connect(url: impl Into<String>) -> Result<Self, TransportError> {
        let url = url.into();
        let (stream, _) = connect_async(url.as_str())
            .await
            .map_err(|e| TransportError::WebSocket(e.to_string()))?;
        debug!(url = %url, "WebSocket open");
        Ok(Self { url, stream })
    }
}

#[async_trait]
impl Session for WsSession {
    async fn send(&mut self, envelope: &str) -> Result<String, TransportError> {
        self.stream
            .send(Message::Text(envelope.to_owned().into()))
            .await
            .map_err(|e| TransportError::WebSocket(e.to_string()))?;

        loop {
            match self.stream.next().await {
                None | Some(Ok(Message::Close(_))) => return Err(TransportError::Closed),
                Some(Err(e)) => return Err(TransportError::WebSocket(e.to_string())),
                Some(Ok(Message::Text(text))) => return Ok(text.to_string()),
                Some(Ok(Message::Binary(bytes))) => {
                    return String::from_utf8(bytes.to_vec())
                        .map_err(|e| TransportError::WebSocket(format!("non-UTF-8 reply: {e}")));
                }
                Some(Ok(Message::Ping(payload))) => {
                    self.stream
                        .send(Message::Pong(payload))
                        .await
                        .map_err(|e| TransportError::WebSocket(e.to_string()))?;
                }
                Some(Ok(_)) => {}
            }
        }
    }

    async fn close(&mut self) {
        if let Err(e) = self.stream.close(None).await {
            debug!(url = %self.url, error = %e, "error while closing WebSocket");
        }
    }

    fn kind(&self) -> EndpointKind {
        EndpointKind::Stream
    }

    fn url(&self) -> &str {
        &self.url
    }
}
