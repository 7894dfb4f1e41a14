//! Push transports: a raw WebSocket and Socket.IO over WebSocket.

use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use shared::protocol::OutboundFrame;
use tokio::net::TcpStream;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{self, Message},
    MaybeTlsStream, WebSocketStream,
};
use tracing::{debug, info};
use url::Url;

use crate::socket_io::{self, Packet};

const SOCKET_IO_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[async_trait]
pub trait PushConnector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn PushConnection>>;
}

#[async_trait]
pub trait PushConnection: Send {
    /// Next JSON text payload. `None` once the remote side has closed.
    async fn next_frame(&mut self) -> Option<Result<String>>;
    async fn send_heartbeat(&mut self) -> Result<()>;
}

pub struct WebSocketConnector {
    url: String,
}

impl WebSocketConnector {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait]
impl PushConnector for WebSocketConnector {
    async fn connect(&self) -> Result<Box<dyn PushConnection>> {
        let (stream, _) = connect_async(self.url.as_str())
            .await
            .with_context(|| format!("failed to connect websocket: {}", self.url))?;
        Ok(Box::new(WebSocketConnection { stream }))
    }
}

struct WebSocketConnection {
    stream: WsStream,
}

#[async_trait]
impl PushConnection for WebSocketConnection {
    async fn next_frame(&mut self) -> Option<Result<String>> {
        next_text(&mut self.stream).await
    }

    async fn send_heartbeat(&mut self) -> Result<()> {
        let frame = serde_json::to_string(&OutboundFrame::Ping)?;
        self.stream
            .send(Message::Text(frame))
            .await
            .context("failed to send keep-alive frame")
    }
}

pub struct SocketIoConnector {
    url: Url,
    namespace: String,
    event: String,
}

impl SocketIoConnector {
    pub fn new(base_url: &str, namespace: &str, event: impl Into<String>) -> Result<Self> {
        Ok(Self {
            url: socket_io::transport_url(base_url)?,
            namespace: socket_io::normalize_namespace(namespace),
            event: event.into(),
        })
    }

    async fn handshake(&self, stream: &mut WsStream) -> Result<()> {
        while let Some(frame) = next_text(stream).await {
            let frame = frame?;
            match socket_io::decode(&frame) {
                Ok(Packet::Open) => {
                    stream
                        .send(Message::Text(socket_io::connect_frame(&self.namespace)))
                        .await
                        .context("failed to join socket.io namespace")?;
                }
                Ok(Packet::Ping) => {
                    stream
                        .send(Message::Text(socket_io::PONG.to_string()))
                        .await
                        .context("failed to answer socket.io ping")?;
                }
                Ok(Packet::Connect { namespace }) if namespace == self.namespace => return Ok(()),
                Ok(Packet::ConnectError { namespace, message }) if namespace == self.namespace => {
                    bail!("socket.io namespace {namespace} refused connection: {message}");
                }
                Ok(Packet::Close) => bail!("socket.io server closed during handshake"),
                Ok(_) => {}
                Err(err) => debug!(%err, "socket.io: ignoring frame during handshake"),
            }
        }
        Err(anyhow!("socket.io server closed during handshake"))
    }
}

#[async_trait]
impl PushConnector for SocketIoConnector {
    async fn connect(&self) -> Result<Box<dyn PushConnection>> {
        let (mut stream, _) = connect_async(self.url.as_str())
            .await
            .with_context(|| format!("failed to connect socket.io transport: {}", self.url))?;
        tokio::time::timeout(SOCKET_IO_HANDSHAKE_TIMEOUT, self.handshake(&mut stream))
            .await
            .context("socket.io handshake timed out")??;
        info!(namespace = %self.namespace, event = %self.event, "socket.io: joined namespace");
        Ok(Box::new(SocketIoConnection {
            stream,
            namespace: self.namespace.clone(),
            event: self.event.clone(),
        }))
    }
}

struct SocketIoConnection {
    stream: WsStream,
    namespace: String,
    event: String,
}

#[async_trait]
impl PushConnection for SocketIoConnection {
    async fn next_frame(&mut self) -> Option<Result<String>> {
        loop {
            let frame = match next_text(&mut self.stream).await? {
                Ok(frame) => frame,
                Err(err) => return Some(Err(err)),
            };
            match socket_io::decode(&frame) {
                Ok(Packet::Ping) => {
                    if let Err(err) = self
                        .stream
                        .send(Message::Text(socket_io::PONG.to_string()))
                        .await
                    {
                        return Some(Err(anyhow!(err).context("failed to answer socket.io ping")));
                    }
                }
                Ok(Packet::Event {
                    namespace,
                    name,
                    args,
                }) if namespace == self.namespace && name == self.event => {
                    if let Some(payload) = args.into_iter().next() {
                        return Some(Ok(payload.to_string()));
                    }
                }
                Ok(Packet::Disconnect { namespace }) if namespace == self.namespace => return None,
                Ok(Packet::Close) => return None,
                Ok(_) => {}
                Err(err) => debug!(%err, "socket.io: ignoring frame"),
            }
        }
    }

    /// Engine.IO keep-alive is driven by server pings, answered in
    /// `next_frame`.
    async fn send_heartbeat(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Reads until the next text payload. Binary frames are accepted when they
/// hold UTF-8; control frames are skipped.
async fn next_text(stream: &mut WsStream) -> Option<Result<String>> {
    while let Some(msg) = stream.next().await {
        match msg {
            Ok(Message::Text(text)) => return Some(Ok(text)),
            Ok(Message::Binary(bytes)) => match String::from_utf8(bytes) {
                Ok(text) => return Some(Ok(text)),
                Err(_) => debug!("websocket: skipping non UTF-8 binary frame"),
            },
            Ok(Message::Close(_)) => return None,
            Ok(_) => {}
            Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                return None
            }
            Err(err) => return Some(Err(anyhow!(err).context("websocket receive failed"))),
        }
    }
    None
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
