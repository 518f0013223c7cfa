//! WebSocket listener and connections via `tokio-tungstenite`.
//!
//! Connections split into a reader and a writer half: the session task
//! reads inbound frames while a separate writer task drains the
//! outbound queue, so a room broadcast never waits behind a blocked
//! read.

use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use gambit_wire::ConnectionId;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;

use crate::ServerError;

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

type WsStream = tokio_tungstenite::WebSocketStream<TcpStream>;

/// Listens for incoming WebSocket connections.
pub(crate) struct WsListener {
    listener: TcpListener,
}

impl WsListener {
    /// Binds to the given address.
    pub(crate) async fn bind(addr: &str) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(addr).await.map_err(ServerError::Bind)?;
        tracing::info!(addr, "listening for WebSocket connections");
        Ok(Self { listener })
    }

    /// The local address the listener is bound to.
    pub(crate) fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Waits for and upgrades the next incoming connection.
    pub(crate) async fn accept(&self) -> Result<WsConnection, ServerError> {
        let (stream, addr) = self
            .listener
            .accept()
            .await
            .map_err(ServerError::Accept)?;

        let ws = tokio_tungstenite::accept_async(stream)
            .await
            .map_err(ServerError::Handshake)?;

        let id =
            ConnectionId(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed));
        tracing::debug!(%id, %addr, "accepted WebSocket connection");

        Ok(WsConnection { id, ws })
    }
}

/// A single accepted WebSocket connection.
pub(crate) struct WsConnection {
    id: ConnectionId,
    ws: WsStream,
}

impl WsConnection {
    pub(crate) fn id(&self) -> ConnectionId {
        self.id
    }

    /// Splits into independently-owned writer and reader halves.
    pub(crate) fn into_split(self) -> (WsWriter, WsReader) {
        let (sink, stream) = self.ws.split();
        (WsWriter { sink }, WsReader { stream })
    }
}

/// The write half: sends text frames.
pub(crate) struct WsWriter {
    sink: SplitSink<WsStream, Message>,
}

impl WsWriter {
    pub(crate) async fn send(&mut self, frame: String) -> Result<(), ServerError> {
        self.sink
            .send(Message::Text(frame.into()))
            .await
            .map_err(ServerError::Send)
    }

    pub(crate) async fn close(&mut self) {
        let _ = self.sink.close().await;
    }
}

/// The read half: receives text frames.
pub(crate) struct WsReader {
    stream: SplitStream<WsStream>,
}

impl WsReader {
    /// Receives the next text frame.
    ///
    /// Returns `Ok(None)` when the peer closes the connection. Binary
    /// frames holding valid UTF-8 are accepted as text; ping/pong and
    /// other control frames are skipped.
    pub(crate) async fn recv(&mut self) -> Result<Option<String>, ServerError> {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => {
                    return Ok(Some(text.as_str().to_owned()));
                }
                Some(Ok(Message::Binary(data))) => {
                    match String::from_utf8(data.into()) {
                        Ok(text) => return Ok(Some(text)),
                        Err(_) => continue,
                    }
                }
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(ServerError::Receive(e)),
            }
        }
    }
}
