//! `RelayServer` builder and accept loop.

use std::sync::Arc;

use gambit_room::{Oracle, RoomRegistry};
use gambit_wire::JsonCodec;
use tokio::sync::Mutex;

use crate::ServerError;
use crate::handler::handle_connection;
use crate::net::WsListener;

/// Shared server state passed to each connection session task.
///
/// The registry mutex is held only across name-keyed operations
/// (create/join/leave); per-room traffic goes through handles cached
/// by each session, so unrelated rooms never contend here.
pub(crate) struct ServerState<O: Oracle> {
    pub(crate) registry: Mutex<RoomRegistry<O>>,
    pub(crate) codec: JsonCodec,
}

/// Builder for configuring and starting a relay server.
pub struct RelayServerBuilder {
    bind_addr: String,
}

impl RelayServerBuilder {
    /// Creates a builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Binds the listener and builds the server around `oracle`.
    pub async fn build<O: Oracle>(
        self,
        oracle: O,
    ) -> Result<RelayServer<O>, ServerError> {
        let listener = WsListener::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            registry: Mutex::new(RoomRegistry::new(oracle)),
            codec: JsonCodec,
        });

        Ok(RelayServer { listener, state })
    }
}

impl Default for RelayServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running relay server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct RelayServer<O: Oracle> {
    listener: WsListener,
    state: Arc<ServerState<O>>,
}

impl<O: Oracle> RelayServer<O> {
    /// Creates a new builder.
    pub fn builder() -> RelayServerBuilder {
        RelayServerBuilder::new()
    }

    /// The local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Runs the accept loop, spawning a session task per connection.
    /// Runs until the process is terminated.
    pub async fn run(self) -> Result<(), ServerError> {
        tracing::info!("relay server running");

        loop {
            match self.listener.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(handle_connection(conn, state));
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
