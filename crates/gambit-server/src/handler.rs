//! Per-connection session: protocol events in, room operations out.
//!
//! Each accepted connection gets its own task running this handler. A
//! session is bound to at most one room; the bound room's handle is
//! cached so actions and chat go straight to the room actor without
//! touching the registry. All outbound traffic funnels through one
//! unbounded channel drained by a writer task, which preserves the
//! per-connection ordering of room broadcasts.

use std::sync::{Arc, Mutex as StdMutex};

use gambit_room::{Oracle, RoomError, RoomHandle};
use gambit_wire::{
    ClientEvent, Codec, ConnectionId, RoleLabel, RoomName, ServerEvent,
};
use tokio::sync::mpsc;

use crate::net::WsConnection;
use crate::server::ServerState;

/// The room a session is currently bound to.
struct BoundRoom {
    name: RoomName,
    handle: RoomHandle,
}

/// Shared with the drop guard so cleanup sees the latest binding.
type Binding = Arc<StdMutex<Option<BoundRoom>>>;

/// Drop guard that runs the disconnect sequence when the session task
/// exits — including by panic. `Drop` is synchronous, so the async
/// registry work is handed to a fresh task.
struct DisconnectGuard<O: Oracle> {
    conn_id: ConnectionId,
    binding: Binding,
    state: Arc<ServerState<O>>,
}

impl<O: Oracle> Drop for DisconnectGuard<O> {
    fn drop(&mut self) {
        let bound = self
            .binding
            .lock()
            .map(|mut binding| binding.take())
            .unwrap_or(None);
        let Some(bound) = bound else {
            return;
        };
        let state = Arc::clone(&self.state);
        let conn_id = self.conn_id;
        tokio::spawn(async move {
            state.registry.lock().await.leave(&bound.name, conn_id).await;
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<O: Oracle>(
    conn: WsConnection,
    state: Arc<ServerState<O>>,
) {
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "session started");

    let (mut writer, mut reader) = conn.into_split();
    let (outbound, mut outbound_rx) = mpsc::unbounded_channel::<ServerEvent>();

    // Writer task: the only place this connection's socket is written.
    // Exits when every sender (session + room) is gone, then closes
    // the socket.
    let codec = state.codec;
    tokio::spawn(async move {
        while let Some(event) = outbound_rx.recv().await {
            let frame = match codec.encode(&event) {
                Ok(frame) => frame,
                Err(e) => {
                    tracing::warn!(error = %e, "failed to encode outbound event");
                    continue;
                }
            };
            if writer.send(frame).await.is_err() {
                break;
            }
        }
        writer.close().await;
    });

    let binding: Binding = Arc::new(StdMutex::new(None));
    let _guard = DisconnectGuard {
        conn_id,
        binding: Arc::clone(&binding),
        state: Arc::clone(&state),
    };

    loop {
        match reader.recv().await {
            Ok(Some(frame)) => {
                let event: ClientEvent = match state.codec.decode(&frame) {
                    Ok(event) => event,
                    Err(e) => {
                        tracing::debug!(
                            %conn_id,
                            error = %e,
                            "undecodable client event, ignoring"
                        );
                        continue;
                    }
                };
                dispatch(conn_id, event, &state, &binding, &outbound).await;
            }
            Ok(None) => {
                tracing::debug!(%conn_id, "connection closed");
                break;
            }
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "receive error");
                break;
            }
        }
    }

    // _guard drops here → disconnect sequence fires.
}

/// Routes one inbound event to the registry or the bound room.
async fn dispatch<O: Oracle>(
    conn_id: ConnectionId,
    event: ClientEvent,
    state: &Arc<ServerState<O>>,
    binding: &Binding,
    outbound: &mpsc::UnboundedSender<ServerEvent>,
) {
    match event {
        ClientEvent::CreateRoom {
            room_name,
            display_name,
        } => {
            if already_bound(binding, outbound) {
                return;
            }
            let result = {
                let mut registry = state.registry.lock().await;
                registry
                    .create(
                        room_name.clone(),
                        conn_id,
                        display_name,
                        outbound.clone(),
                    )
                    .await
            };
            finish_join(conn_id, room_name, result, binding, outbound);
        }

        ClientEvent::JoinRoom {
            room_name,
            display_name,
        } => {
            if already_bound(binding, outbound) {
                return;
            }
            let result = {
                let mut registry = state.registry.lock().await;
                registry
                    .join(&room_name, conn_id, display_name, outbound.clone())
                    .await
            };
            finish_join(conn_id, room_name, result, binding, outbound);
        }

        ClientEvent::Move { room_name, action } => {
            let Some(handle) = bound_handle(binding, &room_name) else {
                tracing::debug!(
                    %conn_id,
                    room = %room_name,
                    "action for a room this connection is not in, dropping"
                );
                return;
            };
            if handle.submit_action(conn_id, action).await.is_err() {
                tracing::debug!(%conn_id, room = %room_name, "room unavailable");
            }
        }

        ClientEvent::SpectatorResponse { room_name, accept } => {
            let Some(handle) = bound_handle(binding, &room_name) else {
                return;
            };
            if handle.claim_seat(conn_id, accept).await.is_err() {
                tracing::debug!(%conn_id, room = %room_name, "room unavailable");
            }
        }

        ClientEvent::SendMessage {
            room_name,
            display_name,
            text,
        } => {
            let Some(handle) = bound_handle(binding, &room_name) else {
                return;
            };
            if handle.chat(conn_id, display_name, text).await.is_err() {
                tracing::debug!(%conn_id, room = %room_name, "room unavailable");
            }
        }
    }
}

/// Rejects a second create/join while the session is already bound.
fn already_bound(
    binding: &Binding,
    outbound: &mpsc::UnboundedSender<ServerEvent>,
) -> bool {
    let bound = binding
        .lock()
        .map(|binding| binding.is_some())
        .unwrap_or(false);
    if bound {
        let _ = outbound.send(ServerEvent::Error {
            message: "already in a room".into(),
        });
    }
    bound
}

/// Completes a create/join: on success, bind the session; on failure,
/// surface the structural rejection as an `error` event. Role, board
/// state, and roster events were already delivered by the room actor.
fn finish_join(
    conn_id: ConnectionId,
    room_name: RoomName,
    result: Result<(RoleLabel, RoomHandle), RoomError>,
    binding: &Binding,
    outbound: &mpsc::UnboundedSender<ServerEvent>,
) {
    match result {
        Ok((role, handle)) => {
            tracing::info!(%conn_id, room = %room_name, %role, "session bound to room");
            if let Ok(mut binding) = binding.lock() {
                *binding = Some(BoundRoom {
                    name: room_name,
                    handle,
                });
            }
        }
        Err(e) => {
            let _ = outbound.send(ServerEvent::Error {
                message: e.to_string(),
            });
        }
    }
}

/// The cached handle, but only when the named room is the bound one.
/// Events naming any other room are authorization noise and are
/// dropped by the callers.
fn bound_handle(binding: &Binding, room_name: &RoomName) -> Option<RoomHandle> {
    binding
        .lock()
        .ok()
        .and_then(|binding| {
            binding
                .as_ref()
                .filter(|b| &b.name == room_name)
                .map(|b| b.handle.clone())
        })
}
