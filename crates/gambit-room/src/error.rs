//! Error types for the room layer.

use gambit_wire::{ConnectionId, RoomName};

/// Errors that can occur during registry and room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// A room with this name is already live.
    #[error("room {0} already exists")]
    AlreadyExists(RoomName),

    /// No room with this name exists.
    #[error("room {0} does not exist")]
    NotFound(RoomName),

    /// The connection is already a member of this room.
    #[error("{0} already joined room {1}")]
    AlreadyJoined(ConnectionId, RoomName),

    /// The room's command channel is closed or full — the actor is
    /// gone or wedged.
    #[error("room {0} is unavailable")]
    Unavailable(RoomName),
}
