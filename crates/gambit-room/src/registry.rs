//! Room registry: the name-keyed map of live rooms.
//!
//! The registry is the only place rooms are created and destroyed.
//! It is not thread-safe by itself — the server wraps it in an async
//! mutex and holds the lock across each name-keyed operation, which is
//! what makes create/create races single-winner and "room emptied →
//! room removed" atomic with respect to later creates of the same
//! name. Per-room traffic (actions, chat) goes through cached
//! [`RoomHandle`]s and never touches the registry.

use std::collections::HashMap;
use std::sync::Arc;

use gambit_wire::{ConnectionId, RoleLabel, RoomName};

use crate::room::spawn_room;
use crate::{MemberSender, Oracle, RoomError, RoomHandle};

/// Command channel capacity for room actors.
const DEFAULT_CHANNEL_SIZE: usize = 64;

/// Maps room names to running room actors.
pub struct RoomRegistry<O: Oracle> {
    oracle: Arc<O>,
    rooms: HashMap<RoomName, RoomHandle>,
}

impl<O: Oracle> RoomRegistry<O> {
    /// Creates an empty registry. Every room it spawns shares `oracle`.
    pub fn new(oracle: O) -> Self {
        Self {
            oracle: Arc::new(oracle),
            rooms: HashMap::new(),
        }
    }

    /// Creates a room and joins the requester to it in one step.
    ///
    /// Exactly one `create` for a given name can win; the rest get
    /// [`RoomError::AlreadyExists`] until the room is destroyed.
    pub async fn create(
        &mut self,
        name: RoomName,
        conn_id: ConnectionId,
        display_name: String,
        sender: MemberSender,
    ) -> Result<(RoleLabel, RoomHandle), RoomError> {
        if self.rooms.contains_key(&name) {
            return Err(RoomError::AlreadyExists(name));
        }

        let handle = spawn_room(
            name.clone(),
            Arc::clone(&self.oracle),
            DEFAULT_CHANNEL_SIZE,
        );
        self.rooms.insert(name.clone(), handle.clone());
        tracing::info!(room = %name, "room created");

        match handle.join(conn_id, display_name, sender).await {
            Ok(role) => Ok((role, handle)),
            Err(e) => {
                // A join into a brand-new room only fails if the actor
                // died; don't leave the corpse registered.
                self.remove(&name);
                Err(e)
            }
        }
    }

    /// Joins the requester to an existing room.
    pub async fn join(
        &mut self,
        name: &RoomName,
        conn_id: ConnectionId,
        display_name: String,
        sender: MemberSender,
    ) -> Result<(RoleLabel, RoomHandle), RoomError> {
        let handle = self
            .rooms
            .get(name)
            .cloned()
            .ok_or_else(|| RoomError::NotFound(name.clone()))?;
        let role = handle.join(conn_id, display_name, sender).await?;
        Ok((role, handle))
    }

    /// Runs the disconnect sequence for `conn_id` against `name`.
    ///
    /// Idempotent: a missing room, or a connection the room no longer
    /// knows, is a no-op. A room that reports itself empty — or whose
    /// actor is unreachable — is removed before this returns, so no
    /// later operation on the name can see a dead room.
    pub async fn leave(&mut self, name: &RoomName, conn_id: ConnectionId) {
        let Some(handle) = self.rooms.get(name).cloned() else {
            return;
        };
        match handle.leave(conn_id).await {
            Ok(outcome) if outcome.now_empty => self.remove(name),
            Ok(_) => {}
            Err(_) => self.remove(name),
        }
    }

    /// Unregisters and stops a room. Idempotent.
    pub fn remove(&mut self, name: &RoomName) {
        if let Some(handle) = self.rooms.remove(name) {
            handle.shutdown();
            tracing::info!(room = %name, "room destroyed");
        }
    }

    /// A handle to the named room, if live.
    pub fn get(&self, name: &RoomName) -> Option<RoomHandle> {
        self.rooms.get(name).cloned()
    }

    /// Whether a room with this name is live.
    pub fn contains(&self, name: &RoomName) -> bool {
        self.rooms.contains_key(name)
    }

    /// Number of live rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}
