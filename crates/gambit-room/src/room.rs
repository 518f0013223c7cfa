//! Room actor: an isolated Tokio task that owns one game session.
//!
//! Each room runs in its own task, communicating with the outside
//! world through an mpsc channel. All reads-then-writes of a room's
//! state happen inside the actor loop, one command at a time, so no
//! two operations on the same room can interleave. Different rooms are
//! different tasks and proceed fully in parallel.

use std::collections::HashMap;
use std::sync::Arc;

use gambit_wire::{
    Action, ConnectionId, RoleLabel, RoomName, RosterEntry, ServerEvent, Side,
};
use tokio::sync::{mpsc, oneshot};

use crate::{Oracle, RoomError};

/// Channel sender delivering outbound events to one member's
/// connection. Unbounded: a broadcast never blocks the room on a slow
/// recipient, and a dead recipient just makes `send` fail.
pub type MemberSender = mpsc::UnboundedSender<ServerEvent>;

/// A room member: the connection it arrived on and the name it chose.
#[derive(Debug, Clone)]
struct Occupant {
    conn_id: ConnectionId,
    display_name: String,
}

/// Where a connection sits inside a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Seated(Side),
    Onlooker,
}

impl Role {
    fn label(self) -> RoleLabel {
        match self {
            Role::Seated(side) => RoleLabel::for_side(side),
            Role::Onlooker => RoleLabel::Onlooker,
        }
    }
}

/// Commands sent to a room actor through its channel.
///
/// Join and leave carry a oneshot reply channel because their callers
/// need the outcome; action, seat-claim, and chat are fire-and-forget
/// — their failure modes are silent by design.
pub(crate) enum RoomCommand {
    Join {
        conn_id: ConnectionId,
        display_name: String,
        sender: MemberSender,
        reply: oneshot::Sender<Result<RoleLabel, RoomError>>,
    },

    Leave {
        conn_id: ConnectionId,
        reply: oneshot::Sender<LeaveOutcome>,
    },

    SubmitAction {
        conn_id: ConnectionId,
        action: Action,
    },

    ClaimSeat {
        conn_id: ConnectionId,
        accept: bool,
    },

    Chat {
        conn_id: ConnectionId,
        display_name: Option<String>,
        text: String,
    },

    Shutdown,
}

/// The result of removing a connection from a room.
#[derive(Debug, Clone, Copy)]
pub struct LeaveOutcome {
    /// True when the room has no members left and must be dropped from
    /// the registry before anything else touches its name.
    pub now_empty: bool,
}

/// Handle to a running room actor.
///
/// Cheap to clone — just an `mpsc::Sender` wrapper. The registry holds
/// one per room; each bound connection caches another so the hot paths
/// (actions, chat) skip the registry entirely.
#[derive(Clone)]
pub struct RoomHandle {
    name: RoomName,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    /// The room's name.
    pub fn name(&self) -> &RoomName {
        &self.name
    }

    /// Runs the join sequence for `conn_id` and returns the assigned
    /// role. Role, position, and roster events are delivered through
    /// `sender` by the actor itself, in order.
    pub async fn join(
        &self,
        conn_id: ConnectionId,
        display_name: String,
        sender: MemberSender,
    ) -> Result<RoleLabel, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Join {
                conn_id,
                display_name,
                sender,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::Unavailable(self.name.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.name.clone()))?
    }

    /// Removes `conn_id` from the room (idempotent) and reports
    /// whether the room emptied.
    pub async fn leave(
        &self,
        conn_id: ConnectionId,
    ) -> Result<LeaveOutcome, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Leave {
                conn_id,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::Unavailable(self.name.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.name.clone()))
    }

    /// Submits an action (fire-and-forget).
    pub async fn submit_action(
        &self,
        conn_id: ConnectionId,
        action: Action,
    ) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::SubmitAction { conn_id, action })
            .await
            .map_err(|_| RoomError::Unavailable(self.name.clone()))
    }

    /// Delivers an onlooker's answer to a seat offer (fire-and-forget).
    pub async fn claim_seat(
        &self,
        conn_id: ConnectionId,
        accept: bool,
    ) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::ClaimSeat { conn_id, accept })
            .await
            .map_err(|_| RoomError::Unavailable(self.name.clone()))
    }

    /// Relays a chat line (fire-and-forget).
    pub async fn chat(
        &self,
        conn_id: ConnectionId,
        display_name: Option<String>,
        text: String,
    ) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Chat {
                conn_id,
                display_name,
                text,
            })
            .await
            .map_err(|_| RoomError::Unavailable(self.name.clone()))
    }

    /// Tells the actor to stop. Best-effort: a full or closed channel
    /// means the actor is already on its way out.
    pub(crate) fn shutdown(&self) {
        let _ = self.sender.try_send(RoomCommand::Shutdown);
    }
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor<O: Oracle> {
    name: RoomName,
    oracle: Arc<O>,
    /// Serialized position, owned by the oracle's format. Replaced
    /// only on accepted actions.
    position: String,
    /// The two seats, indexed by `Side as usize`.
    seats: [Option<Occupant>; 2],
    /// Onlookers in join order (display order on the roster).
    onlookers: Vec<Occupant>,
    /// Reverse index: connection → role. Kept in lockstep with seats
    /// and onlookers on every membership mutation; the uniqueness
    /// invariant is exactly "each key appears here once".
    roles: HashMap<ConnectionId, Role>,
    /// Per-member outbound channels.
    senders: HashMap<ConnectionId, MemberSender>,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl<O: Oracle> RoomActor<O> {
    /// Runs the actor loop, processing commands until shutdown or
    /// until every handle is dropped.
    async fn run(mut self) {
        tracing::info!(room = %self.name, "room actor started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                RoomCommand::Join {
                    conn_id,
                    display_name,
                    sender,
                    reply,
                } => {
                    let result = self.handle_join(conn_id, display_name, sender);
                    let _ = reply.send(result);
                }
                RoomCommand::Leave { conn_id, reply } => {
                    let outcome = self.handle_leave(conn_id);
                    let _ = reply.send(outcome);
                }
                RoomCommand::SubmitAction { conn_id, action } => {
                    self.handle_action(conn_id, action);
                }
                RoomCommand::ClaimSeat { conn_id, accept } => {
                    self.handle_claim_seat(conn_id, accept);
                }
                RoomCommand::Chat {
                    conn_id,
                    display_name,
                    text,
                } => {
                    self.handle_chat(conn_id, display_name, text);
                }
                RoomCommand::Shutdown => break,
            }
        }

        tracing::info!(room = %self.name, "room actor stopped");
    }

    /// The join sequence: seat or onlooker assignment, then role and
    /// position to the requester, then roster to everyone.
    fn handle_join(
        &mut self,
        conn_id: ConnectionId,
        display_name: String,
        sender: MemberSender,
    ) -> Result<RoleLabel, RoomError> {
        if self.roles.contains_key(&conn_id) {
            return Err(RoomError::AlreadyJoined(conn_id, self.name.clone()));
        }

        let occupant = Occupant {
            conn_id,
            display_name,
        };
        let role = if self.seats[Side::First as usize].is_none() {
            self.seats[Side::First as usize] = Some(occupant);
            Role::Seated(Side::First)
        } else if self.seats[Side::Second as usize].is_none() {
            self.seats[Side::Second as usize] = Some(occupant);
            Role::Seated(Side::Second)
        } else {
            self.onlookers.push(occupant);
            Role::Onlooker
        };
        self.roles.insert(conn_id, role);
        self.senders.insert(conn_id, sender);

        tracing::info!(
            room = %self.name,
            %conn_id,
            role = %role.label(),
            members = self.member_count(),
            "member joined"
        );

        self.send_to(conn_id, ServerEvent::PlayerRole { role: role.label() });
        self.send_to(
            conn_id,
            ServerEvent::BoardState {
                position: self.position.clone(),
            },
        );
        self.broadcast_roster();

        Ok(role.label())
    }

    /// The disconnect/leave sequence. Unknown connections are a no-op;
    /// the caller may be retrying a disconnect against a room that
    /// already processed it.
    fn handle_leave(&mut self, conn_id: ConnectionId) -> LeaveOutcome {
        let Some(role) = self.roles.remove(&conn_id) else {
            return LeaveOutcome {
                now_empty: self.roles.is_empty(),
            };
        };
        self.senders.remove(&conn_id);

        match role {
            Role::Seated(side) => {
                self.seats[side as usize] = None;
                // Only a deserted player gets the notice; if both seats
                // are now empty there is nobody playing to inform.
                if self.seats[side.other() as usize].is_some() {
                    self.broadcast(ServerEvent::OpponentLeft { side });
                }
            }
            Role::Onlooker => {
                self.onlookers.retain(|o| o.conn_id != conn_id);
            }
        }

        tracing::info!(
            room = %self.name,
            %conn_id,
            members = self.member_count(),
            "member left"
        );

        if self.roles.is_empty() {
            LeaveOutcome { now_empty: true }
        } else {
            self.broadcast_roster();
            LeaveOutcome { now_empty: false }
        }
    }

    /// Turn-gated action submission.
    ///
    /// Unauthorized submissions (no seat, out of turn) are dropped
    /// without any event: clients race the server's state and treat
    /// the silence as expected noise. Only the oracle's rejection is
    /// surfaced, and only to the submitter.
    fn handle_action(&mut self, conn_id: ConnectionId, action: Action) {
        let side = match self.roles.get(&conn_id) {
            Some(Role::Seated(side)) => *side,
            _ => {
                tracing::debug!(
                    room = %self.name,
                    %conn_id,
                    "action from a connection without a seat, dropping"
                );
                return;
            }
        };

        if side != self.oracle.turn(&self.position) {
            tracing::debug!(
                room = %self.name,
                %conn_id,
                "out-of-turn action, dropping"
            );
            return;
        }

        match self.oracle.apply(&self.position, &action) {
            Ok(accepted) => {
                self.position = accepted.position;
                self.broadcast(ServerEvent::Move { action });
                self.broadcast(ServerEvent::BoardState {
                    position: self.position.clone(),
                });
                if accepted.terminal.is_terminal() {
                    tracing::info!(
                        room = %self.name,
                        "session reached a terminal position"
                    );
                }
            }
            Err(reason) => {
                tracing::debug!(
                    room = %self.name,
                    %conn_id,
                    %reason,
                    "action rejected"
                );
                self.send_to(conn_id, ServerEvent::InvalidMove { action });
            }
        }
    }

    /// Moves an accepting onlooker into the first empty seat, if any.
    fn handle_claim_seat(&mut self, conn_id: ConnectionId, accept: bool) {
        if !accept {
            return;
        }
        if self.roles.get(&conn_id) != Some(&Role::Onlooker) {
            tracing::debug!(
                room = %self.name,
                %conn_id,
                "seat claim from a non-onlooker, dropping"
            );
            return;
        }
        let side = if self.seats[Side::First as usize].is_none() {
            Side::First
        } else if self.seats[Side::Second as usize].is_none() {
            Side::Second
        } else {
            tracing::debug!(
                room = %self.name,
                %conn_id,
                "seat claim with both seats occupied, dropping"
            );
            return;
        };

        let Some(idx) = self
            .onlookers
            .iter()
            .position(|o| o.conn_id == conn_id)
        else {
            // roles said onlooker but the set disagrees; the reverse
            // index is the invariant, so treat this as corruption.
            tracing::warn!(room = %self.name, %conn_id, "onlooker missing from set");
            return;
        };
        let occupant = self.onlookers.remove(idx);
        self.seats[side as usize] = Some(occupant);
        self.roles.insert(conn_id, Role::Seated(side));

        tracing::info!(
            room = %self.name,
            %conn_id,
            side = %side,
            "onlooker took a seat"
        );

        self.send_to(
            conn_id,
            ServerEvent::PlayerRole {
                role: RoleLabel::for_side(side),
            },
        );
        self.broadcast_roster();
    }

    /// Chat fan-out. The display name comes from the payload; without
    /// one the line is dropped. The role label comes from membership,
    /// defaulting to onlooker.
    fn handle_chat(
        &self,
        conn_id: ConnectionId,
        display_name: Option<String>,
        text: String,
    ) {
        let Some(display_name) = display_name else {
            return;
        };
        let role_label = self
            .roles
            .get(&conn_id)
            .map(|r| r.label())
            .unwrap_or(RoleLabel::Onlooker);
        self.broadcast(ServerEvent::ChatMessage {
            text,
            display_name,
            role_label,
        });
    }

    /// The roster in display order: first-mover, second-mover, then
    /// onlookers in join order.
    fn roster(&self) -> Vec<RosterEntry> {
        let mut users = Vec::with_capacity(self.member_count());
        for side in [Side::First, Side::Second] {
            if let Some(p) = self.seats[side as usize].as_ref() {
                users.push(RosterEntry {
                    display_name: p.display_name.clone(),
                    role_label: RoleLabel::for_side(side),
                });
            }
        }
        users.extend(self.onlookers.iter().map(|o| RosterEntry {
            display_name: o.display_name.clone(),
            role_label: RoleLabel::Onlooker,
        }));
        users
    }

    fn broadcast_roster(&self) {
        let users = self.roster();
        let count = users.len();
        self.broadcast(ServerEvent::UpdateUsers { users });
        self.broadcast(ServerEvent::UserCount { count });
    }

    fn member_count(&self) -> usize {
        self.roles.len()
    }

    /// Delivers an event to every current member. Per-recipient order
    /// is the order of these calls; a dead recipient's send fails and
    /// is ignored (its own disconnect sequence cleans it up).
    fn broadcast(&self, event: ServerEvent) {
        for sender in self.senders.values() {
            let _ = sender.send(event.clone());
        }
    }

    /// Delivers an event to a single member, if still present.
    fn send_to(&self, conn_id: ConnectionId, event: ServerEvent) {
        if let Some(sender) = self.senders.get(&conn_id) {
            let _ = sender.send(event);
        }
    }
}

/// Spawns a new room actor task and returns a handle to it.
///
/// The position starts from the oracle's initial serialization.
/// `channel_size` bounds the command queue.
pub(crate) fn spawn_room<O: Oracle>(
    name: RoomName,
    oracle: Arc<O>,
    channel_size: usize,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(channel_size);
    let position = oracle.initial_position();

    let actor = RoomActor {
        name: name.clone(),
        oracle,
        position,
        seats: [None, None],
        onlookers: Vec::new(),
        roles: HashMap::new(),
        senders: HashMap::new(),
        receiver: rx,
    };

    tokio::spawn(actor.run());

    RoomHandle { name, sender: tx }
}
