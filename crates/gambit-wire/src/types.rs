//! Core protocol types for Gambit's wire format.
//!
//! Every type here travels on the wire as JSON, so the serde attributes
//! are part of the protocol contract: the inline tests pin the exact
//! JSON shapes a client sees.

use serde::{Deserialize, Serialize};

use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a live connection.
///
/// Assigned by the transport when a connection is accepted and
/// invalidated when it closes. Never reused within a process run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// A room's unique, client-chosen name. Immutable after creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomName(String);

impl RoomName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomName {
    fn from(name: &str) -> Self {
        Self(name.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Sides and roles
// ---------------------------------------------------------------------------

/// One of the two participant sides in a session.
///
/// The side whose turn it is comes from the position oracle; `first`
/// always moves first from the initial position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    First,
    Second,
}

impl Side {
    /// The opposing side.
    pub fn other(self) -> Side {
        match self {
            Side::First => Side::Second,
            Side::Second => Side::First,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::First => f.write_str("first"),
            Side::Second => f.write_str("second"),
        }
    }
}

/// The role label attached to a room member, as shown to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoleLabel {
    FirstMover,
    SecondMover,
    Onlooker,
}

impl RoleLabel {
    /// The label for the player seated on `side`.
    pub fn for_side(side: Side) -> RoleLabel {
        match side {
            Side::First => RoleLabel::FirstMover,
            Side::Second => RoleLabel::SecondMover,
        }
    }
}

impl fmt::Display for RoleLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoleLabel::FirstMover => f.write_str("first-mover"),
            RoleLabel::SecondMover => f.write_str("second-mover"),
            RoleLabel::Onlooker => f.write_str("onlooker"),
        }
    }
}

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

/// A proposed state transition submitted by a seated participant.
///
/// Opaque to the relay: it is handed to the position oracle for a
/// verdict and, if accepted, broadcast verbatim. Never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub from: String,
    pub to: String,
    /// Disambiguation hint for actions with several outcomes
    /// (e.g. pawn promotion). Absent for ordinary actions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion: Option<String>,
}

// ---------------------------------------------------------------------------
// Roster
// ---------------------------------------------------------------------------

/// One row of the membership roster broadcast on every change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    pub display_name: String,
    pub role_label: RoleLabel,
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Everything a client can send to the relay.
///
/// Internally tagged: `{ "type": "createRoom", "roomName": ..., ... }`.
/// Disconnects are implicit (the connection closes) and have no event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientEvent {
    /// Create a room and join it in one step.
    #[serde(rename_all = "camelCase")]
    CreateRoom {
        room_name: RoomName,
        display_name: String,
    },

    /// Join an existing room.
    #[serde(rename_all = "camelCase")]
    JoinRoom {
        room_name: RoomName,
        display_name: String,
    },

    /// Submit an action for the session in `room_name`.
    #[serde(rename_all = "camelCase")]
    Move { room_name: RoomName, action: Action },

    /// An onlooker's answer to the offer of an empty seat.
    #[serde(rename_all = "camelCase")]
    SpectatorResponse { room_name: RoomName, accept: bool },

    /// Relay a chat line to the room.
    ///
    /// The display name travels in the payload rather than being
    /// resolved from membership; a missing name makes this a no-op.
    #[serde(rename_all = "camelCase")]
    SendMessage {
        room_name: RoomName,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        display_name: Option<String>,
        text: String,
    },
}

/// Everything the relay can send to a client.
///
/// `PlayerRole` keeps its capitalized tag — the one event the observed
/// protocol spells that way; every other tag is camelCase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerEvent {
    /// The requester's assigned role, sent once per successful
    /// join/create (and again if an onlooker claims a seat).
    #[serde(rename = "PlayerRole")]
    PlayerRole { role: RoleLabel },

    /// The current serialized position: on join, and after every
    /// accepted action.
    BoardState { position: String },

    /// An accepted action, broadcast to the whole room.
    Move { action: Action },

    /// A rejected action, echoed to the submitter only.
    InvalidMove { action: Action },

    /// The refreshed roster, ordered: first-mover, second-mover, then
    /// onlookers in join order.
    UpdateUsers { users: Vec<RosterEntry> },

    /// Total occupant count, broadcast alongside `UpdateUsers`.
    UserCount { count: usize },

    /// A seat emptied while the other seat was still occupied; carries
    /// the vacated side.
    OpponentLeft { side: Side },

    /// A structural rejection (duplicate room name, missing room,
    /// already joined).
    Error { message: String },

    /// A relayed chat line.
    #[serde(rename_all = "camelCase")]
    ChatMessage {
        text: String,
        display_name: String,
        role_label: RoleLabel,
    },
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! The wire format is a contract with clients: these tests pin the
    //! exact JSON each event serializes to, because a serde-attribute
    //! slip silently breaks every client.

    use super::*;

    // =====================================================================
    // Identity types
    // =====================================================================

    #[test]
    fn test_connection_id_serializes_as_plain_number() {
        let json = serde_json::to_string(&ConnectionId(42)).unwrap();
        assert_eq!(json, "42");
    }

    #[test]
    fn test_connection_id_display() {
        assert_eq!(ConnectionId(7).to_string(), "conn-7");
    }

    #[test]
    fn test_room_name_serializes_as_plain_string() {
        let json = serde_json::to_string(&RoomName::from("lobby")).unwrap();
        assert_eq!(json, "\"lobby\"");
    }

    #[test]
    fn test_room_name_hash_works_as_map_key() {
        use std::collections::HashMap;
        let mut map = HashMap::new();
        map.insert(RoomName::from("r1"), 1);
        map.insert(RoomName::from("r2"), 2);
        assert_eq!(map[&RoomName::from("r1")], 1);
    }

    // =====================================================================
    // Side / RoleLabel
    // =====================================================================

    #[test]
    fn test_side_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Side::First).unwrap(), "\"first\"");
        assert_eq!(serde_json::to_string(&Side::Second).unwrap(), "\"second\"");
    }

    #[test]
    fn test_side_other() {
        assert_eq!(Side::First.other(), Side::Second);
        assert_eq!(Side::Second.other(), Side::First);
    }

    #[test]
    fn test_role_label_serializes_kebab_case() {
        assert_eq!(
            serde_json::to_string(&RoleLabel::FirstMover).unwrap(),
            "\"first-mover\""
        );
        assert_eq!(
            serde_json::to_string(&RoleLabel::SecondMover).unwrap(),
            "\"second-mover\""
        );
        assert_eq!(
            serde_json::to_string(&RoleLabel::Onlooker).unwrap(),
            "\"onlooker\""
        );
    }

    #[test]
    fn test_role_label_for_side() {
        assert_eq!(RoleLabel::for_side(Side::First), RoleLabel::FirstMover);
        assert_eq!(RoleLabel::for_side(Side::Second), RoleLabel::SecondMover);
    }

    // =====================================================================
    // Action
    // =====================================================================

    #[test]
    fn test_action_without_promotion_omits_field() {
        let action = Action {
            from: "e2".into(),
            to: "e4".into(),
            promotion: None,
        };
        let json: serde_json::Value = serde_json::to_value(&action).unwrap();
        assert_eq!(json["from"], "e2");
        assert_eq!(json["to"], "e4");
        assert!(json.get("promotion").is_none());
    }

    #[test]
    fn test_action_round_trip_with_promotion() {
        let action = Action {
            from: "e7".into(),
            to: "e8".into(),
            promotion: Some("q".into()),
        };
        let bytes = serde_json::to_string(&action).unwrap();
        let decoded: Action = serde_json::from_str(&bytes).unwrap();
        assert_eq!(action, decoded);
    }

    #[test]
    fn test_action_decodes_without_promotion_field() {
        let action: Action =
            serde_json::from_str(r#"{"from":"a1","to":"a2"}"#).unwrap();
        assert_eq!(action.promotion, None);
    }

    // =====================================================================
    // ClientEvent — one shape test per variant
    // =====================================================================

    #[test]
    fn test_client_event_create_room_json_format() {
        let ev = ClientEvent::CreateRoom {
            room_name: RoomName::from("r1"),
            display_name: "Alice".into(),
        };
        let json: serde_json::Value = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["type"], "createRoom");
        assert_eq!(json["roomName"], "r1");
        assert_eq!(json["displayName"], "Alice");
    }

    #[test]
    fn test_client_event_join_room_json_format() {
        let ev = ClientEvent::JoinRoom {
            room_name: RoomName::from("r1"),
            display_name: "Bob".into(),
        };
        let json: serde_json::Value = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["type"], "joinRoom");
        assert_eq!(json["roomName"], "r1");
    }

    #[test]
    fn test_client_event_move_json_format() {
        let ev = ClientEvent::Move {
            room_name: RoomName::from("r1"),
            action: Action {
                from: "e2".into(),
                to: "e4".into(),
                promotion: None,
            },
        };
        let json: serde_json::Value = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["type"], "move");
        assert_eq!(json["action"]["from"], "e2");
    }

    #[test]
    fn test_client_event_spectator_response_round_trip() {
        let ev = ClientEvent::SpectatorResponse {
            room_name: RoomName::from("r1"),
            accept: true,
        };
        let text = serde_json::to_string(&ev).unwrap();
        let decoded: ClientEvent = serde_json::from_str(&text).unwrap();
        assert_eq!(ev, decoded);
    }

    #[test]
    fn test_client_event_send_message_without_name() {
        // Chat with no display name must still parse; the relay treats
        // it as a no-op.
        let ev: ClientEvent = serde_json::from_str(
            r#"{"type":"sendMessage","roomName":"r1","text":"hi"}"#,
        )
        .unwrap();
        assert!(matches!(
            ev,
            ClientEvent::SendMessage {
                display_name: None,
                ..
            }
        ));
    }

    // =====================================================================
    // ServerEvent
    // =====================================================================

    #[test]
    fn test_server_event_player_role_keeps_capitalized_tag() {
        let ev = ServerEvent::PlayerRole {
            role: RoleLabel::FirstMover,
        };
        let json: serde_json::Value = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["type"], "PlayerRole");
        assert_eq!(json["role"], "first-mover");
    }

    #[test]
    fn test_server_event_board_state_json_format() {
        let ev = ServerEvent::BoardState {
            position: "start".into(),
        };
        let json: serde_json::Value = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["type"], "boardState");
        assert_eq!(json["position"], "start");
    }

    #[test]
    fn test_server_event_update_users_json_format() {
        let ev = ServerEvent::UpdateUsers {
            users: vec![
                RosterEntry {
                    display_name: "Alice".into(),
                    role_label: RoleLabel::FirstMover,
                },
                RosterEntry {
                    display_name: "Carol".into(),
                    role_label: RoleLabel::Onlooker,
                },
            ],
        };
        let json: serde_json::Value = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["type"], "updateUsers");
        assert_eq!(json["users"][0]["displayName"], "Alice");
        assert_eq!(json["users"][0]["roleLabel"], "first-mover");
        assert_eq!(json["users"][1]["roleLabel"], "onlooker");
    }

    #[test]
    fn test_server_event_user_count_json_format() {
        let ev = ServerEvent::UserCount { count: 3 };
        let json: serde_json::Value = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["type"], "userCount");
        assert_eq!(json["count"], 3);
    }

    #[test]
    fn test_server_event_opponent_left_json_format() {
        let ev = ServerEvent::OpponentLeft { side: Side::First };
        let json: serde_json::Value = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["type"], "opponentLeft");
        assert_eq!(json["side"], "first");
    }

    #[test]
    fn test_server_event_chat_message_json_format() {
        let ev = ServerEvent::ChatMessage {
            text: "gg".into(),
            display_name: "Bob".into(),
            role_label: RoleLabel::SecondMover,
        };
        let json: serde_json::Value = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["type"], "chatMessage");
        assert_eq!(json["displayName"], "Bob");
        assert_eq!(json["roleLabel"], "second-mover");
    }

    #[test]
    fn test_server_event_invalid_move_round_trip() {
        let ev = ServerEvent::InvalidMove {
            action: Action {
                from: "e2".into(),
                to: "e9".into(),
                promotion: None,
            },
        };
        let text = serde_json::to_string(&ev).unwrap();
        let decoded: ServerEvent = serde_json::from_str(&text).unwrap();
        assert_eq!(ev, decoded);
    }

    #[test]
    fn test_server_event_error_round_trip() {
        let ev = ServerEvent::Error {
            message: "room r1 already exists".into(),
        };
        let text = serde_json::to_string(&ev).unwrap();
        let decoded: ServerEvent = serde_json::from_str(&text).unwrap();
        assert_eq!(ev, decoded);
    }

    // =====================================================================
    // Malformed input
    // =====================================================================

    #[test]
    fn test_decode_garbage_returns_error() {
        let result: Result<ClientEvent, _> =
            serde_json::from_str("not json at all");
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_unknown_event_type_returns_error() {
        let result: Result<ClientEvent, _> =
            serde_json::from_str(r#"{"type":"flyToMoon","speed":9000}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_missing_fields_returns_error() {
        // A move without an action is malformed, not a default.
        let result: Result<ClientEvent, _> =
            serde_json::from_str(r#"{"type":"move","roomName":"r1"}"#);
        assert!(result.is_err());
    }
}
