//! Wire protocol for Gambit.
//!
//! This crate defines the "language" that clients and the relay speak:
//!
//! - **Types** ([`ClientEvent`], [`ServerEvent`], [`Action`], identity
//!   newtypes) — the event structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those events are
//!   converted to and from text frames.
//! - **Errors** ([`WireError`]) — what can go wrong during
//!   encoding/decoding.
//!
//! The protocol layer sits between the transport (text frames) and the
//! session handler (connection context). It knows nothing about rooms
//! or connections — only how to serialize and deserialize events.

mod codec;
mod error;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::WireError;
pub use types::{
    Action, ClientEvent, ConnectionId, RoleLabel, RoomName, RosterEntry,
    ServerEvent, Side,
};
