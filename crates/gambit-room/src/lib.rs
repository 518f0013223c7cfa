//! Room lifecycle management for Gambit.
//!
//! Each room runs as an isolated Tokio task (actor model) owning one
//! session's position, seats, and onlooker set. The registry maps room
//! names to running actors and is the only place rooms are created or
//! destroyed.
//!
//! # Key types
//!
//! - [`Oracle`] — the external rules-engine seam
//! - [`RoomRegistry`] — name → room map; creation, duplicate rejection,
//!   removal on abandonment
//! - [`RoomHandle`] — send commands to a running room actor
//! - [`MemberSender`] — per-member outbound event channel

mod error;
mod oracle;
mod registry;
mod room;

pub use error::RoomError;
pub use oracle::{Accepted, Oracle, TerminalFlags};
pub use registry::RoomRegistry;
pub use room::{LeaveOutcome, MemberSender, RoomHandle};
