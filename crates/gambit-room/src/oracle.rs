//! The `Oracle` trait — the seam to the external rules engine.
//!
//! The relay never interprets a position or an action itself. It hands
//! both to the oracle and trusts the verdict: either a new serialized
//! position (plus terminal flags), or a rejection. The oracle is pure
//! computation — synchronous, no I/O — so calling it inside a room
//! actor never becomes a suspension point.

use gambit_wire::{Action, Side};

/// Validates actions against a serialized position and produces the
/// successor position.
///
/// Implementations own the position format entirely; the relay treats
/// positions as opaque strings and only ever stores the most recent
/// one.
pub trait Oracle: Send + Sync + 'static {
    /// The serialized position a fresh session starts from.
    fn initial_position(&self) -> String;

    /// The side whose turn it is in `position`.
    fn turn(&self, position: &str) -> Side;

    /// Applies `action` to `position`.
    ///
    /// Returns the successor position and terminal flags on acceptance.
    /// The `Err` string is a rejection reason used only for debug
    /// logging — clients see the echoed action, never the reason.
    fn apply(&self, position: &str, action: &Action) -> Result<Accepted, String>;
}

/// The result of a successfully applied action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accepted {
    /// The new serialized position.
    pub position: String,
    /// Terminal status reported by the rules engine. The relay logs a
    /// terminal position but never re-derives or acts on these flags —
    /// what to show is a presentation concern.
    pub terminal: TerminalFlags,
}

/// Terminal-status flags for a position, as reported by the oracle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TerminalFlags {
    pub checkmate: bool,
    pub stalemate: bool,
    pub draw: bool,
    pub insufficient_material: bool,
    pub repetition: bool,
}

impl TerminalFlags {
    /// `true` if any flag marks the session as over.
    pub fn is_terminal(&self) -> bool {
        self.checkmate
            || self.stalemate
            || self.draw
            || self.insufficient_material
            || self.repetition
    }
}
