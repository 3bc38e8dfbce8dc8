use crate::model::game_mode::GameMode;
use crate::model::player::PlayerPosition;
use core::fmt;
use serde::{Deserialize, Serialize};

/// One bidding move. Double and Redouble name the mode they target, which
/// need not be the standing bid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NegotiationAction {
    Announce {
        player: PlayerPosition,
        mode: GameMode,
    },
    Accept {
        player: PlayerPosition,
    },
    Double {
        player: PlayerPosition,
        mode: GameMode,
    },
    Redouble {
        player: PlayerPosition,
        mode: GameMode,
    },
}

impl NegotiationAction {
    pub const fn player(&self) -> PlayerPosition {
        match *self {
            NegotiationAction::Announce { player, .. }
            | NegotiationAction::Accept { player }
            | NegotiationAction::Double { player, .. }
            | NegotiationAction::Redouble { player, .. } => player,
        }
    }

    /// The mode announced or targeted; `None` for Accept.
    pub const fn mode(&self) -> Option<GameMode> {
        match *self {
            NegotiationAction::Announce { mode, .. }
            | NegotiationAction::Double { mode, .. }
            | NegotiationAction::Redouble { mode, .. } => Some(mode),
            NegotiationAction::Accept { .. } => None,
        }
    }

    pub const fn is_accept(&self) -> bool {
        matches!(self, NegotiationAction::Accept { .. })
    }

    pub const fn kind(&self) -> &'static str {
        match self {
            NegotiationAction::Announce { .. } => "announce",
            NegotiationAction::Accept { .. } => "accept",
            NegotiationAction::Double { .. } => "double",
            NegotiationAction::Redouble { .. } => "redouble",
        }
    }
}

impl fmt::Display for NegotiationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NegotiationAction::Announce { player, mode } => write!(f, "{player} announces {mode}"),
            NegotiationAction::Accept { player } => write!(f, "{player} accepts"),
            NegotiationAction::Double { player, mode } => write!(f, "{player} doubles {mode}"),
            NegotiationAction::Redouble { player, mode } => write!(f, "{player} redoubles {mode}"),
        }
    }
}
