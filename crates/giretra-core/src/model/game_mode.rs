use crate::model::suit::Suit;
use core::fmt;
use serde::{Deserialize, Serialize};

/// Playable contracts, declared in bidding order: each variant outbids every
/// variant declared before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum GameMode {
    ColourClubs = 0,
    ColourDiamonds = 1,
    ColourHearts = 2,
    ColourSpades = 3,
    NoTrumps = 4,
    AllTrumps = 5,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameModeCategory {
    Colour,
    NoTrumps,
    AllTrumps,
}

impl GameMode {
    pub const ALL: [GameMode; 6] = [
        GameMode::ColourClubs,
        GameMode::ColourDiamonds,
        GameMode::ColourHearts,
        GameMode::ColourSpades,
        GameMode::NoTrumps,
        GameMode::AllTrumps,
    ];

    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(GameMode::ColourClubs),
            1 => Some(GameMode::ColourDiamonds),
            2 => Some(GameMode::ColourHearts),
            3 => Some(GameMode::ColourSpades),
            4 => Some(GameMode::NoTrumps),
            5 => Some(GameMode::AllTrumps),
            _ => None,
        }
    }

    pub const fn colour(suit: Suit) -> Self {
        match suit {
            Suit::Clubs => GameMode::ColourClubs,
            Suit::Diamonds => GameMode::ColourDiamonds,
            Suit::Hearts => GameMode::ColourHearts,
            Suit::Spades => GameMode::ColourSpades,
        }
    }

    pub const fn category(self) -> GameModeCategory {
        match self {
            GameMode::ColourClubs
            | GameMode::ColourDiamonds
            | GameMode::ColourHearts
            | GameMode::ColourSpades => GameModeCategory::Colour,
            GameMode::NoTrumps => GameModeCategory::NoTrumps,
            GameMode::AllTrumps => GameModeCategory::AllTrumps,
        }
    }

    pub const fn is_colour(self) -> bool {
        matches!(self.category(), GameModeCategory::Colour)
    }

    /// The single trump suit of a Colour contract. AllTrumps ranks every suit
    /// like trump but has no suit that beats the others, so it reports none.
    pub const fn trump_suit(self) -> Option<Suit> {
        match self {
            GameMode::ColourClubs => Some(Suit::Clubs),
            GameMode::ColourDiamonds => Some(Suit::Diamonds),
            GameMode::ColourHearts => Some(Suit::Hearts),
            GameMode::ColourSpades => Some(Suit::Spades),
            GameMode::NoTrumps | GameMode::AllTrumps => None,
        }
    }

    pub const fn total_points(self) -> u32 {
        match self.category() {
            GameModeCategory::Colour => 162,
            GameModeCategory::NoTrumps => 130,
            GameModeCategory::AllTrumps => 258,
        }
    }

    pub const fn win_threshold(self) -> u32 {
        match self.category() {
            GameModeCategory::Colour => 82,
            GameModeCategory::NoTrumps => 65,
            GameModeCategory::AllTrumps => 129,
        }
    }

    pub const fn base_match_points(self) -> u32 {
        match self.category() {
            GameModeCategory::Colour => 16,
            GameModeCategory::NoTrumps => 26,
            GameModeCategory::AllTrumps => 26,
        }
    }

    /// Match points for a sweep. Colour sweeps end the match instead.
    pub const fn sweep_bonus(self) -> Option<u32> {
        match self.category() {
            GameModeCategory::Colour => None,
            GameModeCategory::NoTrumps => Some(90),
            GameModeCategory::AllTrumps => Some(35),
        }
    }

    pub const fn auto_doubles_on_accept(self) -> bool {
        matches!(self, GameMode::ColourClubs | GameMode::NoTrumps)
    }

    pub const fn redouble_permitted(self) -> bool {
        !self.auto_doubles_on_accept()
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            GameMode::ColourClubs => "ColourClubs",
            GameMode::ColourDiamonds => "ColourDiamonds",
            GameMode::ColourHearts => "ColourHearts",
            GameMode::ColourSpades => "ColourSpades",
            GameMode::NoTrumps => "NoTrumps",
            GameMode::AllTrumps => "AllTrumps",
        }
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for GameMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GameMode::ALL
            .iter()
            .copied()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown game mode '{s}'"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Multiplier {
    #[default]
    Normal,
    Doubled,
    Redoubled,
}

impl Multiplier {
    pub const fn factor(self) -> u32 {
        match self {
            Multiplier::Normal => 1,
            Multiplier::Doubled => 2,
            Multiplier::Redoubled => 4,
        }
    }
}
