use crate::model::game_mode::{GameMode, GameModeCategory};
use crate::model::rank::Rank;
use crate::model::suit::Suit;
use core::fmt;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
}

impl Card {
    pub const fn new(rank: Rank, suit: Suit) -> Self {
        Self { rank, suit }
    }

    pub fn uses_trump_values(self, mode: GameMode) -> bool {
        match mode.category() {
            GameModeCategory::AllTrumps => true,
            _ => mode.trump_suit() == Some(self.suit),
        }
    }

    pub fn points(self, mode: GameMode) -> u32 {
        if self.uses_trump_values(mode) {
            self.rank.trump_points()
        } else {
            self.rank.plain_points()
        }
    }

    /// Strength within the card's own suit; only meaningful when comparing
    /// two cards of the same suit.
    pub fn strength(self, mode: GameMode) -> u8 {
        if self.uses_trump_values(mode) {
            self.rank.trump_strength()
        } else {
            self.rank.plain_strength()
        }
    }

    pub fn is_trump(self, mode: GameMode) -> bool {
        mode.trump_suit() == Some(self.suit)
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.rank, self.suit)
    }
}

impl std::str::FromStr for Card {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split = s
            .char_indices()
            .last()
            .map(|(idx, _)| idx)
            .ok_or_else(|| "empty card".to_string())?;
        let (rank, suit) = s.split_at(split);
        let rank = Rank::from_symbol(rank).ok_or_else(|| format!("invalid rank in '{s}'"))?;
        let suit = Suit::from_symbol(suit).ok_or_else(|| format!("invalid suit in '{s}'"))?;
        Ok(Card::new(rank, suit))
    }
}
