mod bid;
mod params;
mod play;
mod tracker;

pub use bid::BidPlanner;
pub use params::BotParams;
pub use play::{PlayPlanner, PlayReason};
pub use tracker::UnseenTracker;

use giretra_core::game::match_state::MatchState;
use giretra_core::model::card::Card;
use giretra_core::model::game_mode::GameMode;
use giretra_core::model::hand::Hand;
use giretra_core::model::player::{PlayerPosition, Team};
use giretra_core::model::trick::{Play, TrickState, beats};
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BotDifficulty {
    /// Accepts whenever it can and plays the first legal card.
    Easy,
    #[default]
    Normal,
}

impl BotDifficulty {
    pub fn from_env() -> Self {
        static CACHED: OnceLock<BotDifficulty> = OnceLock::new();
        *CACHED.get_or_init(|| {
            std::env::var("GIRETRA_BOT_DIFFICULTY")
                .ok()
                .and_then(|raw| Self::parse(&raw))
                .unwrap_or_default()
        })
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "easy" | "legacy" => Some(BotDifficulty::Easy),
            "normal" | "default" => Some(BotDifficulty::Normal),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BotContext<'a> {
    pub seat: PlayerPosition,
    pub hand: &'a Hand,
    pub game: &'a MatchState,
    pub tracker: &'a UnseenTracker,
    pub difficulty: BotDifficulty,
    pub params: &'a BotParams,
}

impl<'a> BotContext<'a> {
    pub fn new(
        seat: PlayerPosition,
        hand: &'a Hand,
        game: &'a MatchState,
        tracker: &'a UnseenTracker,
        difficulty: BotDifficulty,
        params: &'a BotParams,
    ) -> Self {
        Self {
            seat,
            hand,
            game,
            tracker,
            difficulty,
            params,
        }
    }

    pub fn team(&self) -> Team {
        self.seat.team()
    }
}

/// The play currently taking `trick`, if any card is down.
pub(crate) fn current_winner(trick: &TrickState, mode: GameMode) -> Option<Play> {
    let lead_suit = trick.lead_suit()?;
    trick.plays().iter().copied().reduce(|best, next| {
        if beats(next.card, best.card, lead_suit, mode) {
            next
        } else {
            best
        }
    })
}

/// Ordering key: cheapest first, then weakest.
pub(crate) fn card_cost(card: Card, mode: GameMode) -> (u32, u8) {
    (card.points(mode), card.strength(mode))
}
