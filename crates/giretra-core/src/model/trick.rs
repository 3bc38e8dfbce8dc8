use crate::model::card::Card;
use crate::model::game_mode::GameMode;
use crate::model::player::PlayerPosition;
use crate::model::suit::Suit;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrickState {
    leader: PlayerPosition,
    plays: Vec<Play>,
    number: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Play {
    pub player: PlayerPosition,
    pub card: Card,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrickError {
    #[error("trick already complete")]
    TrickComplete,
    #[error("expected {expected} to play next but got {actual}")]
    OutOfTurn {
        expected: PlayerPosition,
        actual: PlayerPosition,
    },
}

/// Whether `challenger` takes the trick from `incumbent` given the lead suit.
/// A trump beats any non-trump; otherwise only a lead-suit card can displace a
/// card of another suit, and same-suit cards compare by mode strength.
pub fn beats(challenger: Card, incumbent: Card, lead_suit: Suit, mode: GameMode) -> bool {
    if let Some(trump) = mode.trump_suit() {
        let challenger_trump = challenger.suit == trump;
        let incumbent_trump = incumbent.suit == trump;
        if challenger_trump != incumbent_trump {
            return challenger_trump;
        }
    }

    if challenger.suit != incumbent.suit {
        return challenger.suit == lead_suit && incumbent.suit != lead_suit;
    }

    challenger.strength(mode) > incumbent.strength(mode)
}

impl TrickState {
    pub fn new(leader: PlayerPosition, number: u8) -> Self {
        Self {
            leader,
            plays: Vec::with_capacity(4),
            number,
        }
    }

    pub fn leader(&self) -> PlayerPosition {
        self.leader
    }

    pub fn plays(&self) -> &[Play] {
        &self.plays
    }

    /// 1-based position of this trick within the hand.
    pub fn number(&self) -> u8 {
        self.number
    }

    pub fn is_complete(&self) -> bool {
        self.plays.len() == 4
    }

    pub fn is_last(&self) -> bool {
        self.number == 8
    }

    pub fn lead_suit(&self) -> Option<Suit> {
        self.plays.first().map(|play| play.card.suit)
    }

    /// Seat expected to play next, or `None` once four cards are down.
    pub fn current_player(&self) -> Option<PlayerPosition> {
        if self.is_complete() {
            return None;
        }
        Some(
            self.plays
                .last()
                .map(|play| play.player.next())
                .unwrap_or(self.leader),
        )
    }

    pub fn play(&mut self, player: PlayerPosition, card: Card) -> Result<(), TrickError> {
        let Some(expected) = self.current_player() else {
            return Err(TrickError::TrickComplete);
        };

        if expected != player {
            return Err(TrickError::OutOfTurn {
                expected,
                actual: player,
            });
        }

        self.plays.push(Play { player, card });
        Ok(())
    }

    /// Best play so far, scanning in play order against a running incumbent.
    pub fn winning_play(&self, mode: GameMode) -> Option<Play> {
        let lead_suit = self.lead_suit()?;
        let mut best = *self.plays.first()?;
        for play in &self.plays[1..] {
            if beats(play.card, best.card, lead_suit, mode) {
                best = *play;
            }
        }
        Some(best)
    }

    pub fn winner(&self, mode: GameMode) -> Option<PlayerPosition> {
        if !self.is_complete() {
            return None;
        }
        self.winning_play(mode).map(|play| play.player)
    }

    pub fn card_points(&self, mode: GameMode) -> u32 {
        self.plays.iter().map(|play| play.card.points(mode)).sum()
    }

    pub fn has_trump(&self, mode: GameMode) -> bool {
        self.plays.iter().any(|play| play.card.is_trump(mode))
    }

    pub fn highest_trump(&self, mode: GameMode) -> Option<Card> {
        self.plays
            .iter()
            .map(|play| play.card)
            .filter(|card| card.is_trump(mode))
            .max_by_key(|card| card.strength(mode))
    }
}

#[cfg(test)]
mod tests {
    use super::{TrickError, TrickState, beats};
    use crate::model::card::Card;
    use crate::model::game_mode::GameMode;
    use crate::model::player::PlayerPosition;
    use crate::model::rank::Rank;
    use crate::model::suit::Suit;

    fn trick_of(leader: PlayerPosition, cards: [Card; 4]) -> TrickState {
        let mut trick = TrickState::new(leader, 1);
        let mut seat = leader;
        for card in cards {
            trick.play(seat, card).unwrap();
            seat = seat.next();
        }
        trick
    }

    #[test]
    fn plays_follow_turn_order() {
        let mut trick = TrickState::new(PlayerPosition::Bottom, 1);
        assert!(
            trick
                .play(PlayerPosition::Bottom, Card::new(Rank::Seven, Suit::Clubs))
                .is_ok()
        );
        assert!(matches!(
            trick.play(PlayerPosition::Top, Card::new(Rank::Eight, Suit::Clubs)),
            Err(TrickError::OutOfTurn { .. })
        ));
        assert_eq!(trick.current_player(), Some(PlayerPosition::Left));
    }

    #[test]
    fn fifth_card_is_rejected() {
        let mut trick = trick_of(
            PlayerPosition::Left,
            [
                Card::new(Rank::Seven, Suit::Clubs),
                Card::new(Rank::Eight, Suit::Clubs),
                Card::new(Rank::Nine, Suit::Clubs),
                Card::new(Rank::Ten, Suit::Clubs),
            ],
        );
        assert_eq!(trick.current_player(), None);
        assert_eq!(
            trick.play(PlayerPosition::Left, Card::new(Rank::Ace, Suit::Clubs)),
            Err(TrickError::TrickComplete)
        );
    }

    #[test]
    fn highest_lead_suit_card_wins_without_trump() {
        let trick = trick_of(
            PlayerPosition::Bottom,
            [
                Card::new(Rank::Ten, Suit::Clubs),
                Card::new(Rank::Ace, Suit::Clubs),
                Card::new(Rank::Jack, Suit::Clubs),
                Card::new(Rank::Ace, Suit::Spades),
            ],
        );
        assert_eq!(trick.winner(GameMode::NoTrumps), Some(PlayerPosition::Left));
        assert_eq!(trick.card_points(GameMode::NoTrumps), 10 + 11 + 2 + 11);
    }

    #[test]
    fn small_trump_beats_lead_suit_ace() {
        let trick = trick_of(
            PlayerPosition::Bottom,
            [
                Card::new(Rank::Ace, Suit::Clubs),
                Card::new(Rank::Seven, Suit::Hearts),
                Card::new(Rank::Ten, Suit::Clubs),
                Card::new(Rank::King, Suit::Diamonds),
            ],
        );
        assert_eq!(
            trick.winner(GameMode::ColourHearts),
            Some(PlayerPosition::Left)
        );
        assert_eq!(
            trick.winner(GameMode::ColourSpades),
            Some(PlayerPosition::Bottom)
        );
    }

    #[test]
    fn all_trumps_ranks_jack_highest_in_lead_suit() {
        let trick = trick_of(
            PlayerPosition::Top,
            [
                Card::new(Rank::Ace, Suit::Diamonds),
                Card::new(Rank::Nine, Suit::Diamonds),
                Card::new(Rank::Jack, Suit::Spades),
                Card::new(Rank::Jack, Suit::Diamonds),
            ],
        );
        assert_eq!(
            trick.winner(GameMode::AllTrumps),
            Some(PlayerPosition::Left)
        );
    }

    #[test]
    fn off_suit_never_displaces_incumbent() {
        let lead = Card::new(Rank::Seven, Suit::Clubs);
        let off = Card::new(Rank::Ace, Suit::Diamonds);
        assert!(!beats(off, lead, Suit::Clubs, GameMode::NoTrumps));
        assert!(beats(lead, off, Suit::Clubs, GameMode::NoTrumps));
    }

    #[test]
    fn highest_trump_tracks_strength() {
        let trick = trick_of(
            PlayerPosition::Bottom,
            [
                Card::new(Rank::Ace, Suit::Clubs),
                Card::new(Rank::Ace, Suit::Spades),
                Card::new(Rank::Nine, Suit::Spades),
                Card::new(Rank::Seven, Suit::Clubs),
            ],
        );
        assert!(trick.has_trump(GameMode::ColourSpades));
        assert_eq!(
            trick.highest_trump(GameMode::ColourSpades),
            Some(Card::new(Rank::Nine, Suit::Spades))
        );
        assert!(!trick.has_trump(GameMode::ColourHearts));
    }
}
