use crate::model::card::Card;
use crate::model::game_mode::GameMode;
use crate::model::player::{PlayerPosition, Team};
use crate::model::trick::{TrickError, TrickState};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{Level, event};

pub const TRICKS_PER_HAND: usize = 8;
pub const LAST_TRICK_BONUS: u32 = 10;

/// Card play for one deal under a resolved game mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandState {
    mode: GameMode,
    completed_tricks: Vec<CompletedTrick>,
    current_trick: Option<TrickState>,
    card_points: [u32; 2],
    tricks_won: [u8; 2],
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedTrick {
    pub trick: TrickState,
    pub winner: PlayerPosition,
    /// Card points credited to the winner, last-trick bonus included.
    pub points: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlayError {
    #[error("the hand is already complete")]
    HandComplete,
    #[error("it is {expected}'s turn, not {actual}'s")]
    OutOfTurn {
        expected: PlayerPosition,
        actual: PlayerPosition,
    },
}

impl From<TrickError> for PlayError {
    fn from(err: TrickError) -> Self {
        match err {
            TrickError::TrickComplete => PlayError::HandComplete,
            TrickError::OutOfTurn { expected, actual } => PlayError::OutOfTurn { expected, actual },
        }
    }
}

impl HandState {
    pub fn new(mode: GameMode, first_leader: PlayerPosition) -> Self {
        Self {
            mode,
            completed_tricks: Vec::with_capacity(TRICKS_PER_HAND),
            current_trick: Some(TrickState::new(first_leader, 1)),
            card_points: [0; 2],
            tricks_won: [0; 2],
        }
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn completed_tricks(&self) -> &[CompletedTrick] {
        &self.completed_tricks
    }

    pub fn last_completed_trick(&self) -> Option<&CompletedTrick> {
        self.completed_tricks.last()
    }

    pub fn current_trick(&self) -> Option<&TrickState> {
        self.current_trick.as_ref()
    }

    pub fn current_player(&self) -> Option<PlayerPosition> {
        self.current_trick.as_ref().and_then(TrickState::current_player)
    }

    pub fn is_complete(&self) -> bool {
        self.completed_tricks.len() == TRICKS_PER_HAND
    }

    pub fn card_points(&self, team: Team) -> u32 {
        self.card_points[team.index()]
    }

    pub fn tricks_won(&self, team: Team) -> u8 {
        self.tricks_won[team.index()]
    }

    /// The team holding all eight tricks of a finished hand.
    pub fn sweeping_team(&self) -> Option<Team> {
        if !self.is_complete() {
            return None;
        }
        Team::BOTH
            .into_iter()
            .find(|team| usize::from(self.tricks_won(*team)) == TRICKS_PER_HAND)
    }

    /// Plays `card` for `player`. Only turn order is checked here; holding the
    /// card and following the play rules are the caller's concern.
    pub fn play_card(&self, player: PlayerPosition, card: Card) -> Result<HandState, PlayError> {
        let mut next = self.clone();
        let trick = next.current_trick.as_mut().ok_or(PlayError::HandComplete)?;
        trick.play(player, card)?;

        if trick.is_complete() {
            next.finish_trick();
        }

        Ok(next)
    }

    fn finish_trick(&mut self) {
        let Some(trick) = self.current_trick.take() else {
            return;
        };
        let Some(winner) = trick.winner(self.mode) else {
            self.current_trick = Some(trick);
            return;
        };

        let mut points = trick.card_points(self.mode);
        if trick.is_last() {
            points += LAST_TRICK_BONUS;
        }

        let team = winner.team();
        self.card_points[team.index()] += points;
        self.tricks_won[team.index()] += 1;

        event!(
            target: "giretra_core::play",
            Level::DEBUG,
            trick = trick.number(),
            winner = %winner,
            points,
            mode = %self.mode,
        );

        let number = trick.number();
        self.completed_tricks.push(CompletedTrick {
            trick,
            winner,
            points,
        });

        if self.completed_tricks.len() < TRICKS_PER_HAND {
            self.current_trick = Some(TrickState::new(winner, number + 1));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{HandState, PlayError};
    use crate::model::card::Card;
    use crate::model::deck::Deck;
    use crate::model::game_mode::GameMode;
    use crate::model::player::{PlayerPosition, Team};
    use crate::model::rank::Rank;
    use crate::model::suit::Suit;

    fn c(rank: Rank, suit: Suit) -> Card {
        Card::new(rank, suit)
    }

    #[test]
    fn out_of_turn_leaves_state_untouched() {
        let hand = HandState::new(GameMode::ColourHearts, PlayerPosition::Left);
        let err = hand
            .play_card(PlayerPosition::Bottom, c(Rank::Ace, Suit::Clubs))
            .unwrap_err();
        assert_eq!(
            err,
            PlayError::OutOfTurn {
                expected: PlayerPosition::Left,
                actual: PlayerPosition::Bottom
            }
        );
        assert!(hand.current_trick().unwrap().plays().is_empty());
    }

    #[test]
    fn completed_trick_credits_winner_team_and_passes_lead() {
        let mut hand = HandState::new(GameMode::ColourHearts, PlayerPosition::Bottom);
        for (seat, card) in [
            (PlayerPosition::Bottom, c(Rank::Ace, Suit::Clubs)),
            (PlayerPosition::Left, c(Rank::Seven, Suit::Hearts)),
            (PlayerPosition::Top, c(Rank::Ten, Suit::Clubs)),
            (PlayerPosition::Right, c(Rank::King, Suit::Clubs)),
        ] {
            hand = hand.play_card(seat, card).unwrap();
        }

        assert_eq!(hand.completed_tricks().len(), 1);
        assert_eq!(hand.last_completed_trick().unwrap().winner, PlayerPosition::Left);
        assert_eq!(hand.card_points(Team::Team2), 11 + 10 + 4);
        assert_eq!(hand.tricks_won(Team::Team2), 1);
        assert_eq!(hand.current_player(), Some(PlayerPosition::Left));
        assert_eq!(hand.current_trick().unwrap().number(), 2);
    }

    #[test]
    fn full_hand_totals_mode_points_and_rejects_further_play() {
        for mode in GameMode::ALL {
            let deck = Deck::standard();
            let mut hand = HandState::new(mode, PlayerPosition::Bottom);
            let mut remaining: Vec<Card> = deck.cards().to_vec();
            while !hand.is_complete() {
                let seat = hand.current_player().unwrap();
                let card = remaining.remove(0);
                hand = hand.play_card(seat, card).unwrap();
            }
            let total = hand.card_points(Team::Team1) + hand.card_points(Team::Team2);
            assert_eq!(total, mode.total_points(), "{mode}");
            assert_eq!(
                usize::from(hand.tricks_won(Team::Team1) + hand.tricks_won(Team::Team2)),
                hand.completed_tricks().len()
            );
            assert!(hand.current_trick().is_none());
            assert_eq!(
                hand.play_card(PlayerPosition::Bottom, c(Rank::Ace, Suit::Clubs)),
                Err(PlayError::HandComplete)
            );
        }
    }

    #[test]
    fn sweep_detected_when_one_team_takes_every_trick() {
        let mut hand = HandState::new(GameMode::ColourSpades, PlayerPosition::Bottom);
        // Bottom leads a trump every trick; everyone else discards off-suit.
        for (i, trump_rank) in Rank::ORDERED.iter().enumerate() {
            hand = hand
                .play_card(PlayerPosition::Bottom, c(*trump_rank, Suit::Spades))
                .unwrap();
            let off = [Suit::Clubs, Suit::Diamonds, Suit::Hearts][i % 3];
            for seat in [PlayerPosition::Left, PlayerPosition::Top, PlayerPosition::Right] {
                let rank = Rank::ORDERED[(seat.index() + i) % 8];
                hand = hand.play_card(seat, c(rank, off)).unwrap();
            }
        }
        assert!(hand.is_complete());
        assert_eq!(hand.sweeping_team(), Some(Team::Team1));
        assert_eq!(hand.tricks_won(Team::Team1), 8);
    }
}
