use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use super::match_state::MatchState;
use crate::model::card::Card;
use crate::model::deck::{MAX_CUT, MIN_CUT};
use crate::model::hand::Hand;
use crate::model::hand_state::{CompletedTrick, HandState};
use crate::model::player::PlayerPosition;
use crate::model::score::DealResult;
use crate::negotiation::{NegotiationAction, NegotiationState};

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("agent failed: {0}")]
    Failed(String),
    #[error("agent sent an unusable response: {0}")]
    Protocol(String),
    #[error("agent did not answer within {0:?}")]
    TimedOut(Duration),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Cut {
    pub position: usize,
    pub from_top: bool,
}

impl Cut {
    /// Used when the cutter does not answer in time.
    pub const DEFAULT: Cut = Cut {
        position: 16,
        from_top: true,
    };

    pub fn is_valid(&self) -> bool {
        (MIN_CUT..=MAX_CUT).contains(&self.position)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CutRequest<'a> {
    pub seat: PlayerPosition,
    pub deck_size: usize,
    pub game: &'a MatchState,
}

#[derive(Debug, Clone, Copy)]
pub struct NegotiationRequest<'a> {
    pub seat: PlayerPosition,
    pub hand: &'a Hand,
    pub negotiation: &'a NegotiationState,
    pub game: &'a MatchState,
    pub valid_actions: &'a [NegotiationAction],
}

#[derive(Debug, Clone, Copy)]
pub struct PlayRequest<'a> {
    pub seat: PlayerPosition,
    pub hand: &'a Hand,
    pub play: &'a HandState,
    pub game: &'a MatchState,
    pub legal_cards: &'a [Card],
}

/// A seat at the table. Decisions must return one of the offered choices;
/// observer hooks are informational and default to doing nothing.
#[async_trait]
pub trait PlayerAgent: Send {
    async fn choose_cut(&mut self, request: CutRequest<'_>) -> Result<Cut, AgentError>;

    async fn choose_negotiation_action(
        &mut self,
        request: NegotiationRequest<'_>,
    ) -> Result<NegotiationAction, AgentError>;

    async fn choose_card(&mut self, request: PlayRequest<'_>) -> Result<Card, AgentError>;

    async fn on_deal_started(&mut self, _game: &MatchState) -> Result<(), AgentError> {
        Ok(())
    }

    async fn on_card_played(
        &mut self,
        _player: PlayerPosition,
        _card: Card,
        _play: &HandState,
        _game: &MatchState,
    ) -> Result<(), AgentError> {
        Ok(())
    }

    async fn on_trick_completed(
        &mut self,
        _trick: &CompletedTrick,
        _play: &HandState,
        _game: &MatchState,
    ) -> Result<(), AgentError> {
        Ok(())
    }

    async fn on_deal_ended(
        &mut self,
        _result: &DealResult,
        _play: &HandState,
        _game: &MatchState,
    ) -> Result<(), AgentError> {
        Ok(())
    }

    async fn on_match_ended(&mut self, _game: &MatchState) -> Result<(), AgentError> {
        Ok(())
    }
}

#[async_trait]
impl<A: PlayerAgent + ?Sized> PlayerAgent for Box<A> {
    async fn choose_cut(&mut self, request: CutRequest<'_>) -> Result<Cut, AgentError> {
        (**self).choose_cut(request).await
    }

    async fn choose_negotiation_action(
        &mut self,
        request: NegotiationRequest<'_>,
    ) -> Result<NegotiationAction, AgentError> {
        (**self).choose_negotiation_action(request).await
    }

    async fn choose_card(&mut self, request: PlayRequest<'_>) -> Result<Card, AgentError> {
        (**self).choose_card(request).await
    }

    async fn on_deal_started(&mut self, game: &MatchState) -> Result<(), AgentError> {
        (**self).on_deal_started(game).await
    }

    async fn on_card_played(
        &mut self,
        player: PlayerPosition,
        card: Card,
        play: &HandState,
        game: &MatchState,
    ) -> Result<(), AgentError> {
        (**self).on_card_played(player, card, play, game).await
    }

    async fn on_trick_completed(
        &mut self,
        trick: &CompletedTrick,
        play: &HandState,
        game: &MatchState,
    ) -> Result<(), AgentError> {
        (**self).on_trick_completed(trick, play, game).await
    }

    async fn on_deal_ended(
        &mut self,
        result: &DealResult,
        play: &HandState,
        game: &MatchState,
    ) -> Result<(), AgentError> {
        (**self).on_deal_ended(result, play, game).await
    }

    async fn on_match_ended(&mut self, game: &MatchState) -> Result<(), AgentError> {
        (**self).on_match_ended(game).await
    }
}

#[cfg(test)]
mod tests {
    use super::Cut;

    #[test]
    fn default_cut_is_mid_deck_and_valid() {
        assert!(Cut::DEFAULT.is_valid());
        assert!(!Cut { position: 5, from_top: true }.is_valid());
        assert!(!Cut { position: 27, from_top: false }.is_valid());
        assert!(Cut { position: 26, from_top: false }.is_valid());
    }
}
