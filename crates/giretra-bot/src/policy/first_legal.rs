use super::{Policy, PolicyContext};
use giretra_core::game::agent::Cut;
use giretra_core::model::card::Card;
use giretra_core::model::hand_state::HandState;
use giretra_core::model::player::PlayerPosition;
use giretra_core::negotiation::{NegotiationAction, NegotiationState};

/// Always cuts mid-deck, accepts when it can and plays the first legal card.
#[derive(Debug, Default, Clone, Copy)]
pub struct FirstLegalPolicy;

impl Policy for FirstLegalPolicy {
    fn choose_cut(&mut self, _seat: PlayerPosition, _deck_size: usize) -> Cut {
        Cut::DEFAULT
    }

    fn choose_action(
        &mut self,
        _ctx: &PolicyContext,
        _negotiation: &NegotiationState,
        valid: &[NegotiationAction],
    ) -> Option<NegotiationAction> {
        valid
            .iter()
            .copied()
            .find(NegotiationAction::is_accept)
            .or_else(|| valid.first().copied())
    }

    fn choose_card(
        &mut self,
        _ctx: &PolicyContext,
        _play: &HandState,
        legal: &[Card],
    ) -> Option<Card> {
        legal.first().copied()
    }
}
