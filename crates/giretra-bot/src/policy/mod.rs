mod first_legal;
mod heuristic;
mod random;

pub use first_legal::FirstLegalPolicy;
pub use heuristic::HeuristicPolicy;
pub use random::RandomPolicy;

use crate::bot::UnseenTracker;
use giretra_core::game::agent::Cut;
use giretra_core::game::match_state::MatchState;
use giretra_core::model::card::Card;
use giretra_core::model::hand::Hand;
use giretra_core::model::hand_state::HandState;
use giretra_core::model::player::PlayerPosition;
use giretra_core::negotiation::{NegotiationAction, NegotiationState};

/// Context provided to policies for decision-making
pub struct PolicyContext<'a> {
    pub seat: PlayerPosition,
    pub hand: &'a Hand,
    pub game: &'a MatchState,
    pub tracker: &'a UnseenTracker,
}

/// Synchronous decision-making for a local seat. Returning `None` means the
/// policy found nothing to choose from.
pub trait Policy: Send {
    fn choose_cut(&mut self, seat: PlayerPosition, deck_size: usize) -> Cut;

    fn choose_action(
        &mut self,
        ctx: &PolicyContext,
        negotiation: &NegotiationState,
        valid: &[NegotiationAction],
    ) -> Option<NegotiationAction>;

    fn choose_card(&mut self, ctx: &PolicyContext, play: &HandState, legal: &[Card])
    -> Option<Card>;
}
