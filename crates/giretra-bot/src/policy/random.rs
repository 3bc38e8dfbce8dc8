use super::{Policy, PolicyContext};
use giretra_core::game::agent::Cut;
use giretra_core::model::card::Card;
use giretra_core::model::deck::{MAX_CUT, MIN_CUT};
use giretra_core::model::hand_state::HandState;
use giretra_core::model::player::PlayerPosition;
use giretra_core::negotiation::{NegotiationAction, NegotiationState};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Uniform choice among whatever is offered.
#[derive(Debug, Clone)]
pub struct RandomPolicy {
    rng: StdRng,
}

impl RandomPolicy {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl Policy for RandomPolicy {
    fn choose_cut(&mut self, _seat: PlayerPosition, _deck_size: usize) -> Cut {
        Cut {
            position: self.rng.gen_range(MIN_CUT..=MAX_CUT),
            from_top: self.rng.gen_bool(0.5),
        }
    }

    fn choose_action(
        &mut self,
        _ctx: &PolicyContext,
        _negotiation: &NegotiationState,
        valid: &[NegotiationAction],
    ) -> Option<NegotiationAction> {
        valid.choose(&mut self.rng).copied()
    }

    fn choose_card(
        &mut self,
        _ctx: &PolicyContext,
        _play: &HandState,
        legal: &[Card],
    ) -> Option<Card> {
        legal.choose(&mut self.rng).copied()
    }
}
