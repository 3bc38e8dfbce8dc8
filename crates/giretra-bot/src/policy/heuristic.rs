use super::{Policy, PolicyContext};
use crate::bot::{BidPlanner, BotContext, BotDifficulty, BotParams, PlayPlanner, PlayReason};
use giretra_core::game::agent::Cut;
use giretra_core::model::card::Card;
use giretra_core::model::deck::{MAX_CUT, MIN_CUT};
use giretra_core::model::hand_state::HandState;
use giretra_core::model::player::PlayerPosition;
use giretra_core::negotiation::{NegotiationAction, NegotiationState};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{Level, event};

/// Adapter that wraps BidPlanner/PlayPlanner to implement the Policy trait
pub struct HeuristicPolicy {
    difficulty: BotDifficulty,
    params: BotParams,
    rng: StdRng,
}

impl HeuristicPolicy {
    pub fn new(difficulty: BotDifficulty, seed: u64) -> Self {
        Self {
            difficulty,
            params: BotParams::default(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn easy(seed: u64) -> Self {
        Self::new(BotDifficulty::Easy, seed)
    }

    pub fn normal(seed: u64) -> Self {
        Self::new(BotDifficulty::Normal, seed)
    }

    pub fn with_params(mut self, params: BotParams) -> Self {
        self.params = params;
        self
    }

    pub fn difficulty(&self) -> BotDifficulty {
        self.difficulty
    }

    fn bot_context<'a>(&'a self, ctx: &PolicyContext<'a>) -> BotContext<'a> {
        BotContext::new(
            ctx.seat,
            ctx.hand,
            ctx.game,
            ctx.tracker,
            self.difficulty,
            &self.params,
        )
    }
}

impl Policy for HeuristicPolicy {
    /// Where the deck is cut carries no information, so any valid cut will do.
    fn choose_cut(&mut self, _seat: PlayerPosition, _deck_size: usize) -> Cut {
        Cut {
            position: self.rng.gen_range(MIN_CUT..=MAX_CUT),
            from_top: self.rng.gen_bool(0.5),
        }
    }

    fn choose_action(
        &mut self,
        ctx: &PolicyContext,
        negotiation: &NegotiationState,
        valid: &[NegotiationAction],
    ) -> Option<NegotiationAction> {
        if matches!(self.difficulty, BotDifficulty::Easy) {
            let chosen = valid
                .iter()
                .copied()
                .find(NegotiationAction::is_accept)
                .or_else(|| valid.first().copied())?;
            log_bid_decision(ctx, self.difficulty, valid, chosen, "easy_accept");
            return Some(chosen);
        }

        let bot_ctx = self.bot_context(ctx);
        let chosen = BidPlanner::choose(valid, negotiation, &bot_ctx)?;
        log_bid_decision(ctx, self.difficulty, valid, chosen, "heuristic_bid");
        Some(chosen)
    }

    fn choose_card(
        &mut self,
        ctx: &PolicyContext,
        play: &HandState,
        legal: &[Card],
    ) -> Option<Card> {
        if matches!(self.difficulty, BotDifficulty::Easy) {
            let chosen = legal.first().copied()?;
            log_play_decision(ctx, play, self.difficulty, legal, chosen, PlayReason::Forced);
            return Some(chosen);
        }

        let bot_ctx = self.bot_context(ctx);
        let (chosen, reason) = PlayPlanner::choose(legal, play, &bot_ctx)?;
        log_play_decision(ctx, play, self.difficulty, legal, chosen, reason);
        Some(chosen)
    }
}

fn log_bid_decision(
    ctx: &PolicyContext,
    difficulty: BotDifficulty,
    valid: &[NegotiationAction],
    chosen: NegotiationAction,
    reason: &str,
) {
    if !tracing::enabled!(Level::DEBUG) {
        return;
    }

    event!(
        target: "giretra_bot::bid",
        Level::DEBUG,
        seat = %ctx.seat,
        difficulty = ?difficulty,
        offered = valid.len(),
        chosen = %chosen,
        reason,
    );
}

fn log_play_decision(
    ctx: &PolicyContext,
    play: &HandState,
    difficulty: BotDifficulty,
    legal: &[Card],
    chosen: Card,
    reason: PlayReason,
) {
    if !tracing::enabled!(Level::DEBUG) {
        return;
    }

    let legal_preview = if legal.len() <= 6 {
        legal
            .iter()
            .map(Card::to_string)
            .collect::<Vec<_>>()
            .join(",")
    } else {
        format!("{} moves", legal.len())
    };

    event!(
        target: "giretra_bot::play",
        Level::DEBUG,
        seat = %ctx.seat,
        difficulty = ?difficulty,
        mode = %play.mode(),
        legal_count = legal.len(),
        legal_moves = %legal_preview,
        chosen = %chosen,
        trick_cards = play.current_trick().map_or(0, |trick| trick.plays().len()),
        reason = ?reason,
    );
}
