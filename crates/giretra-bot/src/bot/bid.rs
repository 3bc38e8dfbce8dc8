use super::{BotContext, BotParams};
use giretra_core::model::card::Card;
use giretra_core::model::game_mode::{GameMode, GameModeCategory};
use giretra_core::model::rank::Rank;
use giretra_core::model::suit::Suit;
use giretra_core::negotiation::{NegotiationAction, NegotiationState};

pub struct BidPlanner;

impl BidPlanner {
    pub fn choose(
        valid: &[NegotiationAction],
        negotiation: &NegotiationState,
        ctx: &BotContext<'_>,
    ) -> Option<NegotiationAction> {
        if valid.is_empty() {
            return None;
        }

        let params = ctx.params;
        let cards = ctx.hand.cards();
        let strengths = GameMode::ALL.map(|mode| Self::hand_strength(cards, mode, params));
        let strength = |mode: GameMode| strengths[mode as usize];
        let best_mode = GameMode::ALL
            .into_iter()
            .max_by_key(|mode| (strength(*mode), *mode))?;
        let best = strength(best_mode);

        if Self::master_count(cards, best_mode) >= params.double_masters
            && let Some(action) = valid.iter().find(|action| {
                matches!(
                    action,
                    NegotiationAction::Redouble { .. } | NegotiationAction::Double { .. }
                )
            })
        {
            // Redoubles are listed after doubles; prefer them.
            let redouble = valid
                .iter()
                .find(|action| matches!(action, NegotiationAction::Redouble { .. }));
            return Some(*redouble.unwrap_or(action));
        }

        let announcements = || {
            valid.iter().filter_map(|action| match action {
                NegotiationAction::Announce { mode, .. } => Some((*action, *mode)),
                _ => None,
            })
        };
        if best >= params.announce_strong {
            let opening = negotiation.current_bid().is_none();
            let pick = announcements()
                .filter(|(_, mode)| *mode == best_mode || (opening && strength(*mode) >= 50))
                .max_by_key(|(_, mode)| (strength(*mode), *mode))
                .map(|(action, _)| action);
            if pick.is_some() {
                return pick;
            }
        }
        if best >= params.announce_decent
            && let Some(action) = announcements()
                .filter(|(_, mode)| strength(*mode) >= params.announce_decent)
                .max_by_key(|(_, mode)| (strength(*mode), *mode))
                .map(|(action, _)| action)
        {
            return Some(action);
        }

        let accept = valid.iter().copied().find(NegotiationAction::is_accept);
        if let Some(accept) = accept {
            if let Some(bid) = negotiation.current_bid()
                && bid.auto_doubles_on_accept()
                && strength(bid) < params.accept_auto_double
                && let Some(escape) = announcements()
                    .filter(|(_, mode)| strength(*mode) >= params.escape_auto_double)
                    .max_by_key(|(_, mode)| (strength(*mode), *mode))
                    .map(|(action, _)| action)
            {
                return Some(escape);
            }
            return Some(accept);
        }

        valid.first().copied()
    }

    /// Rough 0..=100 estimate of how well `hand` plays under `mode`.
    pub fn hand_strength(hand: &[Card], mode: GameMode, params: &BotParams) -> i32 {
        let total = mode.total_points() as i32;
        let points: i32 = hand.iter().map(|card| card.points(mode) as i32).sum();
        let mut score = points * params.strength_point_share / total;

        for card in hand {
            match card.strength(mode) {
                7.. => score += params.strength_top_card,
                6 => score += params.strength_second_card,
                _ => {}
            }
        }

        let count = |rank: Rank| hand.iter().filter(|card| card.rank == rank).count() as i32;
        match (mode.category(), mode.trump_suit()) {
            (GameModeCategory::Colour, Some(trump)) => {
                let holds = |rank: Rank| hand.contains(&Card::new(rank, trump));
                let trumps = hand.iter().filter(|card| card.suit == trump).count() as i32;
                score += trumps * params.strength_per_trump;
                if holds(Rank::Jack) {
                    score += params.strength_trump_jack;
                }
                if holds(Rank::Nine) {
                    score += params.strength_trump_nine;
                }
            }
            (GameModeCategory::AllTrumps, _) => {
                score += count(Rank::Jack) * params.strength_all_trumps_jack;
                score += count(Rank::Nine) * params.strength_all_trumps_nine;
            }
            (GameModeCategory::NoTrumps, _) => {
                score += count(Rank::Ace) * params.strength_no_trumps_ace;
                score += count(Rank::Ten) * params.strength_no_trumps_ten;
            }
            _ => {}
        }

        score.clamp(0, 100)
    }

    /// Suits in which the hand's best card cannot be beaten by any card it
    /// does not hold.
    pub fn master_count(hand: &[Card], mode: GameMode) -> usize {
        Suit::ALL
            .into_iter()
            .filter(|suit| {
                let Some(top) = hand
                    .iter()
                    .filter(|card| card.suit == *suit)
                    .max_by_key(|card| card.strength(mode))
                else {
                    return false;
                };
                Rank::ORDERED.iter().all(|&rank| {
                    let other = Card::new(rank, *suit);
                    hand.contains(&other) || other.strength(mode) <= top.strength(mode)
                })
            })
            .count()
    }
}
