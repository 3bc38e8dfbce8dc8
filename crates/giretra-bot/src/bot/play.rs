use super::{BotContext, card_cost, current_winner};
use giretra_core::model::card::Card;
use giretra_core::model::game_mode::GameMode;
use giretra_core::model::hand_state::HandState;
use giretra_core::model::suit::Suit;
use giretra_core::model::trick::beats;
use std::collections::BTreeMap;

pub struct PlayPlanner;

/// Why the planner picked a card; logged with the decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayReason {
    Forced,
    LeadMaster,
    LeadPartnerSuit,
    LeadTrump,
    LeadLongSuit,
    LeadHighest,
    FeedPartner,
    WinCheaply,
    Discard,
}

impl PlayPlanner {
    pub fn choose(
        legal: &[Card],
        play: &HandState,
        ctx: &BotContext<'_>,
    ) -> Option<(Card, PlayReason)> {
        match legal {
            [] => return None,
            [only] => return Some((*only, PlayReason::Forced)),
            _ => {}
        }

        let mode = play.mode();
        let Some(trick) = play.current_trick() else {
            return legal.first().map(|card| (*card, PlayReason::Forced));
        };
        let (Some(lead_suit), Some(winning)) = (trick.lead_suit(), current_winner(trick, mode))
        else {
            return Some(Self::choose_lead(legal, mode, ctx));
        };

        if winning.player.team() == ctx.team() {
            return Some((most_valuable(legal, mode)?, PlayReason::FeedPartner));
        }

        let cheapest_winner = legal
            .iter()
            .copied()
            .filter(|card| beats(*card, winning.card, lead_suit, mode))
            .min_by_key(|card| (card.strength(mode), card.points(mode), *card));
        match cheapest_winner {
            Some(card) => Some((card, PlayReason::WinCheaply)),
            None => Some((least_valuable(legal, mode)?, PlayReason::Discard)),
        }
    }

    fn choose_lead(legal: &[Card], mode: GameMode, ctx: &BotContext<'_>) -> (Card, PlayReason) {
        let tracker = ctx.tracker;
        let held = ctx.hand.cards();
        let trump = mode.trump_suit();

        let masters: Vec<Card> = legal
            .iter()
            .copied()
            .filter(|card| tracker.is_master(*card, mode, held))
            .collect();
        let welcome = |card: &Card| !tracker.partner_dislikes(card.suit);
        if let Some(card) = masters
            .iter()
            .copied()
            .filter(welcome)
            .max_by_key(|card| (tracker.partner_prefers(card.suit), card.points(mode), *card))
            .or_else(|| {
                masters
                    .iter()
                    .copied()
                    .max_by_key(|card| (card.points(mode), *card))
            })
        {
            return (card, PlayReason::LeadMaster);
        }

        if let Some(card) = legal
            .iter()
            .copied()
            .filter(|card| tracker.partner_prefers(card.suit) && Some(card.suit) != trump)
            .max_by_key(|card| (card.strength(mode), *card))
        {
            return (card, PlayReason::LeadPartnerSuit);
        }

        let mut pool: Vec<Card> = legal.iter().copied().filter(welcome).collect();
        if pool.is_empty() {
            pool = legal.to_vec();
        }

        if let Some(trump) = trump {
            let mut trumps: Vec<Card> = pool.iter().copied().filter(|c| c.suit == trump).collect();
            if trumps.len() >= 2 {
                // A middling trump draws out the higher ones.
                trumps.sort_by_key(|card| card.strength(mode));
                return (trumps[trumps.len() / 2], PlayReason::LeadTrump);
            }
        }

        let mut by_suit: BTreeMap<Suit, Vec<Card>> = BTreeMap::new();
        for card in &pool {
            by_suit.entry(card.suit).or_default().push(*card);
        }
        if let Some(card) = by_suit
            .values()
            .filter(|cards| cards.len() >= 2)
            .filter_map(|cards| cards.iter().copied().max_by_key(|c| (c.strength(mode), *c)))
            .max_by_key(|card| (card.strength(mode), *card))
        {
            return (card, PlayReason::LeadLongSuit);
        }

        let highest = pool
            .iter()
            .copied()
            .max_by_key(|card| (card.strength(mode), *card))
            .unwrap_or(legal[0]);
        (highest, PlayReason::LeadHighest)
    }
}

fn most_valuable(legal: &[Card], mode: GameMode) -> Option<Card> {
    legal
        .iter()
        .copied()
        .max_by_key(|card| (card_cost(*card, mode), *card))
}

fn least_valuable(legal: &[Card], mode: GameMode) -> Option<Card> {
    legal
        .iter()
        .copied()
        .min_by_key(|card| (card_cost(*card, mode), *card))
}
