use crate::model::card::Card;
use crate::model::game_mode::{GameMode, GameModeCategory};
use crate::model::hand::Hand;
use crate::model::player::PlayerPosition;
use crate::model::trick::{TrickState, beats};

/// Cards `player` may legally put on `trick` from `hand`.
pub fn legal_plays(
    player: PlayerPosition,
    hand: &Hand,
    trick: &TrickState,
    mode: GameMode,
) -> Vec<Card> {
    let Some(lead_suit) = trick.lead_suit() else {
        return hand.cards().to_vec();
    };

    let following: Vec<Card> = hand.of_suit(lead_suit).collect();
    if !following.is_empty() {
        return follow_suit(following, trick, mode);
    }

    match (mode.category(), mode.trump_suit()) {
        (GameModeCategory::Colour, Some(trump)) => {
            let trumps: Vec<Card> = hand.of_suit(trump).collect();
            if trumps.is_empty() {
                return hand.cards().to_vec();
            }
            must_trump(player, hand, trumps, trick, mode)
        }
        _ => hand.cards().to_vec(),
    }
}

pub fn is_legal_play(
    player: PlayerPosition,
    hand: &Hand,
    trick: &TrickState,
    mode: GameMode,
    card: Card,
) -> bool {
    legal_plays(player, hand, trick, mode).contains(&card)
}

fn follow_suit(following: Vec<Card>, trick: &TrickState, mode: GameMode) -> Vec<Card> {
    let lead_suit = trick.lead_suit();
    let must_beat = match mode.category() {
        GameModeCategory::AllTrumps => true,
        GameModeCategory::Colour => lead_suit.is_some() && lead_suit == mode.trump_suit(),
        GameModeCategory::NoTrumps => false,
    };
    if !must_beat {
        return following;
    }

    let (Some(lead_suit), Some(best)) = (lead_suit, trick.winning_play(mode)) else {
        return following;
    };
    if best.card.suit != lead_suit {
        return following;
    }

    let higher: Vec<Card> = following
        .iter()
        .copied()
        .filter(|card| beats(*card, best.card, lead_suit, mode))
        .collect();
    if higher.is_empty() { following } else { higher }
}

fn must_trump(
    player: PlayerPosition,
    hand: &Hand,
    trumps: Vec<Card>,
    trick: &TrickState,
    mode: GameMode,
) -> Vec<Card> {
    let trump_played = trick.has_trump(mode);
    let partner_holds_plain = trick
        .winning_play(mode)
        .is_some_and(|best| best.player == player.teammate() && !best.card.is_trump(mode));

    if partner_holds_plain && !trump_played {
        return hand.cards().to_vec();
    }

    if let Some(highest) = trick.highest_trump(mode) {
        let over: Vec<Card> = trumps
            .iter()
            .copied()
            .filter(|card| card.strength(mode) > highest.strength(mode))
            .collect();
        if !over.is_empty() {
            return over;
        }
    }

    trumps
}
