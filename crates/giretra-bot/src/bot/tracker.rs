use giretra_core::model::card::Card;
use giretra_core::model::game_mode::GameMode;
use giretra_core::model::hand_state::HandState;
use giretra_core::model::player::PlayerPosition;
use giretra_core::model::rank::Rank;
use giretra_core::model::suit::Suit;
use giretra_core::model::trick::beats;
use std::collections::BTreeSet;

/// What one seat has seen of the current deal: played cards, suits other
/// seats have shown void in, and which suits the partner seems to like.
#[derive(Debug, Clone)]
pub struct UnseenTracker {
    seat: PlayerPosition,
    played: BTreeSet<Card>,
    voids: [[bool; 4]; 4],
    partner_preferred: BTreeSet<Suit>,
    partner_disliked: BTreeSet<Suit>,
}

impl UnseenTracker {
    pub fn new(seat: PlayerPosition) -> Self {
        Self {
            seat,
            played: BTreeSet::new(),
            voids: [[false; 4]; 4],
            partner_preferred: BTreeSet::new(),
            partner_disliked: BTreeSet::new(),
        }
    }

    pub fn seat(&self) -> PlayerPosition {
        self.seat
    }

    pub fn reset_for_deal(&mut self) {
        self.played.clear();
        self.voids = [[false; 4]; 4];
        self.partner_preferred.clear();
        self.partner_disliked.clear();
    }

    pub fn is_played(&self, card: Card) -> bool {
        self.played.contains(&card)
    }

    pub fn played_count(&self) -> usize {
        self.played.len()
    }

    pub fn is_void(&self, seat: PlayerPosition, suit: Suit) -> bool {
        self.voids[seat.index()][suit.index()]
    }

    pub fn partner_prefers(&self, suit: Suit) -> bool {
        self.partner_preferred.contains(&suit)
    }

    pub fn partner_dislikes(&self, suit: Suit) -> bool {
        self.partner_disliked.contains(&suit)
    }

    /// Records `card` once it is on the table; `play` is the state after it.
    pub fn note_card_played(&mut self, player: PlayerPosition, card: Card, play: &HandState) {
        self.played.insert(card);

        let mode = play.mode();
        // The card may have closed the trick, in which case it is the last
        // completed one rather than the current one.
        let trick = match play.current_trick() {
            Some(trick) if !trick.plays().is_empty() => trick,
            _ => match play.last_completed_trick() {
                Some(completed) => &completed.trick,
                None => return,
            },
        };
        let Some(lead_suit) = trick.lead_suit() else {
            return;
        };

        if card.suit != lead_suit {
            self.voids[player.index()][lead_suit.index()] = true;
        }

        if player != self.seat.teammate() {
            return;
        }
        if trick.leader() == player {
            self.partner_preferred.insert(card.suit);
            return;
        }

        // Partner shed a high card while the trick was going to the other side.
        let before = &trick.plays()[..trick.plays().len().saturating_sub(1)];
        let winning_before = before
            .iter()
            .copied()
            .reduce(|best, next| {
                if beats(next.card, best.card, lead_suit, mode) {
                    next
                } else {
                    best
                }
            });
        let losing = winning_before.is_some_and(|best| best.player.team() != self.seat.team());
        if losing && card.points(mode) >= 8 {
            self.partner_disliked.insert(card.suit);
            self.partner_preferred.remove(&card.suit);
        }
    }

    /// Whether no unseen card of the same suit outranks `card`.
    pub fn is_master(&self, card: Card, mode: GameMode, hand: &[Card]) -> bool {
        Rank::ORDERED.iter().all(|&rank| {
            let other = Card::new(rank, card.suit);
            other == card
                || self.played.contains(&other)
                || hand.contains(&other)
                || other.strength(mode) < card.strength(mode)
        })
    }
}
