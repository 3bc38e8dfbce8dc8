use crate::model::card::Card;
use crate::model::rank::Rank;
use crate::model::suit::Suit;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use thiserror::Error;

pub const DECK_SIZE: usize = 32;
pub const MIN_CUT: usize = 6;
pub const MAX_CUT: usize = 26;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deck {
    cards: Vec<Card>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeckError {
    #[error("cut position {0} must be between {MIN_CUT} and {MAX_CUT}")]
    CutOutOfRange(usize),
    #[error("only a full deck can be cut ({0} cards present)")]
    IncompleteDeck(usize),
    #[error("cannot deal {requested} cards when only {remaining} remain")]
    NotEnoughCards { requested: usize, remaining: usize },
}

impl Deck {
    pub fn standard() -> Self {
        let mut cards = Vec::with_capacity(DECK_SIZE);
        for suit in Suit::ALL.iter().copied() {
            for rank in Rank::ORDERED.iter().copied() {
                cards.push(Card::new(rank, suit));
            }
        }
        Self { cards }
    }

    pub fn from_cards(cards: Vec<Card>) -> Self {
        Self { cards }
    }

    pub fn shuffled<R: rand::Rng + ?Sized>(rng: &mut R) -> Self {
        let mut deck = Self::standard();
        deck.cards.shuffle(rng);
        deck
    }

    pub fn shuffled_with_seed(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        Self::shuffled(&mut rng)
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Lifts `position` cards (counted from the top, or from the bottom when
    /// `from_top` is false) and moves the remaining portion on top of them.
    pub fn cut(&self, position: usize, from_top: bool) -> Result<Deck, DeckError> {
        if !(MIN_CUT..=MAX_CUT).contains(&position) {
            return Err(DeckError::CutOutOfRange(position));
        }
        if self.cards.len() != DECK_SIZE {
            return Err(DeckError::IncompleteDeck(self.cards.len()));
        }

        let split = if from_top {
            position
        } else {
            DECK_SIZE - position
        };
        let mut cards = Vec::with_capacity(DECK_SIZE);
        cards.extend_from_slice(&self.cards[split..]);
        cards.extend_from_slice(&self.cards[..split]);
        Ok(Deck { cards })
    }

    pub fn deal(&self, count: usize) -> Result<(Vec<Card>, Deck), DeckError> {
        if count > self.cards.len() {
            return Err(DeckError::NotEnoughCards {
                requested: count,
                remaining: self.cards.len(),
            });
        }
        let dealt = self.cards[..count].to_vec();
        let remaining = Deck {
            cards: self.cards[count..].to_vec(),
        };
        Ok((dealt, remaining))
    }
}

#[cfg(test)]
mod tests {
    use super::{Deck, DeckError};
    use std::collections::HashSet;

    #[test]
    fn standard_deck_has_32_unique_cards() {
        let deck = Deck::standard();
        assert_eq!(deck.len(), 32);
        let unique: HashSet<_> = deck.cards().iter().collect();
        assert_eq!(unique.len(), 32);
    }

    #[test]
    fn shuffle_with_seed_is_deterministic() {
        let deck_a = Deck::shuffled_with_seed(42);
        let deck_b = Deck::shuffled_with_seed(42);
        assert_eq!(deck_a.cards(), deck_b.cards());
    }

    #[test]
    fn shuffle_with_different_seeds_differs() {
        let deck_a = Deck::shuffled_with_seed(1);
        let deck_b = Deck::shuffled_with_seed(2);
        assert_ne!(deck_a.cards(), deck_b.cards());
    }

    #[test]
    fn cut_moves_bottom_portion_on_top() {
        let deck = Deck::standard();
        let cut = deck.cut(6, true).unwrap();
        assert_eq!(cut.cards()[0], deck.cards()[6]);
        assert_eq!(cut.cards()[26], deck.cards()[0]);

        let from_bottom = deck.cut(6, false).unwrap();
        assert_eq!(from_bottom.cards()[0], deck.cards()[26]);
        assert_eq!(from_bottom.len(), 32);
    }

    #[test]
    fn cut_rejects_out_of_range_and_partial_decks() {
        let deck = Deck::standard();
        assert_eq!(deck.cut(5, true), Err(DeckError::CutOutOfRange(5)));
        assert_eq!(deck.cut(27, true), Err(DeckError::CutOutOfRange(27)));

        let (_, rest) = deck.deal(3).unwrap();
        assert_eq!(rest.cut(10, true), Err(DeckError::IncompleteDeck(29)));

        let stacked = Deck::from_cards(deck.cards()[..8].to_vec());
        assert_eq!(stacked.cut(6, false), Err(DeckError::IncompleteDeck(8)));
    }

    #[test]
    fn deal_takes_from_the_top() {
        let deck = Deck::standard();
        let (dealt, rest) = deck.deal(5).unwrap();
        assert_eq!(dealt.as_slice(), &deck.cards()[..5]);
        assert_eq!(rest.len(), 27);
        assert!(matches!(
            rest.deal(28),
            Err(DeckError::NotEnoughCards { requested: 28, remaining: 27 })
        ));
    }
}
