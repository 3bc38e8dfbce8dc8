use crate::model::card::Card;
use crate::model::deck::{Deck, DeckError};
use crate::model::hand::Hand;
use crate::model::hand_state::{HandState, PlayError};
use crate::model::play_rules;
use crate::model::player::{PlayerPosition, Team};
use crate::model::score::{self, DealResult};
use crate::negotiation::{NegotiationAction, NegotiationError, NegotiationState, ResolvedContract};
use core::fmt;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{Level, event};

/// Cards dealt per seat in each pass of the opening distribution.
const INITIAL_PACKETS: [usize; 2] = [3, 2];
/// Cards dealt per seat once the contract is known.
const FINAL_PACKET: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DealPhase {
    AwaitingCut,
    InitialDistribution,
    Negotiation,
    FinalDistribution,
    Playing,
    Completed,
}

impl fmt::Display for DealPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DealPhase::AwaitingCut => "awaiting cut",
            DealPhase::InitialDistribution => "initial distribution",
            DealPhase::Negotiation => "negotiation",
            DealPhase::FinalDistribution => "final distribution",
            DealPhase::Playing => "playing",
            DealPhase::Completed => "completed",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DealError {
    #[error("cannot {operation} during {phase}")]
    WrongPhase {
        operation: &'static str,
        phase: DealPhase,
    },
    #[error(transparent)]
    Deck(#[from] DeckError),
    #[error(transparent)]
    Negotiation(#[from] NegotiationError),
    #[error(transparent)]
    Play(#[from] PlayError),
    #[error("{player} does not hold {card}")]
    CardNotHeld { player: PlayerPosition, card: Card },
    #[error("{player} may not play {card} here")]
    IllegalPlay { player: PlayerPosition, card: Card },
}

/// One deal from the cut to the scored hand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DealState {
    phase: DealPhase,
    dealer: PlayerPosition,
    deck: Deck,
    hands: [Hand; 4],
    negotiation: Option<NegotiationState>,
    contract: Option<ResolvedContract>,
    hand: Option<HandState>,
    result: Option<DealResult>,
}

impl DealState {
    pub fn new(dealer: PlayerPosition, deck: Deck) -> Self {
        Self {
            phase: DealPhase::AwaitingCut,
            dealer,
            deck,
            hands: Default::default(),
            negotiation: None,
            contract: None,
            hand: None,
            result: None,
        }
    }

    pub fn phase(&self) -> DealPhase {
        self.phase
    }

    pub fn dealer(&self) -> PlayerPosition {
        self.dealer
    }

    /// The seat that cuts: the dealer's right.
    pub fn cutter(&self) -> PlayerPosition {
        self.dealer.previous()
    }

    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    pub fn hand_of(&self, seat: PlayerPosition) -> &Hand {
        &self.hands[seat.index()]
    }

    pub fn negotiation(&self) -> Option<&NegotiationState> {
        self.negotiation.as_ref()
    }

    pub fn contract(&self) -> Option<ResolvedContract> {
        self.contract
    }

    pub fn hand_state(&self) -> Option<&HandState> {
        self.hand.as_ref()
    }

    pub fn result(&self) -> Option<&DealResult> {
        self.result.as_ref()
    }

    /// Seat expected to act next, whatever the phase.
    pub fn current_player(&self) -> Option<PlayerPosition> {
        match self.phase {
            DealPhase::AwaitingCut => Some(self.cutter()),
            DealPhase::Negotiation => self.negotiation.as_ref().map(NegotiationState::current_player),
            DealPhase::Playing => self.hand.as_ref().and_then(HandState::current_player),
            _ => None,
        }
    }

    /// Legal cards for the seat on turn; empty outside the playing phase.
    pub fn legal_plays(&self) -> Vec<Card> {
        let Some(hand) = self.hand.as_ref() else {
            return Vec::new();
        };
        match (hand.current_player(), hand.current_trick()) {
            (Some(seat), Some(trick)) => {
                play_rules::legal_plays(seat, self.hand_of(seat), trick, hand.mode())
            }
            _ => Vec::new(),
        }
    }

    pub fn cut(&self, position: usize, from_top: bool) -> Result<DealState, DealError> {
        self.expect_phase(DealPhase::AwaitingCut, "cut the deck")?;
        let mut next = self.clone();
        next.deck = self.deck.cut(position, from_top)?;
        next.phase = DealPhase::InitialDistribution;
        Ok(next)
    }

    /// Deals five cards to each seat (three, then two) and opens the bidding.
    pub fn distribute_initial(&self) -> Result<DealState, DealError> {
        self.expect_phase(DealPhase::InitialDistribution, "deal the opening cards")?;
        let mut next = self.clone();
        for packet in INITIAL_PACKETS {
            next.deal_round(packet)?;
        }
        next.negotiation = Some(NegotiationState::new(self.dealer));
        next.phase = DealPhase::Negotiation;
        Ok(next)
    }

    pub fn apply_negotiation(&self, action: NegotiationAction) -> Result<DealState, DealError> {
        self.expect_phase(DealPhase::Negotiation, "negotiate")?;
        let current = self
            .negotiation
            .as_ref()
            .ok_or(DealError::WrongPhase {
                operation: "negotiate",
                phase: self.phase,
            })?;

        let negotiation = current.apply(action)?;
        let mut next = self.clone();
        if negotiation.is_complete() {
            let contract = negotiation.resolve_final_mode()?;
            event!(
                target: "giretra_core::negotiation",
                Level::DEBUG,
                mode = %contract.mode,
                announcer = %contract.announcer_team,
                multiplier = ?contract.multiplier,
                "contract resolved"
            );
            next.contract = Some(contract);
            next.phase = DealPhase::FinalDistribution;
        }
        next.negotiation = Some(negotiation);
        Ok(next)
    }

    /// Deals the last three cards per seat and opens play with the dealer's left.
    pub fn distribute_final(&self) -> Result<DealState, DealError> {
        self.expect_phase(DealPhase::FinalDistribution, "deal the remaining cards")?;
        let contract = self.contract.ok_or(DealError::WrongPhase {
            operation: "deal the remaining cards",
            phase: self.phase,
        })?;

        let mut next = self.clone();
        next.deal_round(FINAL_PACKET)?;
        next.hand = Some(HandState::new(contract.mode, self.dealer.next()));
        next.phase = DealPhase::Playing;
        Ok(next)
    }

    pub fn play_card(&self, player: PlayerPosition, card: Card) -> Result<DealState, DealError> {
        self.expect_phase(DealPhase::Playing, "play a card")?;
        let (Some(hand), Some(contract)) = (self.hand.as_ref(), self.contract) else {
            return Err(DealError::WrongPhase {
                operation: "play a card",
                phase: self.phase,
            });
        };

        if let Some(expected) = hand.current_player()
            && expected != player
        {
            return Err(PlayError::OutOfTurn {
                expected,
                actual: player,
            }
            .into());
        }
        if !self.hand_of(player).contains(card) {
            return Err(DealError::CardNotHeld { player, card });
        }
        if let Some(trick) = hand.current_trick()
            && !play_rules::is_legal_play(player, self.hand_of(player), trick, hand.mode(), card)
        {
            return Err(DealError::IllegalPlay { player, card });
        }

        let played = hand.play_card(player, card)?;
        let mut next = self.clone();
        next.hands[player.index()].remove(card);

        if played.is_complete() {
            let result = score::calculate(
                contract.mode,
                contract.multiplier,
                contract.announcer_team,
                played.card_points(Team::Team1),
                played.card_points(Team::Team2),
                played.sweeping_team(),
            );
            event!(
                target: "giretra_core::play",
                Level::DEBUG,
                mode = %result.mode,
                team1 = result.team1_match_points,
                team2 = result.team2_match_points,
                instant_win = result.is_instant_win,
                "deal scored"
            );
            next.result = Some(result);
            next.phase = DealPhase::Completed;
        }
        next.hand = Some(played);
        Ok(next)
    }

    fn expect_phase(&self, phase: DealPhase, operation: &'static str) -> Result<(), DealError> {
        if self.phase == phase {
            Ok(())
        } else {
            Err(DealError::WrongPhase {
                operation,
                phase: self.phase,
            })
        }
    }

    fn deal_round(&mut self, count: usize) -> Result<(), DealError> {
        for seat in self.dealer.play_order() {
            let (cards, rest) = self.deck.deal(count)?;
            self.hands[seat.index()].extend(cards);
            self.deck = rest;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{DealError, DealPhase, DealState};
    use crate::model::deck::Deck;
    use crate::model::game_mode::GameMode;
    use crate::model::player::PlayerPosition;
    use crate::negotiation::{NegotiationAction, NegotiationError};

    fn negotiated(dealer: PlayerPosition, mode: GameMode) -> DealState {
        let opener = dealer.next();
        let mut deal = DealState::new(dealer, Deck::standard())
            .cut(16, true)
            .unwrap()
            .distribute_initial()
            .unwrap();
        deal = deal
            .apply_negotiation(NegotiationAction::Announce { player: opener, mode })
            .unwrap();
        let mut seat = opener.next();
        while deal.phase() == DealPhase::Negotiation {
            deal = deal
                .apply_negotiation(NegotiationAction::Accept { player: seat })
                .unwrap();
            seat = seat.next();
        }
        deal
    }

    #[test]
    fn cutter_is_dealers_right() {
        let deal = DealState::new(PlayerPosition::Bottom, Deck::standard());
        assert_eq!(deal.cutter(), PlayerPosition::Right);
        assert_eq!(deal.current_player(), Some(PlayerPosition::Right));
    }

    #[test]
    fn initial_distribution_gives_five_cards_each() {
        let deal = DealState::new(PlayerPosition::Top, Deck::standard())
            .cut(10, false)
            .unwrap()
            .distribute_initial()
            .unwrap();
        for seat in PlayerPosition::LOOP {
            assert_eq!(deal.hand_of(seat).len(), 5);
        }
        assert_eq!(deal.deck().len(), 12);
        assert_eq!(deal.current_player(), Some(PlayerPosition::Right));
    }

    #[test]
    fn phases_are_enforced() {
        let deal = DealState::new(PlayerPosition::Bottom, Deck::standard());
        assert!(matches!(
            deal.distribute_initial(),
            Err(DealError::WrongPhase { phase: DealPhase::AwaitingCut, .. })
        ));
        assert!(matches!(deal.cut(3, true), Err(DealError::Deck(_))));
        assert_eq!(deal.phase(), DealPhase::AwaitingCut);
    }

    #[test]
    fn negotiation_errors_surface_unchanged() {
        let deal = DealState::new(PlayerPosition::Bottom, Deck::standard())
            .cut(16, true)
            .unwrap()
            .distribute_initial()
            .unwrap();
        assert_eq!(
            deal.apply_negotiation(NegotiationAction::Accept { player: PlayerPosition::Left }),
            Err(DealError::Negotiation(NegotiationError::NoBid))
        );
    }

    #[test]
    fn final_distribution_starts_play_left_of_dealer() {
        let deal = negotiated(PlayerPosition::Bottom, GameMode::ColourHearts);
        assert_eq!(deal.phase(), DealPhase::FinalDistribution);
        assert_eq!(deal.contract().unwrap().mode, GameMode::ColourHearts);

        let deal = deal.distribute_final().unwrap();
        assert_eq!(deal.phase(), DealPhase::Playing);
        assert!(deal.deck().is_empty());
        for seat in PlayerPosition::LOOP {
            assert_eq!(deal.hand_of(seat).len(), 8);
        }
        assert_eq!(deal.current_player(), Some(PlayerPosition::Left));
    }

    #[test]
    fn rejects_cards_not_held_or_illegal() {
        let deal = negotiated(PlayerPosition::Bottom, GameMode::NoTrumps)
            .distribute_final()
            .unwrap();
        let leader = PlayerPosition::Left;
        let foreign = deal.hand_of(PlayerPosition::Top).cards()[0];
        assert_eq!(
            deal.play_card(leader, foreign),
            Err(DealError::CardNotHeld {
                player: leader,
                card: foreign
            })
        );

        let lead = deal.hand_of(leader).cards()[0];
        let deal = deal.play_card(leader, lead).unwrap();
        let follower = PlayerPosition::Top;
        let hand = deal.hand_of(follower);
        if hand.has_suit(lead.suit)
            && let Some(off) = hand.iter().find(|card| card.suit != lead.suit)
        {
            assert_eq!(
                deal.play_card(follower, *off),
                Err(DealError::IllegalPlay {
                    player: follower,
                    card: *off
                })
            );
        }
    }

    #[test]
    fn playing_out_the_hand_produces_a_result() {
        let mut deal = negotiated(PlayerPosition::Right, GameMode::AllTrumps)
            .distribute_final()
            .unwrap();
        while deal.phase() == DealPhase::Playing {
            let seat = deal.current_player().unwrap();
            let card = deal.legal_plays()[0];
            deal = deal.play_card(seat, card).unwrap();
        }
        let result = deal.result().unwrap();
        assert_eq!(
            result.team1_card_points + result.team2_card_points,
            GameMode::AllTrumps.total_points()
        );
        for seat in PlayerPosition::LOOP {
            assert!(deal.hand_of(seat).is_empty());
        }
        assert!(deal.legal_plays().is_empty());
    }
}
