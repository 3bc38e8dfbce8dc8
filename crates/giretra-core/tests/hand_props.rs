use giretra_core::game::deal::{DealPhase, DealState};
use giretra_core::model::deck::Deck;
use giretra_core::model::game_mode::GameMode;
use giretra_core::model::player::{PlayerPosition, Team};
use giretra_core::negotiation::NegotiationAction;
use proptest::prelude::*;

fn mode() -> impl Strategy<Value = GameMode> {
    (0usize..GameMode::ALL.len()).prop_map(|index| GameMode::ALL[index])
}

/// Deals `seed`, lets the opener announce `mode` and everyone accept.
fn ready_to_play(seed: u64, mode: GameMode, cut: usize) -> DealState {
    let dealer = PlayerPosition::Right;
    let mut deal = DealState::new(dealer, Deck::shuffled_with_seed(seed))
        .cut(cut, seed % 2 == 0)
        .unwrap()
        .distribute_initial()
        .unwrap()
        .apply_negotiation(NegotiationAction::Announce {
            player: dealer.next(),
            mode,
        })
        .unwrap();
    while deal.phase() == DealPhase::Negotiation {
        let seat = deal.current_player().unwrap();
        deal = deal
            .apply_negotiation(NegotiationAction::Accept { player: seat })
            .unwrap();
    }
    deal.distribute_final().unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// Tricks and card points always add up, whatever legal cards are chosen.
    #[test]
    fn prop_hand_totals_match_mode(
        seed in any::<u64>(),
        mode in mode(),
        cut in 6usize..=26,
        picks in proptest::collection::vec(0usize..8, 32),
    ) {
        let mut deal = ready_to_play(seed, mode, cut);
        for pick in picks {
            if deal.phase() != DealPhase::Playing {
                break;
            }
            let legal = deal.legal_plays();
            prop_assert!(!legal.is_empty());
            let seat = deal.current_player().unwrap();
            prop_assert!(legal.iter().all(|card| deal.hand_of(seat).contains(*card)));

            deal = deal.play_card(seat, legal[pick % legal.len()]).unwrap();
            let hand = deal.hand_state().unwrap();
            prop_assert_eq!(
                usize::from(hand.tricks_won(Team::Team1) + hand.tricks_won(Team::Team2)),
                hand.completed_tricks().len()
            );
        }

        prop_assert_eq!(deal.phase(), DealPhase::Completed);
        let hand = deal.hand_state().unwrap();
        prop_assert_eq!(hand.completed_tricks().len(), 8);
        prop_assert_eq!(
            hand.card_points(Team::Team1) + hand.card_points(Team::Team2),
            mode.total_points()
        );

        let result = deal.result().unwrap();
        prop_assert_eq!(result.mode, mode);
        prop_assert_eq!(result.was_sweep, hand.sweeping_team().is_some());
        if result.is_instant_win {
            prop_assert!(mode.is_colour());
        }
    }
}
