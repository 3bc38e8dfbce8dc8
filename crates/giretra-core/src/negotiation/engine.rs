//! Legality queries over a [`NegotiationState`]. Every function here is pure;
//! [`NegotiationState::apply`] calls [`validate_action`] before touching state.

use std::collections::BTreeSet;

use super::action::NegotiationAction;
use super::error::NegotiationError;
use super::state::NegotiationState;
use crate::model::game_mode::GameMode;
use crate::model::player::PlayerPosition;

pub fn can_accept(state: &NegotiationState) -> bool {
    !state.is_complete() && state.current_bid().is_some()
}

pub fn can_announce(state: &NegotiationState, mode: GameMode) -> bool {
    announce_error(state, state.current_player(), mode).is_none()
}

/// Whether the current player may double anything, and which modes.
pub fn can_double(state: &NegotiationState) -> (bool, BTreeSet<GameMode>) {
    if state.is_complete() {
        return (false, BTreeSet::new());
    }
    let player = state.current_player();
    let modes: BTreeSet<GameMode> = state
        .announcements()
        .filter(|(announcer, _)| announcer.team() != player.team())
        .map(|(_, mode)| mode)
        .filter(|mode| !state.is_doubled(*mode) && !state.has_forfeited(player, *mode))
        .collect();
    (!modes.is_empty(), modes)
}

pub fn can_redouble(state: &NegotiationState, mode: GameMode) -> bool {
    !state.is_complete() && redouble_error(state, state.current_player(), mode).is_none()
}

/// Every action the current player may take, Accept first, then
/// announcements by bid order, then doubles, then redoubles.
pub fn valid_actions(state: &NegotiationState) -> Vec<NegotiationAction> {
    if state.is_complete() {
        return Vec::new();
    }

    let player = state.current_player();
    let mut actions = Vec::new();

    if can_accept(state) {
        actions.push(NegotiationAction::Accept { player });
    }

    actions.extend(
        GameMode::ALL
            .into_iter()
            .filter(|mode| can_announce(state, *mode))
            .map(|mode| NegotiationAction::Announce { player, mode }),
    );

    let (_, doubleable) = can_double(state);
    actions.extend(
        doubleable
            .into_iter()
            .map(|mode| NegotiationAction::Double { player, mode }),
    );

    actions.extend(
        state
            .doubled_modes()
            .keys()
            .copied()
            .filter(|mode| can_redouble(state, *mode))
            .map(|mode| NegotiationAction::Redouble { player, mode }),
    );

    actions
}

/// Checks `action` against the state without applying it.
pub fn validate_action(
    state: &NegotiationState,
    action: &NegotiationAction,
) -> Result<(), NegotiationError> {
    if state.is_complete() {
        return Err(NegotiationError::Complete);
    }

    let player = action.player();
    if player != state.current_player() {
        return Err(NegotiationError::OutOfTurn {
            expected: state.current_player(),
            actual: player,
        });
    }

    let failure = match *action {
        NegotiationAction::Announce { mode, .. } => announce_error(state, player, mode),
        NegotiationAction::Accept { .. } => {
            (!can_accept(state)).then_some(NegotiationError::NoBid)
        }
        NegotiationAction::Double { mode, .. } => double_error(state, player, mode),
        NegotiationAction::Redouble { mode, .. } => redouble_error(state, player, mode),
    };

    match failure {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

fn announce_error(
    state: &NegotiationState,
    player: PlayerPosition,
    mode: GameMode,
) -> Option<NegotiationError> {
    if state.is_complete() {
        return Some(NegotiationError::Complete);
    }
    if state.has_double_occurred() {
        return Some(NegotiationError::AnnounceAfterDouble);
    }
    if state.has_accepted(player) {
        return Some(NegotiationError::AnnounceAfterAccept(player));
    }
    if let Some(current) = state.current_bid()
        && mode <= current
    {
        return Some(NegotiationError::BidTooLow { mode, current });
    }
    if mode.is_colour() {
        let team = player.team();
        if let Some(previous) = state.team_colour_announcements().get(&team) {
            return Some(NegotiationError::ColourAlreadyAnnounced {
                team,
                previous: *previous,
            });
        }
    }
    None
}

fn double_error(
    state: &NegotiationState,
    player: PlayerPosition,
    mode: GameMode,
) -> Option<NegotiationError> {
    let announced_by_opponent = state
        .announcer_of(mode)
        .is_some_and(|announcer| announcer.team() != player.team());
    if !announced_by_opponent {
        return Some(NegotiationError::NotOpponentBid(mode));
    }
    if state.is_doubled(mode) {
        return Some(NegotiationError::AlreadyDoubled(mode));
    }
    if state.has_forfeited(player, mode) {
        return Some(NegotiationError::DoubleForfeited(mode));
    }
    None
}

fn redouble_error(
    state: &NegotiationState,
    player: PlayerPosition,
    mode: GameMode,
) -> Option<NegotiationError> {
    if !state.is_doubled(mode) {
        return Some(NegotiationError::NotDoubled(mode));
    }
    if state.is_redoubled(mode) {
        return Some(NegotiationError::AlreadyRedoubled(mode));
    }
    let own_bid = state
        .announcer_of(mode)
        .is_some_and(|announcer| announcer.team() == player.team());
    if !own_bid {
        return Some(NegotiationError::RedoubleByOpponent(mode));
    }
    if !mode.redouble_permitted() {
        return Some(NegotiationError::RedoubleNotPermitted(mode));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::{can_accept, can_announce, can_double, can_redouble, valid_actions, validate_action};
    use crate::model::game_mode::GameMode;
    use crate::model::player::PlayerPosition;
    use crate::negotiation::action::NegotiationAction;
    use crate::negotiation::error::NegotiationError;
    use crate::negotiation::state::NegotiationState;

    use PlayerPosition::{Bottom, Left, Right, Top};

    fn run(dealer: PlayerPosition, actions: &[NegotiationAction]) -> NegotiationState {
        actions.iter().fold(NegotiationState::new(dealer), |state, action| {
            state
                .apply(*action)
                .unwrap_or_else(|err| panic!("{action} rejected: {err}"))
        })
    }

    fn announce(player: PlayerPosition, mode: GameMode) -> NegotiationAction {
        NegotiationAction::Announce { player, mode }
    }

    #[test]
    fn opening_turn_offers_every_announcement_and_nothing_else() {
        let state = NegotiationState::new(Right);
        assert!(!can_accept(&state));
        let actions = valid_actions(&state);
        assert_eq!(actions.len(), GameMode::ALL.len());
        assert!(
            actions
                .iter()
                .all(|action| matches!(action, NegotiationAction::Announce { player: Bottom, .. }))
        );
        assert_eq!(
            validate_action(&state, &NegotiationAction::Accept { player: Bottom }),
            Err(NegotiationError::NoBid)
        );
    }

    #[test]
    fn announcements_must_outbid() {
        let state = run(Right, &[announce(Bottom, GameMode::ColourHearts)]);
        assert!(!can_announce(&state, GameMode::ColourClubs));
        assert!(!can_announce(&state, GameMode::ColourHearts));
        assert!(can_announce(&state, GameMode::ColourSpades));
        assert_eq!(
            validate_action(&state, &announce(Left, GameMode::ColourDiamonds)),
            Err(NegotiationError::BidTooLow {
                mode: GameMode::ColourDiamonds,
                current: GameMode::ColourHearts,
            })
        );
    }

    #[test]
    fn one_colour_per_team() {
        let state = run(
            Right,
            &[
                announce(Bottom, GameMode::ColourClubs),
                announce(Left, GameMode::ColourDiamonds),
            ],
        );
        assert_eq!(state.current_player(), Top);
        assert!(!can_announce(&state, GameMode::ColourSpades));
        assert!(can_announce(&state, GameMode::NoTrumps));
        assert!(matches!(
            validate_action(&state, &announce(Top, GameMode::ColourHearts)),
            Err(NegotiationError::ColourAlreadyAnnounced { .. })
        ));
    }

    #[test]
    fn accepted_player_cannot_announce_later() {
        let state = run(
            Right,
            &[
                announce(Bottom, GameMode::ColourHearts),
                NegotiationAction::Accept { player: Left },
                NegotiationAction::Accept { player: Top },
                announce(Right, GameMode::ColourSpades),
                NegotiationAction::Accept { player: Bottom },
            ],
        );
        assert_eq!(state.current_player(), Left);
        assert!(!state.has_double_occurred());
        assert!(!can_announce(&state, GameMode::AllTrumps));
        assert_eq!(
            validate_action(&state, &announce(Left, GameMode::AllTrumps)),
            Err(NegotiationError::AnnounceAfterAccept(Left))
        );
        assert!(can_accept(&state));
    }

    #[test]
    fn double_blocks_further_announcements() {
        let state = run(
            Right,
            &[
                announce(Bottom, GameMode::ColourHearts),
                NegotiationAction::Double {
                    player: Left,
                    mode: GameMode::ColourHearts,
                },
            ],
        );
        for mode in GameMode::ALL {
            assert!(!can_announce(&state, mode));
        }
        assert!(
            valid_actions(&state)
                .iter()
                .all(|action| !matches!(action, NegotiationAction::Announce { .. }))
        );
    }

    #[test]
    fn superseded_opponent_bids_remain_doubleable() {
        let state = run(
            Right,
            &[
                announce(Bottom, GameMode::ColourClubs),
                announce(Left, GameMode::ColourHearts),
                announce(Top, GameMode::NoTrumps),
            ],
        );
        let (any, modes) = can_double(&state);
        assert!(any);
        assert!(modes.contains(&GameMode::ColourClubs));
        assert!(modes.contains(&GameMode::NoTrumps));
        assert!(!modes.contains(&GameMode::ColourHearts));
        // Right never passed over ColourClubs by announcing.
        assert_eq!(state.current_player(), Right);
    }

    #[test]
    fn implicit_pass_forfeits_the_double() {
        let state = run(
            Right,
            &[
                announce(Bottom, GameMode::ColourDiamonds),
                announce(Left, GameMode::ColourHearts),
                NegotiationAction::Double {
                    player: Top,
                    mode: GameMode::ColourHearts,
                },
                NegotiationAction::Redouble {
                    player: Right,
                    mode: GameMode::ColourHearts,
                },
                NegotiationAction::Accept { player: Bottom },
            ],
        );
        assert_eq!(state.current_player(), Left);
        let (_, modes) = can_double(&state);
        assert!(!modes.contains(&GameMode::ColourDiamonds));
        assert_eq!(
            validate_action(
                &state,
                &NegotiationAction::Double {
                    player: Left,
                    mode: GameMode::ColourDiamonds,
                }
            ),
            Err(NegotiationError::DoubleForfeited(GameMode::ColourDiamonds))
        );
    }

    #[test]
    fn redouble_only_by_announcing_team_and_permitted_modes() {
        let state = run(
            Right,
            &[
                announce(Bottom, GameMode::ColourSpades),
                NegotiationAction::Double {
                    player: Left,
                    mode: GameMode::ColourSpades,
                },
            ],
        );
        assert_eq!(state.current_player(), Top);
        assert!(can_redouble(&state, GameMode::ColourSpades));

        let state = state.apply(NegotiationAction::Accept { player: Top }).unwrap();
        assert_eq!(
            validate_action(
                &state,
                &NegotiationAction::Redouble {
                    player: Right,
                    mode: GameMode::ColourSpades,
                }
            ),
            Err(NegotiationError::RedoubleByOpponent(GameMode::ColourSpades))
        );

        let clubs = run(
            Right,
            &[
                announce(Bottom, GameMode::ColourClubs),
                NegotiationAction::Accept { player: Left },
            ],
        );
        assert!(!can_redouble(&clubs, GameMode::ColourClubs));
        assert_eq!(
            validate_action(
                &clubs,
                &NegotiationAction::Redouble {
                    player: Top,
                    mode: GameMode::ColourClubs,
                }
            ),
            Err(NegotiationError::RedoubleNotPermitted(GameMode::ColourClubs))
        );
    }

    #[test]
    fn valid_actions_order_and_membership() {
        let state = run(
            Right,
            &[
                announce(Bottom, GameMode::ColourHearts),
                announce(Left, GameMode::ColourSpades),
            ],
        );
        let actions = valid_actions(&state);
        assert_eq!(actions[0], NegotiationAction::Accept { player: Top });
        assert_eq!(
            &actions[1..],
            &[
                announce(Top, GameMode::NoTrumps),
                announce(Top, GameMode::AllTrumps),
                NegotiationAction::Double {
                    player: Top,
                    mode: GameMode::ColourSpades,
                },
            ]
        );
        for action in &actions {
            assert_eq!(validate_action(&state, action), Ok(()));
        }
    }

    #[test]
    fn out_of_turn_and_completed_states_are_rejected() {
        let state = run(Right, &[announce(Bottom, GameMode::NoTrumps)]);
        assert_eq!(
            validate_action(&state, &NegotiationAction::Accept { player: Top }),
            Err(NegotiationError::OutOfTurn {
                expected: Left,
                actual: Top,
            })
        );

        let done = run(
            Right,
            &[
                announce(Bottom, GameMode::NoTrumps),
                NegotiationAction::Accept { player: Left },
                NegotiationAction::Accept { player: Top },
                NegotiationAction::Accept { player: Right },
            ],
        );
        assert!(valid_actions(&done).is_empty());
        assert!(!can_accept(&done));
        assert_eq!(can_double(&done), (false, Default::default()));
    }
}
