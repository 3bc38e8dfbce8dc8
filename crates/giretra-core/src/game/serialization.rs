use super::deal::DealPhase;
use super::match_state::MatchState;
use crate::model::game_mode::GameMode;
use crate::model::hand_state::{CompletedTrick, HandState};
use crate::model::player::{PlayerPosition, Team};
use crate::model::score::DealResult;
use crate::model::trick::TrickState;
use crate::negotiation::{NegotiationAction, NegotiationState};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WireError {
    #[error("action {0} was not among the offered actions")]
    NotOffered(String),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoubledMode {
    pub mode: GameMode,
    /// Index into `actions` of the action that doubled the mode.
    pub action_index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColourClaim {
    pub team: Team,
    pub mode: GameMode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NegotiationSnapshot {
    pub dealer: PlayerPosition,
    pub current_player: PlayerPosition,
    pub actions: Vec<NegotiationAction>,
    pub current_bid: Option<GameMode>,
    pub current_bidder: Option<PlayerPosition>,
    pub is_complete: bool,
    pub consecutive_accepts: u8,
    pub doubled_modes: Vec<DoubledMode>,
    pub redoubled_modes: Vec<GameMode>,
    pub team_colour_announcements: Vec<ColourClaim>,
    pub players_who_accepted: Vec<PlayerPosition>,
    pub has_double_occurred: bool,
}

impl NegotiationSnapshot {
    pub fn capture(state: &NegotiationState) -> Self {
        Self {
            dealer: state.dealer(),
            current_player: state.current_player(),
            actions: state.actions().to_vec(),
            current_bid: state.current_bid(),
            current_bidder: state.current_bidder(),
            is_complete: state.is_complete(),
            consecutive_accepts: state.consecutive_accepts(),
            doubled_modes: state
                .doubled_modes()
                .iter()
                .map(|(mode, index)| DoubledMode {
                    mode: *mode,
                    action_index: *index,
                })
                .collect(),
            redoubled_modes: state.redoubled_modes().iter().copied().collect(),
            team_colour_announcements: state
                .team_colour_announcements()
                .iter()
                .map(|(team, mode)| ColourClaim {
                    team: *team,
                    mode: *mode,
                })
                .collect(),
            players_who_accepted: state.players_who_accepted().iter().copied().collect(),
            has_double_occurred: state.has_double_occurred(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandSnapshot {
    pub mode: GameMode,
    pub completed_tricks: Vec<CompletedTrick>,
    pub current_trick: Option<TrickState>,
    pub team1_card_points: u32,
    pub team2_card_points: u32,
    pub team1_tricks_won: u8,
    pub team2_tricks_won: u8,
}

impl HandSnapshot {
    pub fn capture(state: &HandState) -> Self {
        Self {
            mode: state.mode(),
            completed_tricks: state.completed_tricks().to_vec(),
            current_trick: state.current_trick().cloned(),
            team1_card_points: state.card_points(Team::Team1),
            team2_card_points: state.card_points(Team::Team2),
            team1_tricks_won: state.tricks_won(Team::Team1),
            team2_tricks_won: state.tricks_won(Team::Team2),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSnapshot {
    pub target_score: u32,
    pub team1_match_points: u32,
    pub team2_match_points: u32,
    pub current_dealer: PlayerPosition,
    pub deal_phase: Option<DealPhase>,
    pub completed_deals: Vec<DealResult>,
    pub is_complete: bool,
    pub winner: Option<Team>,
}

impl MatchSnapshot {
    pub fn capture(state: &MatchState) -> Self {
        Self {
            target_score: state.target_score(),
            team1_match_points: state.match_points(Team::Team1),
            team2_match_points: state.match_points(Team::Team2),
            current_dealer: state.current_dealer(),
            deal_phase: state.current_deal().map(|deal| deal.phase()),
            completed_deals: state.completed_deals().to_vec(),
            is_complete: state.is_complete(),
            winner: state.winner(),
        }
    }

    pub fn to_json(state: &MatchState) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&Self::capture(state))
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// A negotiation action as a remote player sends it: the seat is implied by
/// whoever was asked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionDto {
    Announce { mode: GameMode },
    Accept,
    Double { mode: GameMode },
    Redouble { mode: GameMode },
}

impl From<&NegotiationAction> for ActionDto {
    fn from(action: &NegotiationAction) -> Self {
        match *action {
            NegotiationAction::Announce { mode, .. } => ActionDto::Announce { mode },
            NegotiationAction::Accept { .. } => ActionDto::Accept,
            NegotiationAction::Double { mode, .. } => ActionDto::Double { mode },
            NegotiationAction::Redouble { mode, .. } => ActionDto::Redouble { mode },
        }
    }
}

/// Maps a returned wire action onto the offered action it names.
pub fn match_action(
    dto: &ActionDto,
    offered: &[NegotiationAction],
) -> Result<NegotiationAction, WireError> {
    offered
        .iter()
        .find(|action| ActionDto::from(*action) == *dto)
        .copied()
        .ok_or_else(|| {
            WireError::NotOffered(serde_json::to_string(dto).unwrap_or_else(|_| format!("{dto:?}")))
        })
}

pub fn action_from_json(
    json: &str,
    offered: &[NegotiationAction],
) -> Result<NegotiationAction, WireError> {
    let dto: ActionDto = serde_json::from_str(json)?;
    match_action(&dto, offered)
}

#[cfg(test)]
mod tests {
    use super::{
        ActionDto, HandSnapshot, MatchSnapshot, NegotiationSnapshot, WireError, action_from_json,
        match_action,
    };
    use crate::game::match_state::MatchState;
    use crate::model::card::Card;
    use crate::model::game_mode::GameMode;
    use crate::model::hand_state::HandState;
    use crate::model::player::PlayerPosition;
    use crate::model::rank::Rank;
    use crate::model::suit::Suit;
    use crate::negotiation::{NegotiationAction, NegotiationState, valid_actions};

    #[test]
    fn negotiation_snapshot_lists_doubles_with_indices() {
        let state = NegotiationState::new(PlayerPosition::Right)
            .apply(NegotiationAction::Announce {
                player: PlayerPosition::Bottom,
                mode: GameMode::NoTrumps,
            })
            .unwrap()
            .apply(NegotiationAction::Accept {
                player: PlayerPosition::Left,
            })
            .unwrap();
        let snapshot = NegotiationSnapshot::capture(&state);
        assert_eq!(snapshot.doubled_modes.len(), 1);
        assert_eq!(snapshot.doubled_modes[0].action_index, 1);
        assert!(snapshot.has_double_occurred);

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["doubled_modes"][0]["mode"], "NoTrumps");
        assert_eq!(json["actions"][1]["type"], "accept");
        let back: NegotiationSnapshot = serde_json::from_value(json).unwrap();
        assert_eq!(back, snapshot);
    }

    #[test]
    fn hand_snapshot_carries_current_trick() {
        let hand = HandState::new(GameMode::ColourHearts, PlayerPosition::Left)
            .play_card(PlayerPosition::Left, Card::new(Rank::Ace, Suit::Clubs))
            .unwrap();
        let snapshot = HandSnapshot::capture(&hand);
        assert_eq!(snapshot.current_trick.as_ref().unwrap().plays().len(), 1);
        assert!(snapshot.completed_tricks.is_empty());
        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(json.contains("\"mode\":\"ColourHearts\""));
    }

    #[test]
    fn match_snapshot_roundtrips_through_json() {
        let state = MatchState::with_target(PlayerPosition::Top, 250);
        let json = MatchSnapshot::to_json(&state).unwrap();
        assert!(json.contains("\"target_score\": 250"));
        let snapshot = MatchSnapshot::from_json(&json).unwrap();
        assert_eq!(snapshot, MatchSnapshot::capture(&state));
    }

    #[test]
    fn returned_action_maps_to_offered_instance() {
        let state = NegotiationState::new(PlayerPosition::Bottom);
        let offered = valid_actions(&state);
        let picked = action_from_json(r#"{"type":"announce","mode":"AllTrumps"}"#, &offered).unwrap();
        assert_eq!(
            picked,
            NegotiationAction::Announce {
                player: PlayerPosition::Left,
                mode: GameMode::AllTrumps,
            }
        );

        assert!(matches!(
            match_action(&ActionDto::Accept, &offered),
            Err(WireError::NotOffered(_))
        ));
        assert!(matches!(
            action_from_json("{\"type\":\"fold\"}", &offered),
            Err(WireError::Json(_))
        ));
    }
}
