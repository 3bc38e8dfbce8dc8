use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{Level, event};

use super::action::NegotiationAction;
use super::engine;
use super::error::NegotiationError;
use crate::model::game_mode::{GameMode, Multiplier};
use crate::model::player::{PlayerPosition, Team};

/// Number of consecutive accepts that closes the bidding.
pub const ACCEPTS_TO_COMPLETE: u8 = 3;

/// Bidding state for one deal. Every transition returns a new value; a
/// rejected action leaves the original untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NegotiationState {
    dealer: PlayerPosition,
    current_player: PlayerPosition,
    actions: Vec<NegotiationAction>,
    current_bid: Option<GameMode>,
    current_bidder: Option<PlayerPosition>,
    is_complete: bool,
    consecutive_accepts: u8,
    doubled_modes: BTreeMap<GameMode, usize>,
    redoubled_modes: BTreeSet<GameMode>,
    team_colour_announcements: BTreeMap<Team, GameMode>,
    players_who_accepted: BTreeSet<PlayerPosition>,
    has_double_occurred: bool,
    forfeited_doubles: BTreeMap<PlayerPosition, BTreeSet<GameMode>>,
}

/// Outcome of a finished negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedContract {
    pub mode: GameMode,
    pub announcer_team: Team,
    pub multiplier: Multiplier,
}

impl NegotiationState {
    pub fn new(dealer: PlayerPosition) -> Self {
        Self {
            dealer,
            current_player: dealer.next(),
            actions: Vec::new(),
            current_bid: None,
            current_bidder: None,
            is_complete: false,
            consecutive_accepts: 0,
            doubled_modes: BTreeMap::new(),
            redoubled_modes: BTreeSet::new(),
            team_colour_announcements: BTreeMap::new(),
            players_who_accepted: BTreeSet::new(),
            has_double_occurred: false,
            forfeited_doubles: BTreeMap::new(),
        }
    }

    pub fn dealer(&self) -> PlayerPosition {
        self.dealer
    }

    pub fn current_player(&self) -> PlayerPosition {
        self.current_player
    }

    pub fn actions(&self) -> &[NegotiationAction] {
        &self.actions
    }

    pub fn current_bid(&self) -> Option<GameMode> {
        self.current_bid
    }

    pub fn current_bidder(&self) -> Option<PlayerPosition> {
        self.current_bidder
    }

    pub fn is_complete(&self) -> bool {
        self.is_complete
    }

    pub fn consecutive_accepts(&self) -> u8 {
        self.consecutive_accepts
    }

    /// Doubled modes with the action index at which each was doubled.
    pub fn doubled_modes(&self) -> &BTreeMap<GameMode, usize> {
        &self.doubled_modes
    }

    pub fn redoubled_modes(&self) -> &BTreeSet<GameMode> {
        &self.redoubled_modes
    }

    pub fn team_colour_announcements(&self) -> &BTreeMap<Team, GameMode> {
        &self.team_colour_announcements
    }

    pub fn players_who_accepted(&self) -> &BTreeSet<PlayerPosition> {
        &self.players_who_accepted
    }

    pub fn has_double_occurred(&self) -> bool {
        self.has_double_occurred
    }

    pub fn is_doubled(&self, mode: GameMode) -> bool {
        self.doubled_modes.contains_key(&mode)
    }

    pub fn is_redoubled(&self, mode: GameMode) -> bool {
        self.redoubled_modes.contains(&mode)
    }

    pub fn has_accepted(&self, player: PlayerPosition) -> bool {
        self.players_who_accepted.contains(&player)
    }

    /// Modes `player` gave up the right to double by announcing over them.
    pub fn forfeited_doubles(&self, player: PlayerPosition) -> impl Iterator<Item = GameMode> + '_ {
        self.forfeited_doubles
            .get(&player)
            .into_iter()
            .flat_map(|modes| modes.iter().copied())
    }

    pub fn has_forfeited(&self, player: PlayerPosition, mode: GameMode) -> bool {
        self.forfeited_doubles
            .get(&player)
            .is_some_and(|modes| modes.contains(&mode))
    }

    /// Announcements in the order they were made.
    pub fn announcements(&self) -> impl Iterator<Item = (PlayerPosition, GameMode)> + '_ {
        self.actions.iter().filter_map(|action| match *action {
            NegotiationAction::Announce { player, mode } => Some((player, mode)),
            _ => None,
        })
    }

    /// Seat that announced `mode`; bids strictly increase so there is at most one.
    pub fn announcer_of(&self, mode: GameMode) -> Option<PlayerPosition> {
        self.announcements()
            .find(|(_, announced)| *announced == mode)
            .map(|(player, _)| player)
    }

    pub fn apply(&self, action: NegotiationAction) -> Result<NegotiationState, NegotiationError> {
        engine::validate_action(self, &action)?;

        let mut next = self.clone();
        let index = next.actions.len();
        let player = action.player();

        match action {
            NegotiationAction::Announce { mode, .. } => {
                let team = player.team();
                let outstanding: Vec<GameMode> = next
                    .announcements()
                    .filter(|(announcer, announced)| {
                        announcer.team() != team && !next.is_doubled(*announced)
                    })
                    .map(|(_, announced)| announced)
                    .collect();
                if !outstanding.is_empty() {
                    next.forfeited_doubles
                        .entry(player)
                        .or_default()
                        .extend(outstanding);
                }

                next.current_bid = Some(mode);
                next.current_bidder = Some(player);
                if mode.is_colour() {
                    next.team_colour_announcements.insert(team, mode);
                }
                next.consecutive_accepts = 0;
            }
            NegotiationAction::Accept { .. } => {
                next.consecutive_accepts += 1;
                next.players_who_accepted.insert(player);

                if let (Some(bid), Some(bidder)) = (next.current_bid, next.current_bidder)
                    && bidder.team() != player.team()
                    && bid.auto_doubles_on_accept()
                    && !next.is_doubled(bid)
                {
                    next.doubled_modes.insert(bid, index);
                    next.has_double_occurred = true;
                    event!(
                        target: "giretra_core::negotiation",
                        Level::DEBUG,
                        mode = %bid,
                        player = %player,
                        "accept by opponent doubles bid"
                    );
                }
            }
            NegotiationAction::Double { mode, .. } => {
                next.doubled_modes.insert(mode, index);
                next.has_double_occurred = true;
                next.consecutive_accepts = 0;
            }
            NegotiationAction::Redouble { mode, .. } => {
                next.redoubled_modes.insert(mode);
                next.has_double_occurred = true;
                next.consecutive_accepts = 0;
            }
        }

        next.actions.push(action);

        if next.consecutive_accepts >= ACCEPTS_TO_COMPLETE && next.current_bid.is_some() {
            next.is_complete = true;
        } else {
            next.current_player = next.current_player.next();
        }

        event!(
            target: "giretra_core::negotiation",
            Level::DEBUG,
            action = %action,
            accepts = next.consecutive_accepts,
            complete = next.is_complete,
        );

        Ok(next)
    }

    /// Contract to be played. When any mode was doubled, the earliest
    /// announcement among the doubled modes wins, whatever was bid after it.
    pub fn resolve_final_mode(&self) -> Result<ResolvedContract, NegotiationError> {
        if !self.is_complete {
            return Err(NegotiationError::NotComplete);
        }

        if !self.doubled_modes.is_empty()
            && let Some((announcer, mode)) = self
                .announcements()
                .find(|(_, mode)| self.is_doubled(*mode))
        {
            let multiplier = if self.is_redoubled(mode) {
                Multiplier::Redoubled
            } else {
                Multiplier::Doubled
            };
            return Ok(ResolvedContract {
                mode,
                announcer_team: announcer.team(),
                multiplier,
            });
        }

        match (self.current_bid, self.current_bidder) {
            (Some(mode), Some(bidder)) => Ok(ResolvedContract {
                mode,
                announcer_team: bidder.team(),
                multiplier: Multiplier::Normal,
            }),
            _ => Err(NegotiationError::NoBid),
        }
    }
}
