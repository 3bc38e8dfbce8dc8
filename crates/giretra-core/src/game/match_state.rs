use crate::game::deal::{DealPhase, DealState};
use crate::model::deck::Deck;
use crate::model::player::{PlayerPosition, Team};
use crate::model::score::DealResult;
use thiserror::Error;
use tracing::{Level, event};

pub const DEFAULT_TARGET_SCORE: u32 = 150;
/// Raised onto the target whenever both teams reach it without a strict leader.
pub const TARGET_ESCALATION: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    #[error("the match is already complete")]
    Complete,
    #[error("a deal is already in progress")]
    DealInProgress,
    #[error("no deal is in progress")]
    NoDeal,
    #[error("deal was dealt by {actual}, expected {expected}")]
    WrongDealer {
        expected: PlayerPosition,
        actual: PlayerPosition,
    },
}

/// Running score across deals and the deal currently being played.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchState {
    target_score: u32,
    match_points: [u32; 2],
    current_dealer: PlayerPosition,
    current_deal: Option<DealState>,
    completed_deals: Vec<DealResult>,
    is_complete: bool,
    winner: Option<Team>,
}

impl MatchState {
    pub fn new(first_dealer: PlayerPosition) -> Self {
        Self::with_target(first_dealer, DEFAULT_TARGET_SCORE)
    }

    pub fn with_target(first_dealer: PlayerPosition, target_score: u32) -> Self {
        Self {
            target_score,
            match_points: [0; 2],
            current_dealer: first_dealer,
            current_deal: None,
            completed_deals: Vec::new(),
            is_complete: false,
            winner: None,
        }
    }

    pub fn target_score(&self) -> u32 {
        self.target_score
    }

    pub fn match_points(&self, team: Team) -> u32 {
        self.match_points[team.index()]
    }

    pub fn current_dealer(&self) -> PlayerPosition {
        self.current_dealer
    }

    pub fn current_deal(&self) -> Option<&DealState> {
        self.current_deal.as_ref()
    }

    pub fn completed_deals(&self) -> &[DealResult] {
        &self.completed_deals
    }

    pub fn is_complete(&self) -> bool {
        self.is_complete
    }

    pub fn winner(&self) -> Option<Team> {
        self.winner
    }

    pub fn start_deal(&self, deck: Deck) -> Result<MatchState, MatchError> {
        if self.is_complete {
            return Err(MatchError::Complete);
        }
        if self.current_deal.is_some() {
            return Err(MatchError::DealInProgress);
        }
        let mut next = self.clone();
        next.current_deal = Some(DealState::new(self.current_dealer, deck));
        Ok(next)
    }

    /// Stores the latest state of the running deal, folding its result into
    /// the match once it completes.
    pub fn with_deal(&self, deal: DealState) -> Result<MatchState, MatchError> {
        if self.current_deal.is_none() {
            return Err(MatchError::NoDeal);
        }
        if deal.dealer() != self.current_dealer {
            return Err(MatchError::WrongDealer {
                expected: self.current_dealer,
                actual: deal.dealer(),
            });
        }

        let mut next = self.clone();
        match (deal.phase(), deal.result()) {
            (DealPhase::Completed, Some(result)) => {
                next.apply_result(result.clone());
                next.current_deal = None;
            }
            _ => next.current_deal = Some(deal),
        }
        Ok(next)
    }

    fn apply_result(&mut self, result: DealResult) {
        self.current_dealer = self.current_dealer.next();

        if result.is_instant_win {
            event!(
                target: "giretra_core::play",
                Level::INFO,
                winner = ?result.sweeping_team,
                "colour sweep ends the match"
            );
            self.is_complete = true;
            self.winner = result.sweeping_team;
            self.completed_deals.push(result);
            return;
        }

        for team in Team::BOTH {
            self.match_points[team.index()] += result.match_points(team);
        }
        self.completed_deals.push(result);
        self.settle();
    }

    fn settle(&mut self) {
        let team1 = self.match_points(Team::Team1);
        let team2 = self.match_points(Team::Team2);
        let target = self.target_score;

        let leader = if team1 >= target && team1 > team2 {
            Some(Team::Team1)
        } else if team2 >= target && team2 > team1 {
            Some(Team::Team2)
        } else {
            None
        };

        if let Some(team) = leader {
            self.is_complete = true;
            self.winner = Some(team);
        } else if team1 >= target && team2 >= target {
            self.target_score += TARGET_ESCALATION;
            event!(
                target: "giretra_core::play",
                Level::INFO,
                team1,
                team2,
                target = self.target_score,
                "tied at target, target raised"
            );
        }
    }
}
