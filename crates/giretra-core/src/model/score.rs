use crate::model::game_mode::{GameMode, GameModeCategory, Multiplier};
use crate::model::player::Team;
use serde::{Deserialize, Serialize};

/// AllTrumps split scoring never gives the announcer more than this.
const ALL_TRUMPS_ANNOUNCER_CAP: u32 = 20;
/// ...nor the defenders less than this.
const ALL_TRUMPS_DEFENDER_FLOOR: u32 = 6;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DealResult {
    pub mode: GameMode,
    pub multiplier: Multiplier,
    pub announcer_team: Team,
    pub team1_card_points: u32,
    pub team2_card_points: u32,
    pub team1_match_points: u32,
    pub team2_match_points: u32,
    pub was_sweep: bool,
    pub sweeping_team: Option<Team>,
    pub is_instant_win: bool,
}

impl DealResult {
    pub fn card_points(&self, team: Team) -> u32 {
        match team {
            Team::Team1 => self.team1_card_points,
            Team::Team2 => self.team2_card_points,
        }
    }

    pub fn match_points(&self, team: Team) -> u32 {
        match team {
            Team::Team1 => self.team1_match_points,
            Team::Team2 => self.team2_match_points,
        }
    }

    pub fn announcer_won(&self) -> bool {
        self.match_points(self.announcer_team) > self.match_points(self.announcer_team.opponent())
    }
}

/// Turns the card points of a finished hand into match points.
pub fn calculate(
    mode: GameMode,
    multiplier: Multiplier,
    announcer_team: Team,
    team1_card_points: u32,
    team2_card_points: u32,
    sweeping_team: Option<Team>,
) -> DealResult {
    let mut result = DealResult {
        mode,
        multiplier,
        announcer_team,
        team1_card_points,
        team2_card_points,
        team1_match_points: 0,
        team2_match_points: 0,
        was_sweep: sweeping_team.is_some(),
        sweeping_team,
        is_instant_win: false,
    };

    let (announcer_points, defender_points) = match announcer_team {
        Team::Team1 => (team1_card_points, team2_card_points),
        Team::Team2 => (team2_card_points, team1_card_points),
    };

    let (announcer_award, defender_award) = if let Some(sweeper) = sweeping_team {
        match mode.sweep_bonus() {
            None => {
                result.is_instant_win = true;
                (0, 0)
            }
            Some(bonus) => {
                let points = bonus * multiplier.factor();
                if sweeper == announcer_team {
                    (points, 0)
                } else {
                    (0, points)
                }
            }
        }
    } else {
        let (announcer, defender) = match mode.category() {
            GameModeCategory::AllTrumps => split_all_trumps(announcer_points, defender_points),
            GameModeCategory::Colour | GameModeCategory::NoTrumps => {
                winner_takes_all(mode, announcer_points, defender_points)
            }
        };
        (announcer * multiplier.factor(), defender * multiplier.factor())
    };

    match announcer_team {
        Team::Team1 => {
            result.team1_match_points = announcer_award;
            result.team2_match_points = defender_award;
        }
        Team::Team2 => {
            result.team2_match_points = announcer_award;
            result.team1_match_points = defender_award;
        }
    }

    result
}

fn winner_takes_all(mode: GameMode, announcer: u32, defender: u32) -> (u32, u32) {
    let base = mode.base_match_points();
    if announcer == defender {
        (0, 0)
    } else if announcer >= mode.win_threshold() {
        (base, 0)
    } else {
        (0, base)
    }
}

fn split_all_trumps(announcer: u32, defender: u32) -> (u32, u32) {
    let base = GameMode::AllTrumps.base_match_points();
    if announcer < GameMode::AllTrumps.win_threshold() {
        return (0, base);
    }

    let announcer_rounded = round_tenths(announcer);
    let defender_rounded = round_tenths(defender);
    if announcer_rounded == defender_rounded {
        return (0, 0);
    }

    let announcer_award = announcer_rounded.min(ALL_TRUMPS_ANNOUNCER_CAP);
    let defender_award = defender_rounded
        .max(ALL_TRUMPS_DEFENDER_FLOOR)
        .min(base - announcer_award);
    (announcer_award, defender_award)
}

/// `points / 10` rounded half to even.
fn round_tenths(points: u32) -> u32 {
    let quotient = points / 10;
    let remainder = points % 10;
    if remainder > 5 || (remainder == 5 && quotient % 2 == 1) {
        quotient + 1
    } else {
        quotient
    }
}
