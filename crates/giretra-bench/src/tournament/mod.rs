mod external;
mod permutations;

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use giretra_bot::agent::{PolicyAgent, ResilientAgent};
use giretra_bot::bot::BotDifficulty;
use giretra_bot::policy::{FirstLegalPolicy, HeuristicPolicy, RandomPolicy};
use giretra_core::game::agent::PlayerAgent;
use giretra_core::game::manager::{GameError, GameManager, MatchConfig};
use giretra_core::game::match_state::MatchState;
use giretra_core::model::deck::Deck;
use giretra_core::model::game_mode::{GameMode, Multiplier};
use giretra_core::model::player::{PlayerPosition, Team};
use giretra_core::model::score::DealResult;
use rand::{RngCore, SeedableRng, rngs::StdRng};
use serde::Serialize;
use thiserror::Error;
use tracing::{Level, event};

use crate::analytics::{AnalyticsCollector, AnalyticsError};
use crate::config::{AgentConfig, AgentKind, BenchmarkConfig, ResolvedOutputs};
use crate::validation::{SharedValidationLog, ValidatingAgent, ValidationLog, lock};

use external::{ExternalAgent, ExternalOptions};
pub use permutations::{MAX_SEAT_PERMUTATIONS, SeatPermutations};

/// Primary entry point for orchestrating tournaments.
pub struct TournamentRunner {
    config: BenchmarkConfig,
    outputs: ResolvedOutputs,
    agents: Vec<AgentBlueprint>,
    seat_permutations: SeatPermutations,
}

/// Summary details returned after a run.
#[derive(Debug)]
pub struct RunSummary {
    pub matches_played: usize,
    pub permutations: usize,
    pub aborted_matches: usize,
    pub rows_written: usize,
    pub violations: usize,
    pub jsonl_path: PathBuf,
    pub summary_path: PathBuf,
}

impl TournamentRunner {
    /// Build a runner from a validated configuration.
    pub fn new(config: BenchmarkConfig, outputs: ResolvedOutputs) -> Result<Self, RunnerError> {
        let agents = AgentBlueprint::from_configs(&config.agents)?;

        if agents.len() != 4 {
            return Err(RunnerError::SeatCount {
                found: agents.len(),
            });
        }

        if config.matches.permutations > MAX_SEAT_PERMUTATIONS {
            return Err(RunnerError::PermutationLimit {
                requested: config.matches.permutations,
                max: MAX_SEAT_PERMUTATIONS,
            });
        }

        let seat_permutations = SeatPermutations::new(config.matches.permutations);

        Ok(Self {
            config,
            outputs,
            agents,
            seat_permutations,
        })
    }

    /// Play every match, streaming one JSONL row per completed deal.
    pub async fn run(&self) -> Result<RunSummary, RunnerError> {
        ensure_parent(self.outputs.jsonl.parent())?;
        ensure_parent(self.outputs.summary_md.parent())?;

        let mut writer = BufWriter::new(File::create(&self.outputs.jsonl)?);
        let permutations = self.seat_permutations.as_slice();
        let mut rng = StdRng::seed_from_u64(self.config.matches.seed.unwrap_or(0));
        let log = ValidationLog::shared();
        let mut analytics = AnalyticsCollector::new(&self.config);
        let mut rows_written = 0usize;
        let mut aborted_matches = 0usize;
        let mut match_number = 0usize;

        for match_index in 0..self.config.matches.count {
            let base_seed = rng.next_u64();

            for (perm_index, perm) in permutations.iter().enumerate() {
                match_number += 1;
                let outcome = self
                    .play_match(match_number, match_index, perm_index, base_seed, perm, &log)
                    .await?;
                if outcome.error.is_some() {
                    aborted_matches += 1;
                }
                analytics.record_match(&outcome);
                rows_written += write_deal_rows(&mut writer, &self.config, &outcome)?;
            }
        }

        writer.flush()?;

        let summary = analytics.finalize(&lock(&log));
        summary.write_markdown(&self.outputs.summary_md)?;

        event!(
            target: "giretra_bench::run",
            Level::INFO,
            run_id = %self.config.run_id,
            matches = match_number,
            aborted = aborted_matches,
            rows = rows_written,
            violations = summary.total_violations,
            "tournament complete"
        );

        Ok(RunSummary {
            matches_played: self.config.matches.count,
            permutations: permutations.len(),
            aborted_matches,
            rows_written,
            violations: summary.total_violations,
            jsonl_path: self.outputs.jsonl.clone(),
            summary_path: self.outputs.summary_md.clone(),
        })
    }

    async fn play_match(
        &self,
        match_number: usize,
        match_index: usize,
        permutation_index: usize,
        base_seed: u64,
        permutation: &[usize; 4],
        log: &SharedValidationLog,
    ) -> Result<MatchOutcome, RunnerError> {
        let mut seating = Vec::with_capacity(4);
        let mut seats: Vec<Box<dyn PlayerAgent>> = Vec::with_capacity(4);
        for (seat_idx, agent_idx) in permutation.iter().enumerate() {
            let seat = PlayerPosition::from_index(seat_idx).ok_or(RunnerError::InvalidPermutation {
                index: seat_idx,
                agent_index: *agent_idx,
            })?;
            let blueprint = self
                .agents
                .get(*agent_idx)
                .ok_or(RunnerError::InvalidPermutation {
                    index: seat_idx,
                    agent_index: *agent_idx,
                })?;
            let agent = blueprint.spawn(seat, seat_seed(base_seed, seat));
            seats.push(Box::new(ValidatingAgent::new(
                agent,
                blueprint.name.clone(),
                seat,
                match_number,
                log.clone(),
            )));
            seating.push(SeatSnapshot {
                seat,
                team: seat.team(),
                agent: blueprint.name.clone(),
            });
        }
        let agents: [Box<dyn PlayerAgent>; 4] = seats
            .try_into()
            .map_err(|seats: Vec<_>| RunnerError::SeatCount { found: seats.len() })?;

        let first_dealer = PlayerPosition::LOOP[(base_seed % 4) as usize];
        let config = MatchConfig {
            first_dealer,
            target_score: self.config.matches.target_score,
            decision_timeout: self.config.matches.decision_timeout(),
        };
        // Every permutation of a match sees the same sequence of decks.
        let mut deck_rng = StdRng::seed_from_u64(base_seed);
        let decks = Box::new(move || Deck::shuffled(&mut deck_rng));

        let mut manager = GameManager::new(agents, config, decks);
        let (state, error) = match manager.play_match().await {
            Ok(state) => (state, None),
            Err(err) => (manager.state().clone(), Some(err)),
        };

        let outcome = MatchOutcome::from_state(
            &state,
            MatchMeta {
                match_number,
                match_index,
                permutation_index,
                match_seed: base_seed,
                first_dealer,
            },
            seating,
            error.as_ref().map(ToString::to_string),
        );

        if let Some(err) = &error {
            let culprit = failing_seat(err).and_then(|seat| outcome.agent_at(seat));
            event!(
                target: "giretra_bench::run",
                Level::WARN,
                run_id = %self.config.run_id,
                match_number,
                culprit = culprit.unwrap_or("-"),
                error = %err,
                "match aborted"
            );
        }

        event!(
            target: "giretra_bench::run",
            Level::INFO,
            run_id = %self.config.run_id,
            match_number,
            deals = state.completed_deals().len(),
            team1 = state.match_points(Team::Team1),
            team2 = state.match_points(Team::Team2),
            winner = ?state.winner(),
        );

        Ok(outcome)
    }
}

fn failing_seat(err: &GameError) -> Option<PlayerPosition> {
    match err {
        GameError::Agent { seat, .. }
        | GameError::IllegalDecision { seat, .. }
        | GameError::NoChoices(seat) => Some(*seat),
        _ => None,
    }
}

fn seat_seed(base_seed: u64, seat: PlayerPosition) -> u64 {
    base_seed ^ (seat.index() as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

fn ensure_parent(path: Option<&Path>) -> Result<(), RunnerError> {
    if let Some(dir) = path.filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

fn write_deal_rows(
    writer: &mut BufWriter<File>,
    config: &BenchmarkConfig,
    outcome: &MatchOutcome,
) -> Result<usize, RunnerError> {
    let match_id = format!(
        "M{:05}_P{:02}",
        outcome.meta.match_index, outcome.meta.permutation_index
    );

    let mut totals = [0u32; 2];
    let mut dealer = outcome.meta.first_dealer;
    for (index, deal) in outcome.deals.iter().enumerate() {
        totals[0] += deal.team1_match_points;
        totals[1] += deal.team2_match_points;
        let row = DealLogRow {
            run_id: &config.run_id,
            match_id: &match_id,
            match_index: outcome.meta.match_index,
            permutation_index: outcome.meta.permutation_index,
            match_seed: outcome.meta.match_seed,
            deal_number: index + 1,
            dealer,
            seating: &outcome.seating,
            mode: deal.mode,
            multiplier: deal.multiplier,
            announcer_team: deal.announcer_team,
            announcer_won: deal.announcer_won(),
            team1_card_points: deal.team1_card_points,
            team2_card_points: deal.team2_card_points,
            team1_match_points: deal.team1_match_points,
            team2_match_points: deal.team2_match_points,
            sweeping_team: deal.sweeping_team,
            instant_win: deal.is_instant_win,
            team1_total: totals[0],
            team2_total: totals[1],
        };

        serde_json::to_writer(&mut *writer, &row)?;
        writer.write_all(b"\n")?;
        dealer = dealer.next();
    }

    Ok(outcome.deals.len())
}

#[derive(Debug, Clone, Copy)]
pub struct MatchMeta {
    pub match_number: usize,
    pub match_index: usize,
    pub permutation_index: usize,
    pub match_seed: u64,
    pub first_dealer: PlayerPosition,
}

/// What one match produced, complete or not.
#[derive(Debug, Clone)]
pub struct MatchOutcome {
    pub meta: MatchMeta,
    pub seating: Vec<SeatSnapshot>,
    pub deals: Vec<DealResult>,
    pub team_points: [u32; 2],
    pub winner: Option<Team>,
    /// Set when the engine stopped the match early.
    pub error: Option<String>,
}

impl MatchOutcome {
    fn from_state(
        state: &MatchState,
        meta: MatchMeta,
        seating: Vec<SeatSnapshot>,
        error: Option<String>,
    ) -> Self {
        Self {
            meta,
            seating,
            deals: state.completed_deals().to_vec(),
            team_points: Team::BOTH.map(|team| state.match_points(team)),
            winner: state.winner(),
            error,
        }
    }

    pub fn agent_at(&self, seat: PlayerPosition) -> Option<&str> {
        self.seating
            .iter()
            .find(|snapshot| snapshot.seat == seat)
            .map(|snapshot| snapshot.agent.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SeatSnapshot {
    pub seat: PlayerPosition,
    pub team: Team,
    pub agent: String,
}

#[derive(Serialize)]
struct DealLogRow<'a> {
    run_id: &'a str,
    match_id: &'a str,
    match_index: usize,
    permutation_index: usize,
    match_seed: u64,
    deal_number: usize,
    dealer: PlayerPosition,
    seating: &'a [SeatSnapshot],
    mode: GameMode,
    multiplier: Multiplier,
    announcer_team: Team,
    announcer_won: bool,
    team1_card_points: u32,
    team2_card_points: u32,
    team1_match_points: u32,
    team2_match_points: u32,
    sweeping_team: Option<Team>,
    instant_win: bool,
    team1_total: u32,
    team2_total: u32,
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("{0}")]
    Blueprint(#[from] BlueprintError),
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
    #[error("failed to serialize log row: {source}")]
    Serialize {
        #[from]
        source: serde_json::Error,
    },
    #[error("configuration requires exactly 4 agents but found {found}")]
    SeatCount { found: usize },
    #[error("requested {requested} seat permutations exceeds maximum of {max}")]
    PermutationLimit { requested: usize, max: usize },
    #[error("permutation index {index} references invalid agent index {agent_index}")]
    InvalidPermutation { index: usize, agent_index: usize },
    #[error("analytics error: {0}")]
    Analytics(#[from] AnalyticsError),
}

/// Agent parameters that parsed as YAML but do not make sense.
#[derive(Debug, Error)]
pub enum BlueprintError {
    #[error("invalid heuristic parameter for agent '{name}': {message}")]
    InvalidHeuristicParam { name: String, message: String },
    #[error("invalid external parameter for agent '{name}': {message}")]
    InvalidExternalParam { name: String, message: String },
}

struct AgentBlueprint {
    name: String,
    implementation: AgentImplementation,
}

enum AgentImplementation {
    Random,
    FirstLegal,
    Heuristic(HeuristicOptions),
    External(ExternalBlueprint),
}

impl AgentBlueprint {
    fn from_configs(configs: &[AgentConfig]) -> Result<Vec<Self>, BlueprintError> {
        configs.iter().map(Self::from_config).collect()
    }

    fn from_config(config: &AgentConfig) -> Result<Self, BlueprintError> {
        let implementation = match config.kind {
            AgentKind::Random => AgentImplementation::Random,
            AgentKind::FirstLegal => AgentImplementation::FirstLegal,
            AgentKind::Heuristic => AgentImplementation::Heuristic(HeuristicOptions::from_params(
                &config.name,
                &config.params,
            )?),
            AgentKind::External => AgentImplementation::External(ExternalBlueprint::from_params(
                &config.name,
                &config.params,
            )?),
        };

        Ok(Self {
            name: config.name.clone(),
            implementation,
        })
    }

    fn spawn(&self, seat: PlayerPosition, seed: u64) -> Box<dyn PlayerAgent> {
        match &self.implementation {
            AgentImplementation::Random => Box::new(PolicyAgent::new(seat, RandomPolicy::new(seed))),
            AgentImplementation::FirstLegal => Box::new(PolicyAgent::new(seat, FirstLegalPolicy)),
            AgentImplementation::Heuristic(opts) => Box::new(PolicyAgent::new(
                seat,
                HeuristicPolicy::new(opts.difficulty, seed),
            )),
            AgentImplementation::External(blueprint) => blueprint.spawn(&self.name, seat, seed),
        }
    }
}

struct HeuristicOptions {
    difficulty: BotDifficulty,
}

impl HeuristicOptions {
    fn from_params(name: &str, params: &serde_yaml::Value) -> Result<Self, BlueprintError> {
        if params.is_null() {
            return Ok(Self {
                difficulty: BotDifficulty::from_env(),
            });
        }

        let mapping = params
            .as_mapping()
            .ok_or_else(|| BlueprintError::InvalidHeuristicParam {
                name: name.to_string(),
                message: "expected mapping for heuristic params".to_string(),
            })?;

        let difficulty_value = mapping
            .iter()
            .find_map(|(key, value)| (key.as_str() == Some("difficulty")).then_some(value));

        let difficulty = match difficulty_value {
            Some(value) => {
                let text = value
                    .as_str()
                    .ok_or_else(|| BlueprintError::InvalidHeuristicParam {
                        name: name.to_string(),
                        message: "difficulty must be a string".to_string(),
                    })?;
                BotDifficulty::parse(text).ok_or_else(|| BlueprintError::InvalidHeuristicParam {
                    name: name.to_string(),
                    message: format!("unknown difficulty '{text}'"),
                })?
            }
            None => BotDifficulty::from_env(),
        };

        Ok(Self { difficulty })
    }
}

/// Who answers when the external process fails or stalls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExternalFallback {
    Heuristic(BotDifficulty),
    FirstLegal,
    Random,
    /// Failures reach the engine and abort the match.
    None,
}

struct ExternalBlueprint {
    options: ExternalOptions,
    fallback: ExternalFallback,
    max_failures: Option<u32>,
}

impl ExternalBlueprint {
    fn from_params(name: &str, params: &serde_yaml::Value) -> Result<Self, BlueprintError> {
        let invalid = |message: &str| BlueprintError::InvalidExternalParam {
            name: name.to_string(),
            message: message.to_string(),
        };

        let mapping = params
            .as_mapping()
            .ok_or_else(|| invalid("expected mapping with at least a command"))?;

        let mut command = None;
        let mut args = Vec::new();
        let mut working_dir = None;
        let mut timeout = None;
        let mut fallback = ExternalFallback::Heuristic(BotDifficulty::Normal);
        let mut max_failures = None;

        for (key, value) in mapping {
            match key.as_str() {
                Some("command") => {
                    let text = value.as_str().ok_or_else(|| invalid("command must be a string"))?;
                    command = Some(text.to_string());
                }
                Some("args") => {
                    let seq = value
                        .as_sequence()
                        .ok_or_else(|| invalid("args must be an array of strings"))?;
                    args = seq
                        .iter()
                        .map(|v| v.as_str().map(str::to_string))
                        .collect::<Option<Vec<_>>>()
                        .ok_or_else(|| invalid("args must be an array of strings"))?;
                }
                Some("working_dir") => {
                    working_dir = value.as_str().map(PathBuf::from);
                }
                Some("timeout_ms") => {
                    let ms = value
                        .as_u64()
                        .filter(|ms| *ms > 0)
                        .ok_or_else(|| invalid("timeout_ms must be a positive integer"))?;
                    timeout = Some(Duration::from_millis(ms));
                }
                Some("max_failures") => {
                    let count = value
                        .as_u64()
                        .and_then(|count| u32::try_from(count).ok())
                        .filter(|count| *count > 0)
                        .ok_or_else(|| invalid("max_failures must be a positive integer"))?;
                    max_failures = Some(count);
                }
                Some("fallback") => {
                    let text = value.as_str().ok_or_else(|| invalid("fallback must be a string"))?;
                    fallback = match text.to_ascii_lowercase().as_str() {
                        "none" | "error" => ExternalFallback::None,
                        "first_legal" => ExternalFallback::FirstLegal,
                        "random" => ExternalFallback::Random,
                        "heuristic" | "heuristic_normal" => {
                            ExternalFallback::Heuristic(BotDifficulty::Normal)
                        }
                        "heuristic_easy" => ExternalFallback::Heuristic(BotDifficulty::Easy),
                        other => {
                            return Err(invalid(&format!("unknown fallback '{other}'")));
                        }
                    };
                }
                _ => {}
            }
        }

        let command = command
            .filter(|cmd| !cmd.trim().is_empty())
            .ok_or_else(|| invalid("command is required"))?;

        Ok(Self {
            options: ExternalOptions {
                command,
                args,
                working_dir,
                timeout,
            },
            fallback,
            max_failures,
        })
    }

    fn spawn(&self, name: &str, seat: PlayerPosition, seed: u64) -> Box<dyn PlayerAgent> {
        let primary = ExternalAgent::new(name.to_string(), seat, self.options.clone());
        let fallback: Box<dyn PlayerAgent> = match self.fallback {
            ExternalFallback::None => return Box::new(primary),
            ExternalFallback::FirstLegal => Box::new(PolicyAgent::new(seat, FirstLegalPolicy)),
            ExternalFallback::Random => Box::new(PolicyAgent::new(seat, RandomPolicy::new(seed))),
            ExternalFallback::Heuristic(difficulty) => Box::new(PolicyAgent::new(
                seat,
                HeuristicPolicy::new(difficulty, seed),
            )),
        };
        let agent = ResilientAgent::new(seat, primary, fallback);
        match self.max_failures {
            Some(count) => Box::new(agent.with_max_failures(count)),
            None => Box::new(agent),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::iter::FromIterator;

    fn mapping(entries: &[(&str, serde_yaml::Value)]) -> serde_yaml::Value {
        serde_yaml::Value::Mapping(serde_yaml::Mapping::from_iter(
            entries
                .iter()
                .map(|(key, value)| (serde_yaml::Value::String((*key).into()), value.clone())),
        ))
    }

    #[test]
    fn heuristic_params_default_to_environment_difficulty() {
        let params = serde_yaml::Value::Mapping(Default::default());
        let options = HeuristicOptions::from_params("bot", &params).unwrap();
        assert_eq!(options.difficulty, BotDifficulty::from_env());
    }

    #[test]
    fn aborted_match_names_the_failing_agent() {
        let seating = PlayerPosition::LOOP
            .iter()
            .zip(["north", "east", "south", "west"])
            .map(|(seat, agent)| SeatSnapshot {
                seat: *seat,
                team: seat.team(),
                agent: agent.to_string(),
            })
            .collect();
        let meta = MatchMeta {
            match_number: 1,
            match_index: 0,
            permutation_index: 0,
            match_seed: 7,
            first_dealer: PlayerPosition::Right,
        };
        let err = GameError::IllegalDecision {
            seat: PlayerPosition::Top,
            choice: "A♠".into(),
        };
        let outcome = MatchOutcome::from_state(
            &MatchState::new(PlayerPosition::Right),
            meta,
            seating,
            Some(err.to_string()),
        );

        let culprit = failing_seat(&err).and_then(|seat| outcome.agent_at(seat));
        assert_eq!(culprit, Some("south"));
        assert!(failing_seat(&GameError::Cancelled).is_none());
        assert_eq!(outcome.winner, None);
        assert!(outcome.deals.is_empty());
    }

    #[test]
    fn heuristic_params_parse_easy_and_reject_unknown() {
        let easy = mapping(&[("difficulty", "easy".into())]);
        let options = HeuristicOptions::from_params("bot", &easy).unwrap();
        assert_eq!(options.difficulty, BotDifficulty::Easy);

        let bogus = mapping(&[("difficulty", "grandmaster".into())]);
        assert!(matches!(
            HeuristicOptions::from_params("bot", &bogus),
            Err(BlueprintError::InvalidHeuristicParam { .. })
        ));
    }

    #[test]
    fn external_params_require_a_command() {
        let params = mapping(&[("timeout_ms", 200u64.into())]);
        assert!(matches!(
            ExternalBlueprint::from_params("remote", &params),
            Err(BlueprintError::InvalidExternalParam { .. })
        ));
    }

    #[test]
    fn external_params_parse_options() {
        let params = mapping(&[
            ("command", "/opt/bot".into()),
            (
                "args",
                serde_yaml::Value::Sequence(vec!["--fast".into(), "--quiet".into()]),
            ),
            ("timeout_ms", 750u64.into()),
            ("fallback", "first_legal".into()),
            ("max_failures", 5u64.into()),
        ]);
        let blueprint = ExternalBlueprint::from_params("remote", &params).unwrap();
        assert_eq!(blueprint.options.command, "/opt/bot");
        assert_eq!(blueprint.options.args, vec!["--fast", "--quiet"]);
        assert_eq!(blueprint.options.timeout, Some(Duration::from_millis(750)));
        assert_eq!(blueprint.fallback, ExternalFallback::FirstLegal);
        assert_eq!(blueprint.max_failures, Some(5));
    }

    #[test]
    fn seat_seeds_differ_per_seat() {
        let seeds: std::collections::HashSet<u64> = PlayerPosition::LOOP
            .iter()
            .map(|seat| seat_seed(42, *seat))
            .collect();
        assert_eq!(seeds.len(), 4);
    }

    #[tokio::test]
    async fn missing_external_bot_falls_back_for_a_whole_match() {
        let params = mapping(&[
            ("command", "__giretra_bench_missing__".into()),
            ("fallback", "heuristic".into()),
        ]);
        let blueprint = ExternalBlueprint::from_params("remote", &params).unwrap();
        let agents = PlayerPosition::LOOP.map(|seat| {
            if seat == PlayerPosition::Left {
                blueprint.spawn("remote", seat, 9)
            } else {
                Box::new(PolicyAgent::new(seat, FirstLegalPolicy)) as Box<dyn PlayerAgent>
            }
        });
        let config = MatchConfig {
            target_score: 1,
            ..MatchConfig::default()
        };
        let mut deck_rng = StdRng::seed_from_u64(3);
        let decks = Box::new(move || Deck::shuffled(&mut deck_rng));
        let state = GameManager::new(agents, config, decks)
            .play_match()
            .await
            .unwrap();
        assert!(state.is_complete());
    }
}
