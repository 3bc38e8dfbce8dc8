use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use std::time::Duration;

use giretra_core::model::game_mode::GameMode;
use giretra_core::model::player::Team;
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, Normal};
use thiserror::Error;

use crate::config::{AgentKind, BenchmarkConfig};
use crate::tournament::MatchOutcome;
use crate::validation::{TimingStats, ValidationLog, Violation};

const CONFIDENCE: f64 = 0.95;
/// Used only if the standard normal cannot be constructed.
const FALLBACK_Z: f64 = 1.96;
const LISTED_VIOLATIONS: usize = 20;

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
}

pub struct AnalyticsCollector {
    agents: Vec<AgentAccumulator>,
    teams: [WinAccumulator; 2],
    modes: BTreeMap<GameMode, ModeAccumulator>,
    latency_budget: Duration,
    aborted: usize,
}

impl AnalyticsCollector {
    pub fn new(config: &BenchmarkConfig) -> Self {
        Self {
            agents: config
                .agents
                .iter()
                .map(|agent| AgentAccumulator::new(agent.name.clone(), agent.kind))
                .collect(),
            teams: Default::default(),
            modes: BTreeMap::new(),
            latency_budget: Duration::from_millis(config.metrics.latency_budget_ms),
            aborted: 0,
        }
    }

    pub fn record_match(&mut self, outcome: &MatchOutcome) {
        for deal in &outcome.deals {
            let mode = self.modes.entry(deal.mode).or_default();
            mode.deals += 1;
            if deal.announcer_won() {
                mode.announcer_wins += 1;
            }
            if deal.sweeping_team.is_some() {
                mode.sweeps += 1;
            }
        }

        let Some(winner) = outcome.winner.filter(|_| outcome.error.is_none()) else {
            self.aborted += 1;
            return;
        };

        for team in Team::BOTH {
            self.teams[team.index()].record(team == winner);
        }

        for seat in &outcome.seating {
            if let Some(agent) = self.agents.iter_mut().find(|a| a.name == seat.agent) {
                agent.wins.record(seat.team == winner);
                let own = outcome.team_points[seat.team.index()];
                let other = outcome.team_points[seat.team.opponent().index()];
                agent.point_margin += f64::from(own) - f64::from(other);
            }
        }
    }

    pub fn finalize(self, log: &ValidationLog) -> AnalyticsSummary {
        let z = critical_z();
        let agents = self
            .agents
            .into_iter()
            .map(|acc| {
                let durations: Vec<Duration> = log
                    .timings()
                    .iter()
                    .filter(|timing| timing.agent == acc.name)
                    .map(|timing| timing.elapsed)
                    .collect();
                let completed = acc.wins.matches;
                AgentReport {
                    kind: acc.kind,
                    matches: completed,
                    wins: acc.wins.wins,
                    win_rate: acc.wins.rate(),
                    ci95: acc.wins.interval(z),
                    p_value: acc.wins.p_value_vs_even(),
                    avg_point_margin: if completed == 0 {
                        0.0
                    } else {
                        acc.point_margin / completed as f64
                    },
                    timing: TimingStats::from_durations(&durations),
                    over_budget: TimingStats::over_budget(&durations, self.latency_budget),
                    violations: log.violations_for(&acc.name),
                    name: acc.name,
                }
            })
            .collect();

        let teams = Team::BOTH
            .map(|team| {
                let acc = &self.teams[team.index()];
                TeamReport {
                    team,
                    matches: acc.matches,
                    wins: acc.wins,
                    win_rate: acc.rate(),
                    ci95: acc.interval(z),
                }
            })
            .to_vec();

        let modes = self
            .modes
            .into_iter()
            .map(|(mode, acc)| ModeReport {
                mode,
                deals: acc.deals,
                announcer_wins: acc.announcer_wins,
                sweeps: acc.sweeps,
            })
            .collect();

        AnalyticsSummary {
            agents,
            teams,
            modes,
            latency_budget_ms: self.latency_budget.as_millis() as u64,
            aborted_matches: self.aborted,
            overall_timing: log.timing_stats(None),
            total_violations: log.violations().len(),
            violations: log
                .violations()
                .iter()
                .take(LISTED_VIOLATIONS)
                .cloned()
                .collect(),
            warnings: log.warnings().len(),
        }
    }
}

fn critical_z() -> f64 {
    Normal::new(0.0, 1.0)
        .map(|normal| normal.inverse_cdf(0.5 + CONFIDENCE / 2.0))
        .unwrap_or(FALLBACK_Z)
}

struct AgentAccumulator {
    name: String,
    kind: AgentKind,
    wins: WinAccumulator,
    point_margin: f64,
}

impl AgentAccumulator {
    fn new(name: String, kind: AgentKind) -> Self {
        Self {
            name,
            kind,
            wins: WinAccumulator::default(),
            point_margin: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct WinAccumulator {
    matches: usize,
    wins: usize,
}

impl WinAccumulator {
    fn record(&mut self, won: bool) {
        self.matches += 1;
        if won {
            self.wins += 1;
        }
    }

    fn rate(&self) -> f64 {
        if self.matches == 0 {
            0.0
        } else {
            self.wins as f64 / self.matches as f64
        }
    }

    /// Normal-approximation interval, clamped to [0, 1].
    fn interval(&self, z: f64) -> (f64, f64) {
        if self.matches == 0 {
            return (0.0, 0.0);
        }
        let p = self.rate();
        let half_width = z * (p * (1.0 - p) / self.matches as f64).sqrt();
        ((p - half_width).max(0.0), (p + half_width).min(1.0))
    }

    /// Two-sided test of the win rate against an even 50%.
    fn p_value_vs_even(&self) -> f64 {
        if self.matches == 0 {
            return 1.0;
        }
        let n = self.matches as f64;
        let z = (self.rate() - 0.5) / (0.25 / n).sqrt();
        match Normal::new(0.0, 1.0) {
            Ok(normal) => (2.0 * (1.0 - normal.cdf(z.abs()))).clamp(0.0, 1.0),
            Err(_) => 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct ModeAccumulator {
    deals: usize,
    announcer_wins: usize,
    sweeps: usize,
}

#[derive(Debug, Serialize)]
pub struct AnalyticsSummary {
    pub agents: Vec<AgentReport>,
    pub teams: Vec<TeamReport>,
    pub modes: Vec<ModeReport>,
    pub latency_budget_ms: u64,
    pub aborted_matches: usize,
    pub overall_timing: TimingStats,
    pub total_violations: usize,
    /// The first few recorded violations, in order.
    pub violations: Vec<Violation>,
    pub warnings: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentReport {
    pub name: String,
    pub kind: AgentKind,
    pub matches: usize,
    pub wins: usize,
    pub win_rate: f64,
    pub ci95: (f64, f64),
    pub p_value: f64,
    pub avg_point_margin: f64,
    pub timing: TimingStats,
    pub over_budget: usize,
    pub violations: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct TeamReport {
    pub team: Team,
    pub matches: usize,
    pub wins: usize,
    pub win_rate: f64,
    pub ci95: (f64, f64),
}

#[derive(Debug, Clone, Serialize)]
pub struct ModeReport {
    pub mode: GameMode,
    pub deals: usize,
    pub announcer_wins: usize,
    pub sweeps: usize,
}

impl AnalyticsSummary {
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str("# Tournament Summary\n\n");
        let _ = writeln!(
            out,
            "Latency budget: {} ms per decision. Aborted matches: {}. Observer warnings: {}.\n",
            self.latency_budget_ms, self.aborted_matches, self.warnings
        );

        out.push_str("## Agents\n\n");
        out.push_str("| Agent | Kind | Matches | Win % | 95% CI | p vs 50% | Avg margin | Mean ms | p95 ms | Over budget | Violations |\n");
        out.push_str("|-------|------|---------|-------|--------|----------|------------|---------|--------|-------------|------------|\n");
        for agent in &self.agents {
            let _ = writeln!(
                out,
                "| {name} | {kind:?} | {matches} | {win:.1}% | [{low:.3}, {high:.3}] | {pval:.3} | {margin:+.1} | {mean:.2} | {p95:.2} | {over} | {violations} |",
                name = agent.name,
                kind = agent.kind,
                matches = agent.matches,
                win = agent.win_rate * 100.0,
                low = agent.ci95.0,
                high = agent.ci95.1,
                pval = agent.p_value,
                margin = agent.avg_point_margin,
                mean = agent.timing.mean_ms,
                p95 = agent.timing.p95_ms,
                over = agent.over_budget,
                violations = agent.violations,
            );
        }

        out.push_str("\n## Teams\n\n");
        out.push_str("| Team | Matches | Wins | Win % | 95% CI |\n");
        out.push_str("|------|---------|------|-------|--------|\n");
        for team in &self.teams {
            let _ = writeln!(
                out,
                "| {} | {} | {} | {:.1}% | [{:.3}, {:.3}] |",
                team.team,
                team.matches,
                team.wins,
                team.win_rate * 100.0,
                team.ci95.0,
                team.ci95.1
            );
        }

        if !self.modes.is_empty() {
            out.push_str("\n## Contracts\n\n");
            out.push_str("| Mode | Deals | Announcer won | Sweeps |\n");
            out.push_str("|------|-------|---------------|--------|\n");
            for mode in &self.modes {
                let _ = writeln!(
                    out,
                    "| {} | {} | {} | {} |",
                    mode.mode, mode.deals, mode.announcer_wins, mode.sweeps
                );
            }
        }

        let timing = &self.overall_timing;
        out.push_str("\n## Decision latency\n\n");
        let _ = writeln!(
            out,
            "{} decisions: min {:.2} ms, mean {:.2} ms, p50 {:.2} ms, p95 {:.2} ms, p99 {:.2} ms, max {:.2} ms",
            timing.count,
            timing.min_ms,
            timing.mean_ms,
            timing.p50_ms,
            timing.p95_ms,
            timing.p99_ms,
            timing.max_ms
        );

        let _ = writeln!(out, "\n## Violations ({})\n", self.total_violations);
        if self.violations.is_empty() {
            out.push_str("None.\n");
        }
        for violation in &self.violations {
            let _ = writeln!(
                out,
                "- match {} deal {}: {} ({}) {}: {}",
                violation.match_number,
                violation.deal_number,
                violation.agent,
                violation.seat,
                violation.kind,
                violation.description
            );
        }

        out
    }

    pub fn write_markdown(&self, path: impl AsRef<Path>) -> Result<(), AnalyticsError> {
        fs::write(path.as_ref(), self.to_markdown()).map_err(|source| AnalyticsError::Io {
            context: "writing summary markdown",
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tournament::{MatchMeta, SeatSnapshot};
    use giretra_core::model::game_mode::Multiplier;
    use giretra_core::model::player::PlayerPosition;
    use giretra_core::model::score::DealResult;

    fn config() -> BenchmarkConfig {
        let yaml = r#"
run_id: "analytics"
matches:
  count: 1
agents:
  - { name: "a", kind: "heuristic" }
  - { name: "b", kind: "random" }
  - { name: "c", kind: "first_legal" }
  - { name: "d", kind: "random" }
outputs:
  jsonl: "out/deals.jsonl"
  summary_md: "out/summary.md"
"#;
        let mut cfg: BenchmarkConfig = serde_yaml::from_str(yaml).unwrap();
        cfg.validate().unwrap();
        cfg
    }

    fn outcome(winner: Option<Team>, error: Option<&str>) -> MatchOutcome {
        let names = ["a", "b", "c", "d"];
        MatchOutcome {
            meta: MatchMeta {
                match_number: 1,
                match_index: 0,
                permutation_index: 0,
                match_seed: 0,
                first_dealer: PlayerPosition::Right,
            },
            seating: PlayerPosition::LOOP
                .iter()
                .zip(names)
                .map(|(seat, name)| SeatSnapshot {
                    seat: *seat,
                    team: seat.team(),
                    agent: name.to_string(),
                })
                .collect(),
            deals: vec![DealResult {
                mode: GameMode::ColourHearts,
                multiplier: Multiplier::Normal,
                announcer_team: Team::Team1,
                team1_card_points: 100,
                team2_card_points: 62,
                team1_match_points: 16,
                team2_match_points: 0,
                was_sweep: false,
                sweeping_team: None,
                is_instant_win: false,
            }],
            team_points: [160, 90],
            winner,
            error: error.map(str::to_string),
        }
    }

    #[test]
    fn normal_interval_is_clamped_and_centered() {
        let acc = WinAccumulator {
            matches: 100,
            wins: 50,
        };
        let (low, high) = acc.interval(critical_z());
        assert!((low - 0.402).abs() < 1e-3);
        assert!((high - 0.598).abs() < 1e-3);
        assert!((acc.p_value_vs_even() - 1.0).abs() < 1e-9);

        let perfect = WinAccumulator {
            matches: 10,
            wins: 10,
        };
        assert_eq!(perfect.interval(critical_z()), (1.0, 1.0));
        assert!(perfect.p_value_vs_even() < 0.01);
    }

    #[test]
    fn aborted_matches_do_not_count_as_results() {
        let mut collector = AnalyticsCollector::new(&config());
        collector.record_match(&outcome(Some(Team::Team1), None));
        collector.record_match(&outcome(None, Some("Left chose nonsense")));
        let summary = collector.finalize(&ValidationLog::default());

        assert_eq!(summary.aborted_matches, 1);
        assert_eq!(summary.teams[0].wins, 1);
        assert_eq!(summary.teams[0].matches, 1);
        let a = &summary.agents[0];
        assert_eq!((a.matches, a.wins), (1, 1));
        assert!((a.avg_point_margin - 70.0).abs() < 1e-9);
        let b = &summary.agents[1];
        assert_eq!((b.matches, b.wins), (1, 0));
        assert_eq!(summary.modes[0].deals, 2);
        assert_eq!(summary.modes[0].announcer_wins, 2);

        let markdown = summary.to_markdown();
        assert!(markdown.contains("| a | Heuristic | 1 | 100.0% |"));
        assert!(markdown.contains("| Team1 | 1 | 1 | 100.0% |"));
        assert!(markdown.contains("## Violations (0)"));
    }
}
