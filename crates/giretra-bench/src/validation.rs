use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use giretra_core::game::agent::{
    AgentError, Cut, CutRequest, NegotiationRequest, PlayRequest, PlayerAgent,
};
use giretra_core::game::match_state::MatchState;
use giretra_core::model::card::Card;
use giretra_core::model::hand_state::{CompletedTrick, HandState};
use giretra_core::model::player::PlayerPosition;
use giretra_core::model::score::DealResult;
use giretra_core::negotiation::NegotiationAction;
use serde::Serialize;
use tokio::time::Instant;
use tracing::{Level, event};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionKind {
    Cut,
    Negotiation,
    Card,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    CutOutOfRange,
    ActionNotOffered,
    CardNotLegal,
    DecisionFailed,
    /// The caller stopped waiting before the agent answered.
    TimedOut,
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ViolationKind::CutOutOfRange => "cut out of range",
            ViolationKind::ActionNotOffered => "action not offered",
            ViolationKind::CardNotLegal => "card not legal",
            ViolationKind::DecisionFailed => "decision failed",
            ViolationKind::TimedOut => "timed out",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub kind: ViolationKind,
    pub agent: String,
    pub seat: PlayerPosition,
    pub description: String,
    pub match_number: usize,
    /// 1-based; counts the deal the decision belonged to.
    pub deal_number: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecisionTiming {
    pub agent: String,
    pub seat: PlayerPosition,
    pub kind: DecisionKind,
    pub elapsed: Duration,
    pub match_number: usize,
    pub deal_number: usize,
}

/// Everything the validating wrappers observed, shared by the four seats of
/// every match in a run.
#[derive(Debug, Default)]
pub struct ValidationLog {
    violations: Vec<Violation>,
    timings: Vec<DecisionTiming>,
    warnings: Vec<String>,
}

impl ValidationLog {
    pub fn shared() -> SharedValidationLog {
        Arc::new(Mutex::new(Self::default()))
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn timings(&self) -> &[DecisionTiming] {
        &self.timings
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn violations_for(&self, agent: &str) -> usize {
        self.violations.iter().filter(|v| v.agent == agent).count()
    }

    pub fn timing_stats(&self, agent: Option<&str>) -> TimingStats {
        let durations: Vec<Duration> = self
            .timings
            .iter()
            .filter(|timing| agent.is_none_or(|name| timing.agent == name))
            .map(|timing| timing.elapsed)
            .collect();
        TimingStats::from_durations(&durations)
    }
}

pub type SharedValidationLog = Arc<Mutex<ValidationLog>>;

pub(crate) fn lock(log: &SharedValidationLog) -> MutexGuard<'_, ValidationLog> {
    log.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct TimingStats {
    pub count: usize,
    pub min_ms: f64,
    pub max_ms: f64,
    pub mean_ms: f64,
    pub p50_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
}

impl TimingStats {
    pub fn from_durations(durations: &[Duration]) -> Self {
        if durations.is_empty() {
            return Self::default();
        }
        let mut millis: Vec<f64> = durations
            .iter()
            .map(|elapsed| elapsed.as_secs_f64() * 1000.0)
            .collect();
        millis.sort_by(f64::total_cmp);

        let count = millis.len();
        Self {
            count,
            min_ms: millis[0],
            max_ms: millis[count - 1],
            mean_ms: millis.iter().sum::<f64>() / count as f64,
            p50_ms: percentile(&millis, 0.50),
            p95_ms: percentile(&millis, 0.95),
            p99_ms: percentile(&millis, 0.99),
        }
    }

    pub fn over_budget(durations: &[Duration], budget: Duration) -> usize {
        durations.iter().filter(|elapsed| **elapsed > budget).count()
    }
}

/// Nearest-rank percentile over sorted samples.
fn percentile(sorted: &[f64], quantile: f64) -> f64 {
    let rank = (quantile * sorted.len() as f64).ceil() as usize;
    sorted[rank.clamp(1, sorted.len()) - 1]
}

fn push_violation(log: &mut ValidationLog, violation: Violation) {
    event!(
        target: "giretra_bench::validation",
        Level::WARN,
        agent = %violation.agent,
        seat = %violation.seat,
        match_number = violation.match_number,
        kind = %violation.kind,
        description = %violation.description,
    );
    log.violations.push(violation);
}

/// Times one decision. The timing is recorded on drop, so a decision whose
/// future is dropped mid-await (the orchestrator's timeout) is still counted,
/// together with a `TimedOut` violation.
struct DecisionGuard {
    log: SharedValidationLog,
    agent: String,
    seat: PlayerPosition,
    kind: DecisionKind,
    match_number: usize,
    deal_number: usize,
    start: Instant,
    answered: bool,
}

impl DecisionGuard {
    fn finish(mut self) {
        self.answered = true;
    }
}

impl Drop for DecisionGuard {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        let mut log = lock(&self.log);
        log.timings.push(DecisionTiming {
            agent: self.agent.clone(),
            seat: self.seat,
            kind: self.kind,
            elapsed,
            match_number: self.match_number,
            deal_number: self.deal_number,
        });
        if !self.answered {
            let violation = Violation {
                kind: ViolationKind::TimedOut,
                agent: self.agent.clone(),
                seat: self.seat,
                description: format!(
                    "{:?} decision abandoned after {} ms",
                    self.kind,
                    elapsed.as_millis()
                ),
                match_number: self.match_number,
                deal_number: self.deal_number,
            };
            push_violation(&mut log, violation);
        }
    }
}

/// Forwards every call to `inner` unchanged while timing decisions and
/// recording choices that were not offered. The engine still sees the
/// invalid choice and rejects it.
pub struct ValidatingAgent<A> {
    inner: A,
    name: String,
    seat: PlayerPosition,
    match_number: usize,
    log: SharedValidationLog,
}

impl<A: PlayerAgent> ValidatingAgent<A> {
    pub fn new(
        inner: A,
        name: impl Into<String>,
        seat: PlayerPosition,
        match_number: usize,
        log: SharedValidationLog,
    ) -> Self {
        Self {
            inner,
            name: name.into(),
            seat,
            match_number,
            log,
        }
    }

    fn deal_number(game: &MatchState) -> usize {
        game.completed_deals().len() + 1
    }

    fn begin(&self, kind: DecisionKind, game: &MatchState) -> DecisionGuard {
        DecisionGuard {
            log: self.log.clone(),
            agent: self.name.clone(),
            seat: self.seat,
            kind,
            match_number: self.match_number,
            deal_number: Self::deal_number(game),
            start: Instant::now(),
            answered: false,
        }
    }

    fn record_violation(&self, kind: ViolationKind, description: String, game: &MatchState) {
        let violation = Violation {
            kind,
            agent: self.name.clone(),
            seat: self.seat,
            description,
            match_number: self.match_number,
            deal_number: Self::deal_number(game),
        };
        push_violation(&mut lock(&self.log), violation);
    }

    fn check_failure<T>(&self, result: &Result<T, AgentError>, game: &MatchState) {
        if let Err(err) = result {
            self.record_violation(ViolationKind::DecisionFailed, err.to_string(), game);
        }
    }

    fn note_observer(&self, hook: &str, result: &Result<(), AgentError>) {
        if let Err(err) = result {
            lock(&self.log).warnings.push(format!(
                "match {} {} ({}) {hook}: {err}",
                self.match_number, self.name, self.seat
            ));
        }
    }
}

#[async_trait]
impl<A: PlayerAgent> PlayerAgent for ValidatingAgent<A> {
    async fn choose_cut(&mut self, request: CutRequest<'_>) -> Result<Cut, AgentError> {
        let guard = self.begin(DecisionKind::Cut, request.game);
        let result = self.inner.choose_cut(request).await;
        guard.finish();
        self.check_failure(&result, request.game);
        if let Ok(cut) = &result
            && !cut.is_valid()
        {
            self.record_violation(
                ViolationKind::CutOutOfRange,
                format!("cut at {} of a {}-card deck", cut.position, request.deck_size),
                request.game,
            );
        }
        result
    }

    async fn choose_negotiation_action(
        &mut self,
        request: NegotiationRequest<'_>,
    ) -> Result<NegotiationAction, AgentError> {
        let guard = self.begin(DecisionKind::Negotiation, request.game);
        let result = self.inner.choose_negotiation_action(request).await;
        guard.finish();
        self.check_failure(&result, request.game);
        if let Ok(action) = &result
            && !request.valid_actions.contains(action)
        {
            self.record_violation(
                ViolationKind::ActionNotOffered,
                format!("{action} among {} offered", request.valid_actions.len()),
                request.game,
            );
        }
        result
    }

    async fn choose_card(&mut self, request: PlayRequest<'_>) -> Result<Card, AgentError> {
        let guard = self.begin(DecisionKind::Card, request.game);
        let result = self.inner.choose_card(request).await;
        guard.finish();
        self.check_failure(&result, request.game);
        if let Ok(card) = &result
            && !request.legal_cards.contains(card)
        {
            let legal = request
                .legal_cards
                .iter()
                .map(Card::to_string)
                .collect::<Vec<_>>()
                .join(",");
            self.record_violation(
                ViolationKind::CardNotLegal,
                format!("{card} not in [{legal}]"),
                request.game,
            );
        }
        result
    }

    async fn on_deal_started(&mut self, game: &MatchState) -> Result<(), AgentError> {
        let result = self.inner.on_deal_started(game).await;
        self.note_observer("deal started", &result);
        result
    }

    async fn on_card_played(
        &mut self,
        player: PlayerPosition,
        card: Card,
        play: &HandState,
        game: &MatchState,
    ) -> Result<(), AgentError> {
        let result = self.inner.on_card_played(player, card, play, game).await;
        self.note_observer("card played", &result);
        result
    }

    async fn on_trick_completed(
        &mut self,
        trick: &CompletedTrick,
        play: &HandState,
        game: &MatchState,
    ) -> Result<(), AgentError> {
        let result = self.inner.on_trick_completed(trick, play, game).await;
        self.note_observer("trick completed", &result);
        result
    }

    async fn on_deal_ended(
        &mut self,
        deal: &DealResult,
        play: &HandState,
        game: &MatchState,
    ) -> Result<(), AgentError> {
        let result = self.inner.on_deal_ended(deal, play, game).await;
        self.note_observer("deal ended", &result);
        result
    }

    async fn on_match_ended(&mut self, game: &MatchState) -> Result<(), AgentError> {
        let result = self.inner.on_match_ended(game).await;
        self.note_observer("match ended", &result);
        result
    }
}
