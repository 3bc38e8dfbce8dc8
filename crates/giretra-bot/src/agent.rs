use crate::bot::UnseenTracker;
use crate::policy::{Policy, PolicyContext};
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
use std::future::Future;
use std::time::Duration;
use tracing::{Level, event};

pub const DEFAULT_MAX_FAILURES: u32 = 3;

/// Seats a synchronous [`Policy`] at the table and keeps its tracker fed
/// from the observer hooks.
pub struct PolicyAgent<P> {
    seat: PlayerPosition,
    policy: P,
    tracker: UnseenTracker,
}

impl<P: Policy> PolicyAgent<P> {
    pub fn new(seat: PlayerPosition, policy: P) -> Self {
        Self {
            seat,
            policy,
            tracker: UnseenTracker::new(seat),
        }
    }

    pub fn seat(&self) -> PlayerPosition {
        self.seat
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    pub fn tracker(&self) -> &UnseenTracker {
        &self.tracker
    }
}

#[async_trait]
impl<P: Policy> PlayerAgent for PolicyAgent<P> {
    async fn choose_cut(&mut self, request: CutRequest<'_>) -> Result<Cut, AgentError> {
        Ok(self.policy.choose_cut(request.seat, request.deck_size))
    }

    async fn choose_negotiation_action(
        &mut self,
        request: NegotiationRequest<'_>,
    ) -> Result<NegotiationAction, AgentError> {
        let ctx = PolicyContext {
            seat: request.seat,
            hand: request.hand,
            game: request.game,
            tracker: &self.tracker,
        };
        self.policy
            .choose_action(&ctx, request.negotiation, request.valid_actions)
            .ok_or_else(|| AgentError::Failed(format!("{} had no action to choose", request.seat)))
    }

    async fn choose_card(&mut self, request: PlayRequest<'_>) -> Result<Card, AgentError> {
        let ctx = PolicyContext {
            seat: request.seat,
            hand: request.hand,
            game: request.game,
            tracker: &self.tracker,
        };
        self.policy
            .choose_card(&ctx, request.play, request.legal_cards)
            .ok_or_else(|| AgentError::Failed(format!("{} had no card to play", request.seat)))
    }

    async fn on_deal_started(&mut self, _game: &MatchState) -> Result<(), AgentError> {
        self.tracker.reset_for_deal();
        Ok(())
    }

    async fn on_card_played(
        &mut self,
        player: PlayerPosition,
        card: Card,
        play: &HandState,
        _game: &MatchState,
    ) -> Result<(), AgentError> {
        self.tracker.note_card_played(player, card, play);
        Ok(())
    }
}

/// Wraps a primary agent with a fallback. A failed or overdue primary
/// decision is answered by the fallback; after `max_failures` consecutive
/// failures the primary is dropped for good.
pub struct ResilientAgent<A, F> {
    primary: A,
    fallback: F,
    seat: PlayerPosition,
    decision_timeout: Option<Duration>,
    max_failures: u32,
    consecutive_failures: u32,
    permanent_fallback: bool,
}

impl<A: PlayerAgent, F: PlayerAgent> ResilientAgent<A, F> {
    pub fn new(seat: PlayerPosition, primary: A, fallback: F) -> Self {
        Self {
            primary,
            fallback,
            seat,
            decision_timeout: None,
            max_failures: DEFAULT_MAX_FAILURES,
            consecutive_failures: 0,
            permanent_fallback: false,
        }
    }

    pub fn with_decision_timeout(mut self, timeout: Duration) -> Self {
        self.decision_timeout = Some(timeout);
        self
    }

    pub fn with_max_failures(mut self, max_failures: u32) -> Self {
        self.max_failures = max_failures.max(1);
        self
    }

    pub fn is_permanent_fallback(&self) -> bool {
        self.permanent_fallback
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    fn record_success(&mut self) {
        self.consecutive_failures = 0;
    }

    fn record_failure(&mut self, decision: &'static str, err: &AgentError) {
        self.consecutive_failures += 1;
        event!(
            target: "giretra_bot::resilient",
            Level::WARN,
            seat = %self.seat,
            decision,
            failures = self.consecutive_failures,
            error = %err,
            "primary agent failed, using fallback"
        );
        if self.consecutive_failures >= self.max_failures && !self.permanent_fallback {
            self.permanent_fallback = true;
            event!(
                target: "giretra_bot::resilient",
                Level::WARN,
                seat = %self.seat,
                failures = self.consecutive_failures,
                "switching to fallback permanently"
            );
        }
    }
}

async fn bounded<T>(
    timeout: Option<Duration>,
    decision: impl Future<Output = Result<T, AgentError>>,
) -> Result<T, AgentError> {
    match timeout {
        Some(limit) => tokio::time::timeout(limit, decision)
            .await
            .unwrap_or(Err(AgentError::TimedOut(limit))),
        None => decision.await,
    }
}

/// Asks the primary unless latched onto the fallback; any primary error or
/// timeout is answered by the fallback with the same request.
macro_rules! resilient_decision {
    ($self:ident, $name:literal, $method:ident, $request:expr) => {{
        if !$self.permanent_fallback {
            match bounded($self.decision_timeout, $self.primary.$method($request)).await {
                Ok(choice) => {
                    $self.record_success();
                    return Ok(choice);
                }
                Err(err) => $self.record_failure($name, &err),
            }
        }
        $self.fallback.$method($request).await
    }};
}

macro_rules! observe_both {
    ($self:ident, |$agent:ident| $call:expr) => {{
        if !$self.permanent_fallback {
            let $agent = &mut $self.primary;
            if let Err(err) = $call.await {
                event!(
                    target: "giretra_bot::resilient",
                    Level::DEBUG,
                    seat = %$self.seat,
                    error = %err,
                    "primary observer failed"
                );
            }
        }
        let $agent = &mut $self.fallback;
        $call.await
    }};
}

#[async_trait]
impl<A: PlayerAgent, F: PlayerAgent> PlayerAgent for ResilientAgent<A, F> {
    async fn choose_cut(&mut self, request: CutRequest<'_>) -> Result<Cut, AgentError> {
        resilient_decision!(self, "cut", choose_cut, request)
    }

    async fn choose_negotiation_action(
        &mut self,
        request: NegotiationRequest<'_>,
    ) -> Result<NegotiationAction, AgentError> {
        resilient_decision!(self, "negotiation", choose_negotiation_action, request)
    }

    async fn choose_card(&mut self, request: PlayRequest<'_>) -> Result<Card, AgentError> {
        resilient_decision!(self, "card", choose_card, request)
    }

    async fn on_deal_started(&mut self, game: &MatchState) -> Result<(), AgentError> {
        observe_both!(self, |agent| agent.on_deal_started(game))
    }

    async fn on_card_played(
        &mut self,
        player: PlayerPosition,
        card: Card,
        play: &HandState,
        game: &MatchState,
    ) -> Result<(), AgentError> {
        observe_both!(self, |agent| agent.on_card_played(player, card, play, game))
    }

    async fn on_trick_completed(
        &mut self,
        trick: &CompletedTrick,
        play: &HandState,
        game: &MatchState,
    ) -> Result<(), AgentError> {
        observe_both!(self, |agent| agent.on_trick_completed(trick, play, game))
    }

    async fn on_deal_ended(
        &mut self,
        result: &DealResult,
        play: &HandState,
        game: &MatchState,
    ) -> Result<(), AgentError> {
        observe_both!(self, |agent| agent.on_deal_ended(result, play, game))
    }

    async fn on_match_ended(&mut self, game: &MatchState) -> Result<(), AgentError> {
        observe_both!(self, |agent| agent.on_match_ended(game))
    }
}
