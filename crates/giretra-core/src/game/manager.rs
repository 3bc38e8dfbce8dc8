use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{Level, event};

use super::agent::{AgentError, Cut, CutRequest, NegotiationRequest, PlayRequest, PlayerAgent};
use super::deal::{DealError, DealPhase, DealState};
use super::match_state::{DEFAULT_TARGET_SCORE, MatchError, MatchState};
use crate::model::deck::Deck;
use crate::model::player::{PlayerPosition, Team};
use crate::negotiation::{NegotiationAction, valid_actions};

pub type DeckProvider = Box<dyn FnMut() -> Deck + Send>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchConfig {
    pub first_dealer: PlayerPosition,
    pub target_score: u32,
    /// Per-decision budget; `None` waits indefinitely.
    pub decision_timeout: Option<Duration>,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            first_dealer: PlayerPosition::Right,
            target_score: DEFAULT_TARGET_SCORE,
            decision_timeout: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum GameError {
    #[error("match cancelled")]
    Cancelled,
    #[error("{seat} failed to decide")]
    Agent {
        seat: PlayerPosition,
        #[source]
        source: AgentError,
    },
    #[error("{seat} chose {choice}, which was not offered")]
    IllegalDecision { seat: PlayerPosition, choice: String },
    #[error("{0} has nothing to choose from")]
    NoChoices(PlayerPosition),
    #[error(transparent)]
    Deal(#[from] DealError),
    #[error(transparent)]
    Match(#[from] MatchError),
}

/// Drives one match: asks each seat for decisions in turn, applies them to
/// the engine and broadcasts what happened to every seat.
pub struct GameManager {
    agents: [Box<dyn PlayerAgent>; 4],
    deck_provider: DeckProvider,
    config: MatchConfig,
    cancel: CancellationToken,
    state: MatchState,
}

/// Result of waiting on one agent decision.
enum Decision<T> {
    Made(T),
    TimedOut,
}

macro_rules! notify_all {
    ($agents:expr, $hook:literal, |$agent:ident| $call:expr) => {
        for (index, $agent) in $agents.iter_mut().enumerate() {
            if let Err(err) = $call.await {
                event!(
                    target: "giretra_core::manager",
                    Level::WARN,
                    seat = %PlayerPosition::LOOP[index],
                    hook = $hook,
                    error = %err,
                    "observer failed"
                );
            }
        }
    };
}

impl GameManager {
    /// `agents` are seated Bottom, Left, Top, Right.
    pub fn new(
        agents: [Box<dyn PlayerAgent>; 4],
        config: MatchConfig,
        deck_provider: DeckProvider,
    ) -> Self {
        let state = MatchState::with_target(config.first_dealer, config.target_score);
        Self {
            agents,
            deck_provider,
            config,
            cancel: CancellationToken::new(),
            state,
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn state(&self) -> &MatchState {
        &self.state
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub async fn play_match(&mut self) -> Result<MatchState, GameError> {
        event!(
            target: "giretra_core::manager",
            Level::INFO,
            target_score = self.state.target_score(),
            dealer = %self.state.current_dealer(),
            "match started"
        );

        while !self.state.is_complete() {
            if self.cancel.is_cancelled() {
                return Err(GameError::Cancelled);
            }
            self.play_deal().await?;
        }

        event!(
            target: "giretra_core::manager",
            Level::INFO,
            winner = ?self.state.winner(),
            team1 = self.state.match_points(Team::Team1),
            team2 = self.state.match_points(Team::Team2),
            deals = self.state.completed_deals().len(),
            "match completed"
        );

        let state = &self.state;
        notify_all!(self.agents, "on_match_ended", |agent| agent.on_match_ended(state));
        Ok(self.state.clone())
    }

    async fn play_deal(&mut self) -> Result<(), GameError> {
        let deck = (self.deck_provider)();
        self.state = self.state.start_deal(deck)?;
        let deal_number = self.state.completed_deals().len() + 1;
        event!(
            target: "giretra_core::manager",
            Level::DEBUG,
            deal = deal_number,
            dealer = %self.state.current_dealer(),
            "deal started"
        );

        {
            let state = &self.state;
            notify_all!(self.agents, "on_deal_started", |agent| agent.on_deal_started(state));
        }

        let mut deal = self
            .state
            .current_deal()
            .cloned()
            .ok_or(MatchError::NoDeal)?;

        deal = self.perform_cut(deal).await?;
        deal = self.perform_negotiation(deal).await?;
        deal = deal.distribute_final()?;
        self.state = self.state.with_deal(deal.clone())?;
        deal = self.perform_play(deal).await?;

        if let (Some(result), Some(play)) = (deal.result(), deal.hand_state()) {
            event!(
                target: "giretra_core::manager",
                Level::DEBUG,
                deal = deal_number,
                mode = %result.mode,
                team1_points = result.team1_match_points,
                team2_points = result.team2_match_points,
                sweep = ?result.sweeping_team,
                "deal completed"
            );
            let state = &self.state;
            notify_all!(self.agents, "on_deal_ended", |agent| agent
                .on_deal_ended(result, play, state));
        }
        Ok(())
    }

    async fn perform_cut(&mut self, deal: DealState) -> Result<DealState, GameError> {
        let seat = deal.cutter();
        let request = CutRequest {
            seat,
            deck_size: deal.deck().len(),
            game: &self.state,
        };
        let agent = &mut self.agents[seat.index()];
        let cut = match decide(
            &self.cancel,
            self.config.decision_timeout,
            seat,
            agent.choose_cut(request),
        )
        .await?
        {
            Decision::Made(cut) => cut,
            Decision::TimedOut => Cut::DEFAULT,
        };

        if !cut.is_valid() {
            return Err(GameError::IllegalDecision {
                seat,
                choice: format!("cut at {}", cut.position),
            });
        }

        let deal = deal.cut(cut.position, cut.from_top)?.distribute_initial()?;
        self.state = self.state.with_deal(deal.clone())?;
        Ok(deal)
    }

    async fn perform_negotiation(&mut self, mut deal: DealState) -> Result<DealState, GameError> {
        while deal.phase() == DealPhase::Negotiation {
            let Some(negotiation) = deal.negotiation() else {
                break;
            };
            let seat = negotiation.current_player();
            let offered = valid_actions(negotiation);
            let request = NegotiationRequest {
                seat,
                hand: deal.hand_of(seat),
                negotiation,
                game: &self.state,
                valid_actions: &offered,
            };
            let agent = &mut self.agents[seat.index()];
            let action = match decide(
                &self.cancel,
                self.config.decision_timeout,
                seat,
                agent.choose_negotiation_action(request),
            )
            .await?
            {
                Decision::Made(action) => action,
                Decision::TimedOut => default_action(seat, &offered)?,
            };

            if !offered.contains(&action) {
                return Err(GameError::IllegalDecision {
                    seat,
                    choice: action.to_string(),
                });
            }

            deal = deal.apply_negotiation(action)?;
            self.state = self.state.with_deal(deal.clone())?;
        }
        Ok(deal)
    }

    async fn perform_play(&mut self, mut deal: DealState) -> Result<DealState, GameError> {
        while deal.phase() == DealPhase::Playing {
            let (Some(play), Some(seat)) = (deal.hand_state(), deal.current_player()) else {
                break;
            };
            let legal = deal.legal_plays();
            let request = PlayRequest {
                seat,
                hand: deal.hand_of(seat),
                play,
                game: &self.state,
                legal_cards: &legal,
            };
            let agent = &mut self.agents[seat.index()];
            let card = match decide(
                &self.cancel,
                self.config.decision_timeout,
                seat,
                agent.choose_card(request),
            )
            .await?
            {
                Decision::Made(card) => card,
                Decision::TimedOut => legal.first().copied().ok_or(GameError::NoChoices(seat))?,
            };

            if !legal.contains(&card) {
                return Err(GameError::IllegalDecision {
                    seat,
                    choice: card.to_string(),
                });
            }

            let tricks_before = play.completed_tricks().len();
            deal = deal.play_card(seat, card)?;
            self.state = self.state.with_deal(deal.clone())?;

            let Some(play) = deal.hand_state() else {
                break;
            };
            let state = &self.state;
            notify_all!(self.agents, "on_card_played", |agent| agent
                .on_card_played(seat, card, play, state));

            if play.completed_tricks().len() > tricks_before
                && let Some(trick) = play.last_completed_trick()
            {
                notify_all!(self.agents, "on_trick_completed", |agent| agent
                    .on_trick_completed(trick, play, state));
            }
        }
        Ok(deal)
    }
}

fn default_action(
    seat: PlayerPosition,
    offered: &[NegotiationAction],
) -> Result<NegotiationAction, GameError> {
    offered
        .iter()
        .find(|action| action.is_accept())
        .or_else(|| offered.first())
        .copied()
        .ok_or(GameError::NoChoices(seat))
}

async fn decide<T>(
    cancel: &CancellationToken,
    timeout: Option<Duration>,
    seat: PlayerPosition,
    decision: impl Future<Output = Result<T, AgentError>>,
) -> Result<Decision<T>, GameError> {
    let bounded = async {
        match timeout {
            Some(limit) => match tokio::time::timeout(limit, decision).await {
                Ok(outcome) => outcome.map(Decision::Made),
                Err(_) => {
                    event!(
                        target: "giretra_core::manager",
                        Level::WARN,
                        seat = %seat,
                        timeout_ms = limit.as_millis() as u64,
                        "decision timed out, using default"
                    );
                    Ok(Decision::TimedOut)
                }
            },
            None => decision.await.map(Decision::Made),
        }
    };

    tokio::select! {
        _ = cancel.cancelled() => Err(GameError::Cancelled),
        outcome = bounded => outcome.map_err(|source| GameError::Agent { seat, source }),
    }
}

#[cfg(test)]
mod tests {
    use super::{GameError, GameManager, MatchConfig};
    use crate::game::agent::{
        AgentError, Cut, CutRequest, NegotiationRequest, PlayRequest, PlayerAgent,
    };
    use crate::game::match_state::MatchState;
    use crate::model::card::Card;
    use crate::model::deck::Deck;
    use crate::model::hand_state::{CompletedTrick, HandState};
    use crate::model::player::{PlayerPosition, Team};
    use crate::negotiation::NegotiationAction;
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    /// Takes the first offered choice; optionally stalls or misbehaves.
    #[derive(Default)]
    struct ScriptedAgent {
        stall: bool,
        fail_observers: bool,
        illegal_card: bool,
        tricks_seen: Option<Arc<AtomicUsize>>,
        matches_ended: Option<Arc<AtomicUsize>>,
    }

    #[async_trait]
    impl PlayerAgent for ScriptedAgent {
        async fn choose_cut(&mut self, _request: CutRequest<'_>) -> Result<Cut, AgentError> {
            Ok(Cut {
                position: 12,
                from_top: false,
            })
        }

        async fn choose_negotiation_action(
            &mut self,
            request: NegotiationRequest<'_>,
        ) -> Result<NegotiationAction, AgentError> {
            if self.stall {
                std::future::pending::<()>().await;
            }
            request
                .valid_actions
                .first()
                .copied()
                .ok_or_else(|| AgentError::Failed("no actions".into()))
        }

        async fn choose_card(&mut self, request: PlayRequest<'_>) -> Result<Card, AgentError> {
            if self.stall {
                std::future::pending::<()>().await;
            }
            if self.illegal_card {
                let foreign = request
                    .hand
                    .iter()
                    .find(|card| !request.legal_cards.contains(*card))
                    .copied();
                if let Some(card) = foreign {
                    return Ok(card);
                }
            }
            request
                .legal_cards
                .first()
                .copied()
                .ok_or_else(|| AgentError::Failed("no cards".into()))
        }

        async fn on_trick_completed(
            &mut self,
            _trick: &CompletedTrick,
            _play: &HandState,
            _game: &MatchState,
        ) -> Result<(), AgentError> {
            if let Some(counter) = &self.tricks_seen {
                counter.fetch_add(1, Ordering::SeqCst);
            }
            if self.fail_observers {
                return Err(AgentError::Failed("observer down".into()));
            }
            Ok(())
        }

        async fn on_match_ended(&mut self, _game: &MatchState) -> Result<(), AgentError> {
            if let Some(counter) = &self.matches_ended {
                counter.fetch_add(1, Ordering::SeqCst);
            }
            Ok(())
        }
    }

    fn seeded_decks(seed: u64) -> super::DeckProvider {
        let mut counter = seed;
        Box::new(move || {
            counter += 1;
            Deck::shuffled_with_seed(counter)
        })
    }

    fn seats(make: impl Fn(PlayerPosition) -> ScriptedAgent) -> [Box<dyn PlayerAgent>; 4] {
        PlayerPosition::LOOP.map(|seat| Box::new(make(seat)) as Box<dyn PlayerAgent>)
    }

    #[tokio::test]
    async fn plays_a_match_to_completion() {
        let ended = Arc::new(AtomicUsize::new(0));
        let agents = seats(|_| ScriptedAgent {
            matches_ended: Some(ended.clone()),
            ..ScriptedAgent::default()
        });
        let mut manager = GameManager::new(agents, MatchConfig::default(), seeded_decks(7));
        let state = manager.play_match().await.unwrap();

        assert!(state.is_complete());
        let winner = state.winner().unwrap();
        let instant = state
            .completed_deals()
            .last()
            .is_some_and(|deal| deal.is_instant_win);
        assert!(instant || state.match_points(winner) >= state.target_score());
        assert!(state.current_deal().is_none());
        assert_eq!(ended.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn failing_observer_does_not_block_others() {
        let seen = Arc::new(AtomicUsize::new(0));
        let agents = seats(|seat| ScriptedAgent {
            fail_observers: seat == PlayerPosition::Bottom,
            tricks_seen: Some(seen.clone()),
            ..ScriptedAgent::default()
        });
        let config = MatchConfig {
            target_score: 1,
            ..MatchConfig::default()
        };
        let mut manager = GameManager::new(agents, config, seeded_decks(11));
        let state = manager.play_match().await.unwrap();

        let tricks = state.completed_deals().len() * 8;
        assert_eq!(seen.load(Ordering::SeqCst), tricks * 4);
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_agent_falls_back_to_defaults() {
        let agents = seats(|seat| ScriptedAgent {
            stall: seat == PlayerPosition::Top,
            ..ScriptedAgent::default()
        });
        let config = MatchConfig {
            target_score: 1,
            decision_timeout: Some(Duration::from_millis(50)),
            ..MatchConfig::default()
        };
        let mut manager = GameManager::new(agents, config, seeded_decks(3));
        let state = manager.play_match().await.unwrap();
        assert!(state.is_complete());
    }

    #[tokio::test]
    async fn card_outside_legal_set_ends_the_match() {
        let agents = seats(|_| ScriptedAgent {
            illegal_card: true,
            ..ScriptedAgent::default()
        });
        let mut manager = GameManager::new(agents, MatchConfig::default(), seeded_decks(5));
        let err = manager.play_match().await.unwrap_err();
        assert!(matches!(err, GameError::IllegalDecision { .. }), "{err}");
    }

    #[tokio::test]
    async fn cancellation_is_checked_between_deals() {
        let agents = seats(|_| ScriptedAgent::default());
        let token = CancellationToken::new();
        let mut manager = GameManager::new(agents, MatchConfig::default(), seeded_decks(1))
            .with_cancellation(token.clone());
        token.cancel();
        assert!(manager.cancellation_token().is_cancelled());
        assert!(matches!(
            manager.play_match().await,
            Err(GameError::Cancelled)
        ));
        assert!(manager.state().completed_deals().is_empty());
        assert_eq!(manager.state().match_points(Team::Team1), 0);
    }
}
