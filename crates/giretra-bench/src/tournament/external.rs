use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use giretra_core::game::agent::{
    AgentError, Cut, CutRequest, NegotiationRequest, PlayRequest, PlayerAgent,
};
use giretra_core::game::serialization::{
    ActionDto, HandSnapshot, MatchSnapshot, NegotiationSnapshot, match_action,
};
use giretra_core::model::card::Card;
use giretra_core::model::player::PlayerPosition;
use giretra_core::negotiation::NegotiationAction;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{Level, event};

/// Settings for a bot that runs as a separate process. Each decision spawns
/// the command, writes one JSON request line to its stdin and reads one JSON
/// response from its stdout.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct ExternalOptions {
    pub(super) command: String,
    pub(super) args: Vec<String>,
    pub(super) working_dir: Option<PathBuf>,
    pub(super) timeout: Option<Duration>,
}

pub(super) struct ExternalAgent {
    name: String,
    seat: PlayerPosition,
    options: ExternalOptions,
}

impl ExternalAgent {
    pub(super) fn new(name: String, seat: PlayerPosition, options: ExternalOptions) -> Self {
        Self {
            name,
            seat,
            options,
        }
    }

    async fn invoke<Response>(&self, request: &ExternalRequest<'_>) -> Result<Response, AgentError>
    where
        Response: for<'de> Deserialize<'de>,
    {
        let exchange = self.exchange(request);
        let stdout = match self.options.timeout {
            Some(limit) => tokio::time::timeout(limit, exchange)
                .await
                .map_err(|_| AgentError::TimedOut(limit))??,
            None => exchange.await?,
        };
        serde_json::from_slice(&stdout).map_err(|err| AgentError::Protocol(err.to_string()))
    }

    async fn exchange(&self, request: &ExternalRequest<'_>) -> Result<Vec<u8>, AgentError> {
        let mut line =
            serde_json::to_vec(request).map_err(|err| AgentError::Protocol(err.to_string()))?;
        line.push(b'\n');

        let mut cmd = Command::new(&self.options.command);
        cmd.args(&self.options.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.options.working_dir {
            cmd.current_dir(dir);
        }

        let start = Instant::now();
        let mut child = cmd.spawn()?;
        {
            let mut stdin = child
                .stdin
                .take()
                .ok_or_else(|| AgentError::Failed("child stdin unavailable".into()))?;
            stdin.write_all(&line).await?;
        }
        let output = child.wait_with_output().await?;

        event!(
            target: "giretra_bench::external",
            Level::DEBUG,
            agent = %self.name,
            seat = %self.seat,
            elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
            status = %output.status,
        );

        if !output.status.success() {
            return Err(AgentError::Failed(format!("exit status {}", output.status)));
        }
        Ok(output.stdout)
    }
}

#[async_trait]
impl PlayerAgent for ExternalAgent {
    async fn choose_cut(&mut self, request: CutRequest<'_>) -> Result<Cut, AgentError> {
        let payload = ExternalRequest::Cut {
            seat: request.seat,
            deck_size: request.deck_size,
            game: MatchSnapshot::capture(request.game),
        };
        self.invoke(&payload).await
    }

    async fn choose_negotiation_action(
        &mut self,
        request: NegotiationRequest<'_>,
    ) -> Result<NegotiationAction, AgentError> {
        let payload = ExternalRequest::Negotiate {
            seat: request.seat,
            hand: request.hand.cards(),
            negotiation: NegotiationSnapshot::capture(request.negotiation),
            valid_actions: request.valid_actions.iter().map(ActionDto::from).collect(),
            game: MatchSnapshot::capture(request.game),
        };
        let dto: ActionDto = self.invoke(&payload).await?;
        match_action(&dto, request.valid_actions).map_err(|err| AgentError::Protocol(err.to_string()))
    }

    async fn choose_card(&mut self, request: PlayRequest<'_>) -> Result<Card, AgentError> {
        let payload = ExternalRequest::Play {
            seat: request.seat,
            hand: request.hand.cards(),
            play: HandSnapshot::capture(request.play),
            legal_cards: request.legal_cards,
            game: MatchSnapshot::capture(request.game),
        };
        let response: PlayResponse = self.invoke(&payload).await?;
        if request.legal_cards.contains(&response.card) {
            Ok(response.card)
        } else {
            Err(AgentError::Protocol(format!(
                "{} is not a legal card",
                response.card
            )))
        }
    }
}

#[derive(Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
enum ExternalRequest<'a> {
    Cut {
        seat: PlayerPosition,
        deck_size: usize,
        game: MatchSnapshot,
    },
    Negotiate {
        seat: PlayerPosition,
        hand: &'a [Card],
        negotiation: NegotiationSnapshot,
        valid_actions: Vec<ActionDto>,
        game: MatchSnapshot,
    },
    Play {
        seat: PlayerPosition,
        hand: &'a [Card],
        play: HandSnapshot,
        legal_cards: &'a [Card],
        game: MatchSnapshot,
    },
}

#[derive(Deserialize)]
struct PlayResponse {
    card: Card,
}

#[cfg(test)]
mod tests {
    use super::*;
    use giretra_core::game::match_state::MatchState;
    use giretra_core::model::game_mode::GameMode;
    use giretra_core::model::hand::Hand;
    use giretra_core::negotiation::{NegotiationState, valid_actions};

    fn options(command: &str, args: &[&str]) -> ExternalOptions {
        ExternalOptions {
            command: command.to_string(),
            args: args.iter().map(|arg| arg.to_string()).collect(),
            working_dir: None,
            timeout: Some(Duration::from_secs(5)),
        }
    }

    #[tokio::test]
    async fn missing_command_is_an_io_error() {
        let seat = PlayerPosition::Bottom;
        let mut agent = ExternalAgent::new(
            "ghost".into(),
            seat,
            options("__giretra_bench_missing__", &[]),
        );
        let game = MatchState::new(PlayerPosition::Right);
        let err = agent
            .choose_cut(CutRequest {
                seat,
                deck_size: 32,
                game: &game,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::Io(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn reads_cut_and_action_responses_from_stdout() {
        let seat = PlayerPosition::Left;
        let game = MatchState::new(PlayerPosition::Bottom);

        let mut cutter = ExternalAgent::new(
            "cutter".into(),
            seat,
            options(
                "sh",
                &["-c", r#"cat > /dev/null; echo '{"position":10,"from_top":false}'"#],
            ),
        );
        let cut = cutter
            .choose_cut(CutRequest {
                seat,
                deck_size: 32,
                game: &game,
            })
            .await
            .unwrap();
        assert_eq!(
            cut,
            Cut {
                position: 10,
                from_top: false
            }
        );

        let mut bidder = ExternalAgent::new(
            "bidder".into(),
            seat,
            options("sh", &["-c", r#"cat > /dev/null; echo '{"type":"accept"}'"#]),
        );
        let negotiation = NegotiationState::new(PlayerPosition::Right)
            .apply(NegotiationAction::Announce {
                player: PlayerPosition::Bottom,
                mode: GameMode::ColourHearts,
            })
            .unwrap();
        let offered = valid_actions(&negotiation);
        let hand = Hand::new();
        let request = NegotiationRequest {
            seat: negotiation.current_player(),
            hand: &hand,
            negotiation: &negotiation,
            game: &game,
            valid_actions: &offered,
        };
        let action = bidder.choose_negotiation_action(request).await.unwrap();
        assert_eq!(action, NegotiationAction::Accept { player: seat });
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn garbled_output_is_a_protocol_error() {
        let seat = PlayerPosition::Top;
        let mut agent = ExternalAgent::new(
            "garbled".into(),
            seat,
            options("sh", &["-c", "cat > /dev/null; echo not-json"]),
        );
        let game = MatchState::new(PlayerPosition::Bottom);
        let err = agent
            .choose_cut(CutRequest {
                seat,
                deck_size: 32,
                game: &game,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::Protocol(_)));
    }
}
