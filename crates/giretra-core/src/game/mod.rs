pub mod agent;
pub mod deal;
pub mod manager;
pub mod match_state;
pub mod serialization;

pub use agent::{AgentError, Cut, CutRequest, NegotiationRequest, PlayRequest, PlayerAgent};
pub use deal::{DealError, DealPhase, DealState};
pub use manager::{DeckProvider, GameError, GameManager, MatchConfig};
pub use match_state::{MatchError, MatchState};
