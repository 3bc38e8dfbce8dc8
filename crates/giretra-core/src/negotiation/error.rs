use crate::model::game_mode::GameMode;
use crate::model::player::{PlayerPosition, Team};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NegotiationError {
    #[error("negotiation is already complete")]
    Complete,
    #[error("negotiation is not complete")]
    NotComplete,
    #[error("it is {expected}'s turn, not {actual}'s")]
    OutOfTurn {
        expected: PlayerPosition,
        actual: PlayerPosition,
    },
    #[error("there is no bid yet")]
    NoBid,
    #[error("cannot announce after a double has occurred")]
    AnnounceAfterDouble,
    #[error("{0} has already accepted and may not announce")]
    AnnounceAfterAccept(PlayerPosition),
    #[error("{mode} does not outbid {current}")]
    BidTooLow { mode: GameMode, current: GameMode },
    #[error("{team} has already announced {previous}; only one colour per team")]
    ColourAlreadyAnnounced { team: Team, previous: GameMode },
    #[error("cannot double {0}: it was not announced by the opposing team")]
    NotOpponentBid(GameMode),
    #[error("{0} is already doubled")]
    AlreadyDoubled(GameMode),
    #[error("cannot double {0}: you passed on this bid when you announced")]
    DoubleForfeited(GameMode),
    #[error("cannot redouble {0}: it has not been doubled")]
    NotDoubled(GameMode),
    #[error("{0} is already redoubled")]
    AlreadyRedoubled(GameMode),
    #[error("{0} cannot be redoubled")]
    RedoubleNotPermitted(GameMode),
    #[error("only the team that announced {0} may redouble it")]
    RedoubleByOpponent(GameMode),
}
