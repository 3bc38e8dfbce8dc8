pub mod action;
pub mod engine;
pub mod error;
pub mod state;

pub use action::NegotiationAction;
pub use engine::{can_accept, can_announce, can_double, can_redouble, valid_actions, validate_action};
pub use error::NegotiationError;
pub use state::{ACCEPTS_TO_COMPLETE, NegotiationState, ResolvedContract};
