pub mod agent;
pub mod bot;
pub mod policy;

pub use agent::{DEFAULT_MAX_FAILURES, PolicyAgent, ResilientAgent};
pub use bot::{
    BidPlanner, BotContext, BotDifficulty, BotParams, PlayPlanner, PlayReason, UnseenTracker,
};
pub use policy::{FirstLegalPolicy, HeuristicPolicy, Policy, PolicyContext, RandomPolicy};
