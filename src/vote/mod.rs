pub mod workflow;

pub use workflow::{VoteAttempt, VotePhase, VoteWorkflow, ERROR_CLEAR_DELAY, REDIRECT_DELAY, VOTE_FAILED};
