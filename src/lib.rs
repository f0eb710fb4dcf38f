pub mod api;
pub mod auth;
pub mod error;
pub mod helpers;
pub mod polling;
pub mod routing;
pub mod settings;
pub mod theme;
pub mod tui;
pub mod vote;

pub use api::{BallotApi, NtrovoteClient};
pub use auth::{AuthApi, AuthManager, LoginFlow, Role, Session, SessionStore};
pub use error::ClientError;
pub use polling::{PollManager, POLL_PERIOD};
pub use routing::{Navigator, Route};
pub use settings::{ClientSettings, SettingsManager};
pub use vote::{VotePhase, VoteWorkflow};
