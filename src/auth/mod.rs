pub mod auth_manager;
pub mod login_flow;
pub mod models;
pub mod session_storage;
pub mod session_store;
pub mod token;

pub use auth_manager::{AuthApi, AuthManager};
pub use login_flow::{AdminLogin, LoginFlow, LoginMode, LoginResult, LoginStep, VoterLogin};
pub use models::*;
pub use session_storage::{MemoryStorage, SessionStorage, StoredSession, TokenStorage};
pub use session_store::{Session, SessionStore};
pub use token::{AccessToken, TokenError};
