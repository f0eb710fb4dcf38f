use std::sync::Arc;
use tokio::sync::watch;

use super::models::Role;
use super::session_storage::{MemoryStorage, TokenStorage};
use super::token::AccessToken;
use crate::error::ClientError;

/// Snapshot of who is signed in. There is no separate role field: the role is read from the
/// decoded token, so the two cannot disagree.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    token: Option<AccessToken>,
    loading: bool,
}

impl Session {
    /// State before the stored session has been looked at.
    pub fn loading() -> Self {
        Self { token: None, loading: true }
    }

    pub fn signed_out() -> Self {
        Self { token: None, loading: false }
    }

    fn signed_in(token: AccessToken) -> Self {
        Self { token: Some(token), loading: false }
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn role(&self) -> Option<Role> {
        self.token.as_ref().map(AccessToken::role)
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_ref().map(AccessToken::as_str)
    }

    /// Phone number of a voter or username of an admin.
    pub fn subject(&self) -> Option<&str> {
        self.token.as_ref().map(AccessToken::subject)
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

/// The one place authentication state lives. Cheap to clone; every clone shares the same
/// state and storage.
#[derive(Clone)]
pub struct SessionStore {
    storage: Arc<dyn TokenStorage>,
    state: Arc<watch::Sender<Session>>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn TokenStorage>) -> Self {
        let (state, _) = watch::channel(Session::loading());
        Self {
            storage,
            state: Arc::new(state),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    pub fn current(&self) -> Session {
        self.state.borrow().clone()
    }

    pub fn role(&self) -> Option<Role> {
        self.state.borrow().role()
    }

    pub fn token(&self) -> Option<String> {
        self.state.borrow().token().map(str::to_string)
    }

    /// Receives every change of the session, including the end of `restore`.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    /// Accepts a freshly issued token. A token that does not decode leaves the current
    /// session untouched.
    pub fn login(&self, token: &str) -> Result<Role, ClientError> {
        let token = AccessToken::decode(token)?;
        let role = token.role();

        if let Err(e) = self.storage.save(token.as_str()) {
            log::warn!("Failed to save session: {}", e);
        }

        log::info!("Signed in as {} ({})", token.subject(), role.label());
        self.publish(Session::signed_in(token));
        Ok(role)
    }

    pub fn logout(&self) {
        if let Err(e) = self.storage.clear() {
            log::warn!("Failed to clear stored session: {}", e);
        }
        if self.state.borrow().is_authenticated() {
            log::info!("Signed out");
        }
        self.publish(Session::signed_out());
    }

    /// Loads the stored token at start-up. Anything unreadable, malformed or expired ends
    /// in an empty session and a wiped store.
    pub fn restore(&self) -> Session {
        let restored = match self.storage.load() {
            Ok(Some(raw)) => match AccessToken::decode(&raw) {
                Ok(token) => {
                    log::info!("Restored session for {}", token.subject());
                    Some(token)
                }
                Err(e) => {
                    log::warn!("Discarding stored session: {}", e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                log::warn!("Failed to read stored session: {}", e);
                None
            }
        };

        let session = match restored {
            Some(token) => Session::signed_in(token),
            None => {
                if let Err(e) = self.storage.clear() {
                    log::warn!("Failed to clear stored session: {}", e);
                }
                Session::signed_out()
            }
        };

        self.publish(session.clone());
        session
    }

    fn publish(&self, next: Session) {
        self.state.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::token::test_tokens::*;

    fn store_with(storage: Arc<MemoryStorage>) -> SessionStore {
        SessionStore::new(storage)
    }

    #[test]
    fn starts_loading_until_restored() {
        let store = SessionStore::in_memory();
        assert!(store.current().is_loading());
        assert_eq!(store.role(), None);

        let session = store.restore();
        assert!(!session.is_loading());
        assert!(!session.is_authenticated());
    }

    #[test]
    fn login_derives_role_and_persists_token() {
        let storage = Arc::new(MemoryStorage::new());
        let store = store_with(storage.clone());
        store.restore();

        let token = admin_token();
        assert_eq!(store.login(&token).unwrap(), Role::Admin);
        assert_eq!(store.role(), Some(Role::Admin));
        assert_eq!(store.token().as_deref(), Some(token.as_str()));
        assert_eq!(storage.load().unwrap().as_deref(), Some(token.as_str()));
    }

    #[test]
    fn bad_token_leaves_session_unchanged() {
        let storage = Arc::new(MemoryStorage::new());
        let store = store_with(storage.clone());
        store.restore();
        store.login(&voter_token()).unwrap();
        let before = store.current();

        let err = store.login("definitely-not-a-jwt").unwrap_err();
        assert!(matches!(err, ClientError::InvalidToken(_)));
        assert_eq!(store.current(), before);
        assert_eq!(storage.load().unwrap().as_deref(), before.token());
    }

    #[test]
    fn logout_is_idempotent() {
        let storage = Arc::new(MemoryStorage::new());
        let store = store_with(storage.clone());
        store.restore();
        store.login(&voter_token()).unwrap();

        store.logout();
        store.logout();
        assert_eq!(store.current(), Session::signed_out());
        assert_eq!(storage.load().unwrap(), None);
    }

    #[test]
    fn restore_recovers_a_valid_token() {
        let token = voter_token();
        let store = store_with(Arc::new(MemoryStorage::with_token(token.clone())));

        let session = store.restore();
        assert_eq!(session.role(), Some(Role::Voter));
        assert_eq!(session.token(), Some(token.as_str()));
    }

    #[test]
    fn restore_wipes_corrupted_or_expired_tokens() {
        for stored in [
            "garbage".to_string(),
            make_token("x", "ROLE_USER", Some(10)),
            make_token("x", "ROLE_NOBODY", None),
        ] {
            let storage = Arc::new(MemoryStorage::with_token(stored));
            let store = store_with(storage.clone());

            let session = store.restore();
            assert_eq!(session.role(), None);
            assert_eq!(session.token(), None);
            assert!(!session.is_loading());
            assert_eq!(storage.load().unwrap(), None);
        }
    }

    #[tokio::test]
    async fn subscribers_see_changes() {
        let store = SessionStore::in_memory();
        let mut rx = store.subscribe();
        store.restore();
        rx.changed().await.unwrap();
        assert!(!rx.borrow_and_update().is_loading());

        store.login(&admin_token()).unwrap();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().role(), Some(Role::Admin));
    }
}
