use super::route::Route;
use crate::auth::{Role, Session};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Session still being restored; show a neutral placeholder and decide later.
    Pending,
    Redirect(Route),
    Allow,
}

/// Gate for a protected screen. `required` of `None` admits any signed-in user. A user with
/// the wrong role is sent to their own landing page rather than to an error.
pub fn guard(required: Option<Role>, session: &Session) -> GuardDecision {
    if session.is_loading() {
        return GuardDecision::Pending;
    }

    let Some(role) = session.role() else {
        return GuardDecision::Redirect(Route::login_for(required));
    };

    match required {
        Some(required) if required != role => GuardDecision::Redirect(Route::landing(role)),
        _ => GuardDecision::Allow,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::token::test_tokens::*;
    use crate::auth::SessionStore;

    fn session_for(token: Option<String>) -> Session {
        let store = SessionStore::in_memory();
        store.restore();
        if let Some(token) = token {
            store.login(&token).unwrap();
        }
        store.current()
    }

    #[test]
    fn loading_session_defers_the_decision() {
        let loading = Session::loading();
        assert_eq!(guard(Some(Role::Admin), &loading), GuardDecision::Pending);
        assert_eq!(guard(None, &loading), GuardDecision::Pending);
    }

    #[test]
    fn anonymous_users_go_to_the_matching_login() {
        let anonymous = session_for(None);
        assert_eq!(
            guard(Some(Role::Admin), &anonymous),
            GuardDecision::Redirect(Route::AdminLogin)
        );
        assert_eq!(
            guard(Some(Role::Voter), &anonymous),
            GuardDecision::Redirect(Route::Login)
        );
        assert_eq!(guard(None, &anonymous), GuardDecision::Redirect(Route::Login));
    }

    #[test]
    fn admin_on_voter_route_lands_on_admin_dashboard() {
        let admin = session_for(Some(admin_token()));
        assert_eq!(
            guard(Some(Role::Voter), &admin),
            GuardDecision::Redirect(Route::AdminDashboard)
        );
    }

    #[test]
    fn voter_on_admin_route_lands_on_voter_home() {
        let voter = session_for(Some(voter_token()));
        assert_eq!(
            guard(Some(Role::Admin), &voter),
            GuardDecision::Redirect(Route::VoterHome)
        );
    }

    #[test]
    fn matching_or_unconstrained_role_is_allowed() {
        let voter = session_for(Some(voter_token()));
        assert_eq!(guard(Some(Role::Voter), &voter), GuardDecision::Allow);
        assert_eq!(guard(None, &voter), GuardDecision::Allow);
    }
}
