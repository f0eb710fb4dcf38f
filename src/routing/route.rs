use crate::auth::Role;

/// Every screen the client can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    /// Same login screen, opened on the admin tab.
    AdminLogin,
    VoterHome,
    Ballot(i64),
    AdminDashboard,
    ManageElection(i64),
}

/// Who may open a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Anyone,
    /// Signed-in users; `Some(role)` narrows it to that role.
    SignedIn(Option<Role>),
}

impl Route {
    /// Resolves a path the way the browser router did; anything unknown lands on `/`.
    pub fn parse(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            ["login"] => Self::Login,
            ["admin", "login"] => Self::AdminLogin,
            ["vote", id] => id.parse().map(Self::Ballot).unwrap_or(Self::VoterHome),
            ["admin", "dashboard"] => Self::AdminDashboard,
            ["admin", "election", id] => id
                .parse()
                .map(Self::ManageElection)
                .unwrap_or(Self::VoterHome),
            _ => Self::VoterHome,
        }
    }

    pub fn path(&self) -> String {
        match self {
            Self::Login => "/login".to_string(),
            Self::AdminLogin => "/admin/login".to_string(),
            Self::VoterHome => "/".to_string(),
            Self::Ballot(id) => format!("/vote/{}", id),
            Self::AdminDashboard => "/admin/dashboard".to_string(),
            Self::ManageElection(id) => format!("/admin/election/{}", id),
        }
    }

    pub fn access(&self) -> Access {
        match self {
            Self::Login | Self::AdminLogin => Access::Anyone,
            Self::VoterHome | Self::Ballot(_) => Access::SignedIn(Some(Role::Voter)),
            Self::AdminDashboard | Self::ManageElection(_) => Access::SignedIn(Some(Role::Admin)),
        }
    }

    pub fn landing(role: Role) -> Self {
        match role {
            Role::Voter => Self::VoterHome,
            Role::Admin => Self::AdminDashboard,
        }
    }

    /// Where to sign in before opening a route that needs `required`.
    pub fn login_for(required: Option<Role>) -> Self {
        match required {
            Some(Role::Admin) => Self::AdminLogin,
            _ => Self::Login,
        }
    }

    pub fn is_login(&self) -> bool {
        matches!(self, Self::Login | Self::AdminLogin)
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_the_route_table() {
        assert_eq!(Route::parse("/login"), Route::Login);
        assert_eq!(Route::parse("/admin/login"), Route::AdminLogin);
        assert_eq!(Route::parse("/"), Route::VoterHome);
        assert_eq!(Route::parse("/vote/12"), Route::Ballot(12));
        assert_eq!(Route::parse("/admin/dashboard/"), Route::AdminDashboard);
        assert_eq!(Route::parse("/admin/election/3?tab=results"), Route::ManageElection(3));
    }

    #[test]
    fn unknown_paths_fall_back_to_home() {
        assert_eq!(Route::parse("/nowhere"), Route::VoterHome);
        assert_eq!(Route::parse("/vote/abc"), Route::VoterHome);
        assert_eq!(Route::parse(""), Route::VoterHome);
    }

    #[test]
    fn paths_parse_back() {
        for route in [
            Route::Login,
            Route::AdminLogin,
            Route::VoterHome,
            Route::Ballot(7),
            Route::AdminDashboard,
            Route::ManageElection(9),
        ] {
            assert_eq!(Route::parse(&route.path()), route);
        }
    }

    #[test]
    fn login_entry_depends_on_required_role() {
        assert_eq!(Route::login_for(Some(Role::Admin)), Route::AdminLogin);
        assert_eq!(Route::login_for(Some(Role::Voter)), Route::Login);
        assert_eq!(Route::login_for(None), Route::Login);
    }
}
