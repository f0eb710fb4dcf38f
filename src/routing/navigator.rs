use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::guard::{guard, GuardDecision};
use super::route::{Access, Route};
use crate::auth::SessionStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Waiting for the session to be restored.
    Pending,
    Show(Route),
}

/// Where the user currently is. `route` is the route being shown, or the one waiting on a
/// pending session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub route: Route,
    pub view: View,
}

/// Applies the route guard to every navigation and re-applies it whenever the session
/// changes. Clones share the same location.
#[derive(Clone)]
pub struct Navigator {
    session: SessionStore,
    location: Arc<watch::Sender<Location>>,
}

impl Navigator {
    pub fn new(session: SessionStore, initial: Route) -> Self {
        let first = resolve(&session, initial);
        let (location, _) = watch::channel(first);
        Self {
            session,
            location: Arc::new(location),
        }
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn location(&self) -> Location {
        *self.location.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Location> {
        self.location.subscribe()
    }

    pub fn navigate(&self, route: Route) -> View {
        let next = resolve(&self.session, route);
        self.publish(next);
        next.view
    }

    pub fn navigate_path(&self, path: &str) -> View {
        self.navigate(Route::parse(path))
    }

    /// Runs the guard again for the current route.
    pub fn regate(&self) -> View {
        let route = self.location.borrow().route;
        self.navigate(route)
    }

    /// Re-gates on every session change until the handle is aborted.
    pub fn watch_session(&self) -> JoinHandle<()> {
        let mut changes = self.session.subscribe();
        let navigator = self.clone();
        tokio::spawn(async move {
            while changes.changed().await.is_ok() {
                navigator.regate();
            }
        })
    }

    fn publish(&self, next: Location) {
        self.location.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                log::debug!("Navigation: {:?} -> {:?}", current.view, next.view);
                *current = next;
                true
            }
        });
    }
}

fn resolve(session: &SessionStore, route: Route) -> Location {
    let required = match route.access() {
        Access::Anyone => {
            return Location {
                route,
                view: View::Show(route),
            }
        }
        Access::SignedIn(required) => required,
    };

    match guard(required, &session.current()) {
        GuardDecision::Pending => Location {
            route,
            view: View::Pending,
        },
        GuardDecision::Redirect(target) => {
            log::info!("Redirecting {} to {}", route, target);
            Location {
                route: target,
                view: View::Show(target),
            }
        }
        GuardDecision::Allow => Location {
            route,
            view: View::Show(route),
        },
    }
}
