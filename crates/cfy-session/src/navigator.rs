//! Effects the resolver drives: navigation and state notifications.

use std::sync::{Mutex, MutexGuard, PoisonError};

use cfy_core::{Route, SessionState};

/// Page navigation. Called once per transition into a redirecting state.
pub trait Navigator: Send + Sync {
    fn redirect(&self, route: Route);
}

/// Sees every published state in order, including intermediate ones that a
/// `watch` receiver may coalesce away.
pub trait SessionListener: Send + Sync {
    fn on_state(&self, state: &SessionState);
}

/// Navigator that only remembers where it was sent.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    routes: Mutex<Vec<Route>>,
}

impl RecordingNavigator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn routes(&self) -> Vec<Route> {
        lock(&self.routes).clone()
    }

    #[must_use]
    pub fn last(&self) -> Option<Route> {
        lock(&self.routes).last().copied()
    }
}

impl Navigator for RecordingNavigator {
    fn redirect(&self, route: Route) {
        lock(&self.routes).push(route);
    }
}

/// Listener that keeps the full state history.
#[derive(Debug, Default)]
pub struct StateLog {
    states: Mutex<Vec<SessionState>>,
}

impl StateLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn states(&self) -> Vec<SessionState> {
        lock(&self.states).clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.states).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionListener for StateLog {
    fn on_state(&self, state: &SessionState) {
        lock(&self.states).push(state.clone());
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
