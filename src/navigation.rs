//! Page routes and the host-side navigation seam.

use std::fmt;
use std::sync::{Mutex, MutexGuard};

use session_model::Phase;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    /// New-session form.
    Start,
    Interview(String),
    Coding(String),
    Final(String),
}

impl Route {
    pub fn for_phase(phase: Phase, session_id: impl Into<String>) -> Self {
        let session_id = session_id.into();
        match phase {
            Phase::Interview => Self::Interview(session_id),
            Phase::LiveCoding => Self::Coding(session_id),
            Phase::Final => Self::Final(session_id),
        }
    }

    pub fn parse(path: &str) -> Option<Self> {
        let trimmed = path.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Some(Self::Start);
        }

        let mut parts = trimmed.trim_start_matches('/').splitn(2, '/');
        let page = parts.next()?;
        let session_id = parts.next().filter(|id| !id.is_empty() && !id.contains('/'))?;
        match page {
            "interview" => Some(Self::Interview(session_id.to_string())),
            "coding" => Some(Self::Coding(session_id.to_string())),
            "final" => Some(Self::Final(session_id.to_string())),
            _ => None,
        }
    }

    pub fn phase(&self) -> Option<Phase> {
        match self {
            Self::Start => None,
            Self::Interview(_) => Some(Phase::Interview),
            Self::Coding(_) => Some(Phase::LiveCoding),
            Self::Final(_) => Some(Phase::Final),
        }
    }

    pub fn session_id(&self) -> Option<&str> {
        match self {
            Self::Start => None,
            Self::Interview(id) | Self::Coding(id) | Self::Final(id) => Some(id),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => f.write_str("/"),
            Self::Interview(id) => write!(f, "/interview/{id}"),
            Self::Coding(id) => write!(f, "/coding/{id}"),
            Self::Final(id) => write!(f, "/final/{id}"),
        }
    }
}

/// Receives the route the core wants shown. How the host gets there is
/// its own business.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

/// Keeps every requested route in order.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    routes: Mutex<Vec<Route>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn routes(&self) -> Vec<Route> {
        lock_unpoisoned(&self.routes).clone()
    }

    pub fn last(&self) -> Option<Route> {
        lock_unpoisoned(&self.routes).last().cloned()
    }

    /// Removes and returns the routes recorded so far.
    pub fn take(&self) -> Vec<Route> {
        std::mem::take(&mut *lock_unpoisoned(&self.routes))
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: Route) {
        lock_unpoisoned(&self.routes).push(route);
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes_render_and_parse_symmetrically() {
        for route in [
            Route::Start,
            Route::Interview("abc".to_string()),
            Route::Coding("abc".to_string()),
            Route::Final("abc".to_string()),
        ] {
            assert_eq!(Route::parse(&route.to_string()), Some(route));
        }
    }

    #[test]
    fn phase_routes_map_to_pages() {
        assert_eq!(Route::for_phase(Phase::LiveCoding, "s").to_string(), "/coding/s");
        assert_eq!(Route::for_phase(Phase::Final, "s").phase(), Some(Phase::Final));
        assert_eq!(Route::Start.session_id(), None);
    }

    #[test]
    fn malformed_paths_are_rejected() {
        assert_eq!(Route::parse("/settings/abc"), None);
        assert_eq!(Route::parse("/interview"), None);
        assert_eq!(Route::parse("/interview/a/b"), None);
    }

    #[test]
    fn recording_navigator_keeps_order() {
        let navigator = RecordingNavigator::new();
        navigator.navigate(Route::Coding("s".to_string()));
        navigator.navigate(Route::Final("s".to_string()));

        assert_eq!(navigator.last(), Some(Route::Final("s".to_string())));
        assert_eq!(navigator.take().len(), 2);
        assert!(navigator.routes().is_empty());
    }
}
