//! Navigation targets and the guard that gates them on session state.

use crate::session::SessionState;

/// Access requirements attached to a route.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouteMeta {
    pub requires_auth: bool,
    pub requires_guest: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Notes,
    Login,
    Register,
}

impl Route {
    pub const ALL: [Route; 3] = [Route::Notes, Route::Login, Route::Register];

    pub fn path(&self) -> &'static str {
        match self {
            Self::Notes => "/",
            Self::Login => "/login",
            Self::Register => "/register",
        }
    }

    pub fn from_path(path: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.path() == path)
    }

    pub fn meta(&self) -> RouteMeta {
        match self {
            Self::Notes => RouteMeta {
                requires_auth: true,
                requires_guest: false,
            },
            Self::Login | Self::Register => RouteMeta {
                requires_auth: false,
                requires_guest: true,
            },
        }
    }
}

/// Outcome of a navigation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Allow,
    RedirectToLogin,
    RedirectToHome,
}

impl Navigation {
    /// Where the guard sends the user instead, if anywhere.
    pub fn redirect_target(&self) -> Option<Route> {
        match self {
            Self::Allow => None,
            Self::RedirectToLogin => Some(Route::Login),
            Self::RedirectToHome => Some(Route::Notes),
        }
    }
}

/// Decide whether a destination with `meta` may be entered in `state`.
pub fn guard(meta: RouteMeta, state: SessionState) -> Navigation {
    match state {
        SessionState::Anonymous if meta.requires_auth => Navigation::RedirectToLogin,
        SessionState::Authenticated if meta.requires_guest => Navigation::RedirectToHome,
        _ => Navigation::Allow,
    }
}

/// Guard a path. Unknown paths carry no requirements and are allowed.
pub fn guard_path(path: &str, state: SessionState) -> Navigation {
    let meta = Route::from_path(path).map(|r| r.meta()).unwrap_or_default();
    guard(meta, state)
}
