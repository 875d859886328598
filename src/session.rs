//! Shared session state.
//!
//! A [`SessionContext`] is created once and handed to the API client and to
//! every store that needs to know who is logged in. It mirrors the in-memory
//! session into a [`KeyValueStore`] so that a later process can pick it up
//! again with [`SessionContext::restore`].
//!
//! Storage failures never abort a session transition. They are logged and
//! the in-memory state still changes, so the worst case is a session that
//! does not survive a restart.

use std::sync::{Arc, Mutex};

use crate::models::{AuthResponse, User};
use crate::storage::{KeyValueStore, TOKEN_KEY, USER_KEY};

/// Whether a user is currently logged in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Authenticated,
}

/// A bearer token and the user it was issued to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub user: User,
}

#[derive(Default)]
struct Inner {
    session: Option<Session>,
    redirect_to_login: bool,
}

/// Cloneable handle over the current session and its durable copy.
#[derive(Clone)]
pub struct SessionContext {
    inner: Arc<Mutex<Inner>>,
    storage: Arc<dyn KeyValueStore>,
}

impl SessionContext {
    /// Start anonymous. Call [`restore`](Self::restore) to load a saved session.
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            storage,
        }
    }

    pub fn state(&self) -> SessionState {
        if self.lock().session.is_some() {
            SessionState::Authenticated
        } else {
            SessionState::Anonymous
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.state() == SessionState::Authenticated
    }

    pub fn token(&self) -> Option<String> {
        self.lock().session.as_ref().map(|s| s.token.clone())
    }

    pub fn user(&self) -> Option<User> {
        self.lock().session.as_ref().map(|s| s.user.clone())
    }

    /// Load the persisted session, trusting it without contacting the server.
    ///
    /// Both keys must be present and non-empty, and the user must
    /// deserialize; otherwise the context stays anonymous. Returns the
    /// resulting state.
    pub fn restore(&self) -> SessionState {
        let token = self.read(TOKEN_KEY).filter(|v| !v.is_empty());
        let user = self.read(USER_KEY).filter(|v| !v.is_empty());

        let (Some(token), Some(user)) = (token, user) else {
            return self.state();
        };

        match serde_json::from_str::<User>(&user) {
            Ok(user) => {
                tracing::debug!(user_id = user.id, "restored persisted session");
                self.lock().session = Some(Session { token, user });
            }
            Err(e) => tracing::warn!("ignoring unreadable persisted user: {}", e),
        }
        self.state()
    }

    /// Become authenticated and persist both keys.
    pub fn establish(&self, auth: &AuthResponse) {
        self.write(TOKEN_KEY, &auth.token);
        match serde_json::to_string(&auth.user) {
            Ok(user) => self.write(USER_KEY, &user),
            Err(e) => tracing::warn!("failed to serialize user: {}", e),
        }

        let mut inner = self.lock();
        inner.session = Some(Session {
            token: auth.token.clone(),
            user: auth.user.clone(),
        });
        inner.redirect_to_login = false;
    }

    /// Become anonymous and erase both keys.
    pub fn clear(&self) {
        self.erase(TOKEN_KEY);
        self.erase(USER_KEY);
        self.lock().session = None;
    }

    /// The server rejected our credentials: clear everything and ask the
    /// front-end to send the user to the login page.
    pub fn invalidate(&self) {
        tracing::info!("session rejected by server, logging out");
        self.clear();
        self.lock().redirect_to_login = true;
    }

    /// Consume a pending redirect-to-login signal raised by [`invalidate`](Self::invalidate).
    pub fn take_login_redirect(&self) -> bool {
        std::mem::take(&mut self.lock().redirect_to_login)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("session lock poisoned")
    }

    fn read(&self, key: &str) -> Option<String> {
        self.storage.get(key).unwrap_or_else(|e| {
            tracing::warn!(key, "failed to read session storage: {}", e);
            None
        })
    }

    fn write(&self, key: &str, value: &str) {
        if let Err(e) = self.storage.set(key, value) {
            tracing::warn!(key, "failed to write session storage: {}", e);
        }
    }

    fn erase(&self, key: &str) {
        if let Err(e) = self.storage.remove(key) {
            tracing::warn!(key, "failed to clear session storage: {}", e);
        }
    }
}
