use std::sync::{Arc, Mutex};

use super::ActionStatus;
use crate::api::{ApiClient, ApiError};
use crate::models::{AuthResponse, LoginInput, RegisterInput, User};
use crate::session::{SessionContext, SessionState};

/// Login, registration and logout on top of the shared [`SessionContext`].
#[derive(Clone)]
pub struct AuthStore {
    api: ApiClient,
    status: Arc<Mutex<ActionStatus>>,
}

impl AuthStore {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            status: Arc::new(Mutex::new(ActionStatus::default())),
        }
    }

    fn session(&self) -> &SessionContext {
        self.api.session()
    }

    /// Pick up a persisted session. No network call is made; a stale token
    /// is corrected by the first request that comes back 401.
    pub fn initialize(&self) -> SessionState {
        self.session().restore()
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ApiError> {
        let input = LoginInput {
            email: email.to_string(),
            password: password.to_string(),
        };
        self.lock().begin();
        let result = self.api.login(&input).await;
        self.complete(result, "Login failed")
    }

    pub async fn register(&self, input: &RegisterInput) -> Result<AuthResponse, ApiError> {
        self.lock().begin();
        let result = self.api.register(input).await;
        self.complete(result, "Registration failed")
    }

    /// Drop the session unconditionally. No request is sent.
    pub fn logout(&self) {
        self.session().clear();
    }

    fn complete(
        &self,
        result: Result<AuthResponse, ApiError>,
        fallback: &str,
    ) -> Result<AuthResponse, ApiError> {
        match result {
            Ok(auth) => {
                self.session().establish(&auth);
                tracing::info!(user_id = auth.user.id, "authenticated");
                self.lock().finish(None);
                Ok(auth)
            }
            Err(e) => {
                let message = e.server_message().unwrap_or(fallback).to_string();
                tracing::warn!("{}: {}", fallback, e);
                self.lock().finish(Some(message));
                Err(e)
            }
        }
    }

    pub fn state(&self) -> SessionState {
        self.session().state()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session().is_authenticated()
    }

    pub fn user(&self) -> Option<User> {
        self.session().user()
    }

    pub fn token(&self) -> Option<String> {
        self.session().token()
    }

    /// `"First Last"`, or empty when nobody is logged in.
    pub fn user_full_name(&self) -> String {
        self.user().map(|u| u.full_name()).unwrap_or_default()
    }

    pub fn is_loading(&self) -> bool {
        self.lock().loading
    }

    pub fn error(&self) -> Option<String> {
        self.lock().error.clone()
    }

    pub fn clear_error(&self) {
        self.lock().error = None;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ActionStatus> {
        self.status.lock().expect("auth status lock poisoned")
    }
}
