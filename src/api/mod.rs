//! HTTP client for the notes API.
//!
//! Configuration is via [`crate::config::Config`]; the base URL defaults to
//! [`DEFAULT_URL`]. The bearer token is read from the shared
//! [`SessionContext`] on every request, so a login performed through one
//! handle is seen by all of them.

use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::models::*;
use crate::session::SessionContext;

/// Default URL for local development.
pub const DEFAULT_URL: &str = "http://localhost:5228/api";

/// HTTP client errors.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Network(#[source] reqwest::Error),

    #[error("server returned {status}: {body}")]
    Http { status: StatusCode, body: String },

    #[error("unauthorized: session missing or expired")]
    Unauthorized { body: String },

    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// The server's error body, when it sent a non-empty one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Http { body, .. } | Self::Unauthorized { body } => {
                let body = body.trim();
                (!body.is_empty()).then_some(body)
            }
            _ => None,
        }
    }
}

/// HTTP client for the notes API.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    session: SessionContext,
    client: Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, session: SessionContext) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
            client: Client::new(),
        }
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    /// Build a request with the bearer header when a session is present.
    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.client.request(method, &url);
        if let Some(token) = self.session.token() {
            req = req.bearer_auth(token);
        }
        req
    }

    /// Send once and turn failure statuses into [`ApiError`].
    ///
    /// A 401 invalidates the shared session before the error is returned.
    async fn execute(
        &self,
        req: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, ApiError> {
        let response = req.send().await.map_err(|e| {
            tracing::warn!("request did not reach server: {}", e);
            ApiError::Network(e)
        })?;

        let status = response.status();
        tracing::debug!(%status, url = %response.url(), "response");
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        if status == StatusCode::UNAUTHORIZED {
            self.session.invalidate();
            return Err(ApiError::Unauthorized { body });
        }
        tracing::warn!(%status, "request failed: {}", body);
        Err(ApiError::Http { status, body })
    }

    /// Decode a JSON body.
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let text = response.text().await.map_err(ApiError::Network)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Generic request: optional JSON body, optional query pairs.
    ///
    /// Returns `Value::Null` for an empty success body (e.g. 204).
    pub async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        query: &[(&str, &str)],
    ) -> Result<serde_json::Value, ApiError> {
        tracing::debug!(%method, path, "sending request");
        let mut req = self.request(method, path);
        if !query.is_empty() {
            req = req.query(query);
        }
        if let Some(body) = body {
            req = req.json(body);
        }

        let response = self.execute(req).await?;
        let text = response.text().await.map_err(ApiError::Network)?;
        if text.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }

    // ============================================================
    // Auth Operations
    // ============================================================

    pub async fn login(&self, input: &LoginInput) -> Result<AuthResponse, ApiError> {
        let req = self.request(Method::POST, "/auth/login").json(input);
        let response = self.execute(req).await?;
        self.handle_response(response).await
    }

    pub async fn register(&self, input: &RegisterInput) -> Result<AuthResponse, ApiError> {
        let req = self.request(Method::POST, "/auth/register").json(input);
        let response = self.execute(req).await?;
        self.handle_response(response).await
    }

    // ============================================================
    // Note Operations
    // ============================================================

    /// List the caller's notes. The server filters when `search` is non-empty.
    pub async fn list_notes(&self, search: Option<&str>) -> Result<Vec<Note>, ApiError> {
        let mut req = self.request(Method::GET, "/notes");
        if let Some(term) = search.filter(|t| !t.is_empty()) {
            req = req.query(&[("search", term)]);
        }
        let response = self.execute(req).await?;
        self.handle_response(response).await
    }

    pub async fn get_note(&self, id: i64) -> Result<Note, ApiError> {
        let req = self.request(Method::GET, &format!("/notes/{}", id));
        let response = self.execute(req).await?;
        self.handle_response(response).await
    }

    pub async fn create_note(&self, input: &CreateNoteInput) -> Result<Note, ApiError> {
        let req = self.request(Method::POST, "/notes").json(input);
        let response = self.execute(req).await?;
        self.handle_response(response).await
    }

    pub async fn update_note(&self, id: i64, input: &UpdateNoteInput) -> Result<Note, ApiError> {
        let req = self
            .request(Method::PUT, &format!("/notes/{}", id))
            .json(input);
        let response = self.execute(req).await?;
        self.handle_response(response).await
    }

    /// Delete a note. The server answers 204 No Content.
    pub async fn delete_note(&self, id: i64) -> Result<(), ApiError> {
        let req = self.request(Method::DELETE, &format!("/notes/{}", id));
        self.execute(req).await?;
        Ok(())
    }
}
