//! Auth Gateway: login and registration against the remote auth service.
//!
//! Each call returns a typed outcome; deciding how to present it (inline
//! message, toast, stderr) is left to the caller. Nothing is retried.

use finsight_core::{Credential, SessionContext, StoreError, View};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::api::ApiClient;

#[derive(Serialize)]
struct Submission<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    #[serde(default)]
    token: Option<String>,
}

#[derive(Deserialize)]
struct MessageBody {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    pub credential: Credential,
    /// Where the client goes next: the protected area.
    pub next: View,
}

impl fmt::Debug for LoginOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginOutcome").field("next", &self.next).finish_non_exhaustive()
    }
}

/// Registration never authenticates: `next` is always the login view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterOutcome {
    pub next: View,
    pub message: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("rejected by auth service ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("auth service unreachable")]
    Transport(#[source] reqwest::Error),
    #[error("malformed auth response: {0}")]
    Malformed(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AuthError {
    /// Text for the user-facing notification.
    pub fn user_message(&self) -> String {
        match self {
            AuthError::MissingField(field) => format!("{} is required", capitalize(field)),
            AuthError::InvalidCredentials => "Invalid credentials".to_string(),
            AuthError::Rejected { message, .. } => message.clone(),
            AuthError::Transport(_) => "Unable to reach the server".to_string(),
            AuthError::Malformed(_) => "Unexpected response from the server".to_string(),
            AuthError::Store(_) => "Could not save the session".to_string(),
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, AuthError::Transport(_))
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[derive(Debug, Clone)]
pub struct AuthGateway {
    api: ApiClient,
    session: SessionContext,
}

impl AuthGateway {
    pub fn new(api: ApiClient, session: SessionContext) -> Self {
        Self { api, session }
    }

    /// `POST /api/login`. On success the credential is written to the session.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, AuthError> {
        let submission = submission(email, password)?;
        tracing::debug!("login requested");

        let resp = self
            .api
            .post("/api/login")
            .json(&submission)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "login transport failure");
                AuthError::Transport(e)
            })?;

        let status = resp.status();
        let body = resp.text().await.map_err(AuthError::Transport)?;

        if !status.is_success() {
            tracing::info!(status = status.as_u16(), "login rejected");
            if status.is_client_error() {
                return Err(AuthError::InvalidCredentials);
            }
            return Err(AuthError::Rejected {
                status: status.as_u16(),
                message: service_message(&body).unwrap_or_else(|| "Login failed".to_string()),
            });
        }

        let parsed: LoginResponse = serde_json::from_str(&body).map_err(|e| AuthError::Malformed(e.to_string()))?;
        let credential = parsed
            .token
            .and_then(Credential::new)
            .ok_or(AuthError::InvalidCredentials)?;

        self.session.set(&credential)?;
        tracing::info!("login succeeded");
        Ok(LoginOutcome {
            credential,
            next: View::Dashboard,
        })
    }

    /// `POST /api/register`. Success is the HTTP status alone; no credential is issued.
    pub async fn register(&self, email: &str, password: &str) -> Result<RegisterOutcome, AuthError> {
        let submission = submission(email, password)?;
        tracing::debug!("registration requested");

        let resp = self
            .api
            .post("/api/register")
            .json(&submission)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "registration transport failure");
                AuthError::Transport(e)
            })?;

        let status = resp.status();
        let body = resp.text().await.map_err(AuthError::Transport)?;

        if status.is_success() {
            tracing::info!(status = status.as_u16(), "registration succeeded");
            return Ok(RegisterOutcome {
                next: View::Login,
                message: service_message(&body),
            });
        }

        tracing::info!(status = status.as_u16(), "registration rejected");
        Err(AuthError::Rejected {
            status: status.as_u16(),
            message: service_message(&body).unwrap_or_else(|| "Registration failed".to_string()),
        })
    }
}

/// Presence is the only client-side check; the service judges everything else.
fn submission<'a>(email: &'a str, password: &'a str) -> Result<Submission<'a>, AuthError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(AuthError::MissingField("email"));
    }
    if password.is_empty() {
        return Err(AuthError::MissingField("password"));
    }
    Ok(Submission { email, password })
}

/// `{message}` from a JSON body, or a short plain-text body as sent by `http.Error`-style handlers.
fn service_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }
    match serde_json::from_str::<MessageBody>(body) {
        Ok(parsed) => parsed.message.map(|m| m.trim().to_string()).filter(|m| !m.is_empty()),
        Err(_) if !body.starts_with('{') && !body.starts_with('<') => Some(body.to_string()),
        Err(_) => None,
    }
}
