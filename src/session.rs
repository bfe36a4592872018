use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Response},
};
use oauth2::url::form_urlencoded;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

pub const CSRF_STATE: &str = "csrf_state";
pub const PKCE_VERIFIER: &str = "pkce_verifier";
pub const RETURN_URL: &str = "return_url";
pub const USER: &str = "user";
pub const AUTH_ERROR: &str = "auth_error";

pub const LOGIN_PATH: &str = "/api/auth/login";

/// Identity stored in the session after a successful login.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    pub sub: String,
    pub name: String,
    pub email: String,
    pub access_token: String,
}

/// Authentication state of the current request.
#[derive(Debug, Clone)]
pub enum AuthState {
    Authenticated(SessionUser),
    Anonymous,
    /// Login failed or the session could not be read; the message is shown as is.
    Failed(String),
}

/// What a protected page does next.
#[derive(Debug)]
pub enum Guard {
    Authenticated(SessionUser),
    Redirect(String),
    Error(String),
}

impl AuthState {
    pub fn require(self, return_to: &str) -> Guard {
        match self {
            AuthState::Authenticated(user) => Guard::Authenticated(user),
            AuthState::Anonymous => Guard::Redirect(login_url(return_to)),
            AuthState::Failed(message) => Guard::Error(message),
        }
    }

    async fn load(session: &Session) -> Result<AuthState, tower_sessions::session::Error> {
        // pending login errors are shown once
        if let Some(message) = session.remove::<String>(AUTH_ERROR).await? {
            return Ok(AuthState::Failed(message));
        }
        Ok(match session.get::<SessionUser>(USER).await? {
            Some(user) => AuthState::Authenticated(user),
            None => AuthState::Anonymous,
        })
    }
}

pub fn login_url(return_to: &str) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("returnTo", return_to)
        .finish();
    format!("{LOGIN_PATH}?{query}")
}

impl<S> FromRequestParts<S> for AuthState
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;
        Ok(AuthState::load(&session)
            .await
            .unwrap_or_else(|e| AuthState::Failed(e.to_string())))
    }
}

#[cfg(test)]
pub(crate) fn alice() -> SessionUser {
    SessionUser {
        sub: "auth0|alice".to_owned(),
        name: "Alice".to_owned(),
        email: "alice@example.com".to_owned(),
        access_token: "token".to_owned(),
    }
}
