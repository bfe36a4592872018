use anyhow::anyhow;
use axum::{debug_handler, extract::{Query, State}, response::Redirect};
use oauth2::{AuthorizationCode, CsrfToken, PkceCodeVerifier, TokenResponse};
use serde::Deserialize;
use tower_sessions::Session;

use crate::{session::{AUTH_ERROR, CSRF_STATE, PKCE_VERIFIER, RETURN_URL, USER}, AppResult};

use super::Provider;

#[derive(Deserialize)]
pub(crate) struct CallbackQuery {
    pub state: Option<String>,
    pub code: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// Finishes the login round trip. Failures are kept in the session and shown
/// by the page the user returns to.
#[debug_handler(state = crate::AppState)]
pub(crate) async fn callback(
    Query(query): Query<CallbackQuery>,
    State(provider): State<Provider>,
    session: Session,
) -> AppResult<Redirect> {
    let return_url = session.remove::<String>(RETURN_URL).await?.unwrap_or_else(|| "/".to_owned());

    if let Err(e) = sign_in(query, &provider, &session).await {
        tracing::warn!(error = %e.0, "login failed");
        session.insert(AUTH_ERROR, e.0.to_string()).await?;
    }

    Ok(Redirect::to(&return_url))
}

async fn sign_in(
    CallbackQuery { state, code, error, error_description }: CallbackQuery,
    provider: &Provider,
    session: &Session,
) -> AppResult<()> {
    if let Some(error) = error {
        return Err(anyhow!("{}", error_description.unwrap_or(error)).into());
    }

    let state = CsrfToken::new(state.ok_or(anyhow!("OAuth: without state"))?);
    let code = AuthorizationCode::new(code.ok_or(anyhow!("OAuth: without code"))?);

    let Some(stored_state) = session.remove::<String>(CSRF_STATE).await? else {
        return Err(anyhow!("no csrf_state"))?;
    };
    if state.secret() != &stored_state {
        return Err(anyhow!("csrf tokens don't match"))?;
    }

    let Some(pkce_verifier) = session.remove::<String>(PKCE_VERIFIER).await? else {
        return Err(anyhow!("no pkce_verifier"))?;
    };

    let token_result = provider.client()
        .exchange_code(code)
        .set_pkce_verifier(PkceCodeVerifier::new(pkce_verifier))
        .request_async(&provider.http_client)
        .await?;

    let user = provider.user_info(token_result.access_token().secret()).await?;
    tracing::info!(sub = %user.sub, "signed in");

    session.cycle_id().await?;
    session.insert(USER, user).await?;
    Ok(())
}
