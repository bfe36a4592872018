use axum::{debug_handler, extract::{Query, State}, response::Redirect};
use oauth2::{CsrfToken, PkceCodeChallenge};
use serde::Deserialize;
use tower_sessions::Session;

use crate::{session::{CSRF_STATE, PKCE_VERIFIER, RETURN_URL}, AppResult};

use super::{local_path, Provider};

#[derive(Deserialize)]
pub(crate) struct LoginQuery {
    #[serde(rename = "returnTo")]
    pub(crate) return_to: Option<String>,
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn login(
    Query(LoginQuery { return_to }): Query<LoginQuery>,
    State(provider): State<Provider>,
    session: Session,
) -> AppResult<Redirect> {
    let (pkce_code_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

    let mut request = provider.client()
        .authorize_url(CsrfToken::new_random)
        .add_scopes(provider.scopes.iter().cloned())
        .set_pkce_challenge(pkce_code_challenge);
    if let Some(audience) = &provider.audience {
        request = request.add_extra_param("audience", audience.clone());
    }
    let (authorize_url, csrf_state) = request.url();

    session.insert(CSRF_STATE, csrf_state.secret()).await?;
    session.insert(PKCE_VERIFIER, pkce_verifier.secret()).await?;
    session.insert(RETURN_URL, local_path(return_to.as_deref())).await?;

    tracing::debug!("redirecting to identity provider");
    Ok(Redirect::to(authorize_url.as_str()))
}
