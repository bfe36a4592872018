use axum::{debug_handler, extract::Query, response::Redirect};
use serde::Deserialize;
use tower_sessions::Session;

use crate::AppResult;

use super::local_path;

#[derive(Deserialize)]
pub(crate) struct LogoutQuery {
    #[serde(rename = "returnTo")]
    pub(crate) return_to: Option<String>,
}

#[debug_handler]
pub(crate) async fn logout(
    Query(LogoutQuery { return_to }): Query<LogoutQuery>,
    session: Session,
) -> AppResult<Redirect> {
    session.flush().await?;
    Ok(Redirect::to(&local_path(return_to.as_deref())))
}
