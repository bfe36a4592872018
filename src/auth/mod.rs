mod callback;
mod login;
mod logout;
mod provider;

use axum::{routing::get, Router};

pub use provider::Provider;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", get(login::login))
        .route("/callback", get(callback::callback))
        .route("/logout", get(logout::logout))
}

/// Only same-site paths are accepted as post-login targets.
pub(crate) fn local_path(return_to: Option<&str>) -> String {
    match return_to {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.starts_with("/\\") => path.to_owned(),
        _ => "/".to_owned(),
    }
}
