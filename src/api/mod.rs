mod http;
mod models;

use async_trait::async_trait;
use axum::http::StatusCode;

pub use http::HttpBackend;
pub use models::{CurrentUser, Gender, Id, NewRoom, NewUser, RoomData};

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("backend request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("backend answered {0}")]
    Status(StatusCode),
    #[error("backend response was not understood: {0}")]
    Decode(String),
    #[error("invalid backend url {0}")]
    InvalidUrl(String),
}

/// The e-Shoku backend API. Every call carries the user's access token.
#[async_trait]
pub trait Backend: Send + Sync {
    /// `None` when the user has no registered profile yet.
    async fn current_user(&self, token: &str) -> Result<Option<CurrentUser>, BackendError>;

    async fn create_room(&self, token: &str, room: &NewRoom) -> Result<RoomData, BackendError>;

    async fn register_user(&self, token: &str, user: &NewUser) -> Result<serde_json::Value, BackendError>;

    /// `None` when no room has this id.
    async fn room(&self, token: &str, id: &str) -> Result<Option<RoomData>, BackendError>;
}
