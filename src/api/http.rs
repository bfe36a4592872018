use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Response, StatusCode, Url};
use serde::de::DeserializeOwned;

use super::{Backend, BackendError, CurrentUser, NewRoom, NewUser, RoomData};

#[derive(Debug, Clone)]
pub struct HttpBackend {
    base_url: Url,
    http_client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, BackendError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| BackendError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(BackendError::InvalidUrl(base_url.to_string()));
        }
        let http_client = reqwest::ClientBuilder::new()
            .timeout(timeout)
            .build()?;
        Ok(HttpBackend { base_url, http_client })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.as_str().trim_end_matches('/'))
    }

    /// `/api/room/{id}` with `id` encoded as a single path segment.
    fn room_url(&self, id: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(["api", "room", id]);
        }
        url
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
    let status = response.status();
    if !status.is_success() {
        return Err(BackendError::Status(status));
    }
    let body = response.bytes().await?;
    serde_json::from_slice(&body).map_err(|e| BackendError::Decode(e.to_string()))
}

async fn decode_optional<T: DeserializeOwned>(response: Response) -> Result<Option<T>, BackendError> {
    if response.status() == StatusCode::NOT_FOUND {
        return Ok(None);
    }
    decode(response).await.map(Some)
}

#[async_trait]
impl Backend for HttpBackend {
    async fn current_user(&self, token: &str) -> Result<Option<CurrentUser>, BackendError> {
        let response = self.http_client.get(self.url("/api/user/me"))
            .bearer_auth(token)
            .send()
            .await?;
        decode_optional(response).await
    }

    async fn create_room(&self, token: &str, room: &NewRoom) -> Result<RoomData, BackendError> {
        let response = self.http_client.post(self.url("/api/room/create"))
            .bearer_auth(token)
            .json(room)
            .send()
            .await?;
        decode(response).await
    }

    async fn register_user(&self, token: &str, user: &NewUser) -> Result<serde_json::Value, BackendError> {
        let response = self.http_client.post(self.url("/api/user"))
            .bearer_auth(token)
            .json(user)
            .send()
            .await?;
        decode(response).await
    }

    async fn room(&self, token: &str, id: &str) -> Result<Option<RoomData>, BackendError> {
        if matches!(id, "" | "." | "..") {
            return Ok(None);
        }
        let response = self.http_client.get(self.room_url(id))
            .bearer_auth(token)
            .send()
            .await?;
        decode_optional(response).await
    }
}
