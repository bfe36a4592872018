pub mod api;
pub mod appresult;
pub mod auth;
pub mod config;
pub mod form;
pub mod index;
pub mod res;
pub mod rooms;
pub mod session;
pub mod users;

use std::{ops::Deref, sync::Arc};

use anyhow::anyhow;
use axum::{
    extract::FromRef,
    http::Request,
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use serde_json::Value;
use tower_http::trace::TraceLayer;
use tower_sessions::{cookie::SameSite, Expiry, MemoryStore, SessionManagerLayer};

pub use appresult::{AppError, AppResult};
use api::Backend;
use config::Config;
use rooms::InFlight;

#[derive(Clone, FromRef)]
pub struct AppState {
    pub config: Arc<Config>,
    pub provider: auth::Provider,
    pub backend: Arc<dyn Backend>,
    pub in_flight: InFlight,
}

impl AppState {
    pub fn new(config: Config, backend: Arc<dyn Backend>) -> AppResult<AppState> {
        Ok(AppState {
            provider: auth::Provider::from_config(&config)?,
            config: Arc::new(config),
            backend,
            in_flight: InFlight::default(),
        })
    }
}

pub trait GetField {
    fn get_str_field(&self, field: &str) -> AppResult<String>;
}

impl GetField for Value {
    fn get_str_field(&self, field: &str) -> AppResult<String> {
        Ok(
            self.get(field)
            .ok_or(anyhow!("expected {field} in {self}"))?
            .as_str()
            .ok_or(anyhow!("expected {field} in {self} to be string"))?
            .to_owned()
        )
    }
}

/// Markdown source rendered to HTML. Raw HTML in the source is shown as text.
pub struct Markdown<T>(pub T);

impl<T> Markdown<T>
where
    T: Deref<Target = str>
{
    pub fn to_html(&self) -> String {
        use pulldown_cmark::{CowStr, Event, Parser, Options, Tag};

        let parser = Parser::new_ext(&*self.0, Options::ENABLE_STRIKETHROUGH)
            .map(|event| match event {
            Event::Html(html) | Event::InlineHtml(html) => Event::Text(html),
            Event::Start(Tag::Link { link_type, dest_url, title, id }) if !is_safe_url(&dest_url) => {
                Event::Start(Tag::Link { link_type, dest_url: CowStr::Borrowed(""), title, id })
            }
            Event::Start(Tag::Image { link_type, dest_url, title, id }) if !is_safe_url(&dest_url) => {
                Event::Start(Tag::Image { link_type, dest_url: CowStr::Borrowed(""), title, id })
            }
            _ => event,
        });

        let mut html_output = String::new();
        pulldown_cmark::html::push_html(&mut html_output, parser);
        html_output
    }
}

/// Relative links and the http, https and mailto schemes.
pub fn is_safe_url(url: &str) -> bool {
    let url = url.trim_start();
    if url.starts_with('/') || url.starts_with("./") || url.starts_with('#') {
        return true;
    }
    let lower = url.to_ascii_lowercase();
    ["http://", "https://", "mailto:"].iter().any(|scheme| lower.starts_with(scheme))
}

impl<T> IntoResponse for Markdown<T>
where
    T: Deref<Target = str>
{
    fn into_response(self) -> Response {
        Html(self.to_html()).into_response()
    }
}

/// Every page route, before state and layers are attached.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index::index))
        .route("/style.css", get(res::stylesheet))
        .merge(users::router())
        .nest("/room", rooms::router())
        .nest("/api/auth", auth::router())
}

pub fn session_layer(config: &Config) -> SessionManagerLayer<MemoryStore> {
    SessionManagerLayer::new(MemoryStore::default())
        .with_secure(config.secure_cookie)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(config.session_inactivity))
}

pub fn build_app(state: AppState) -> Router {
    let sessions = session_layer(&state.config);
    router()
        .with_state(state)
        .layer(sessions)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
                })
                .on_response(
                    |res: &axum::http::Response<_>, _latency: std::time::Duration, span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, "response");
                        } else {
                            tracing::info!(%status, "response");
                        }
                    },
                ),
        )
}
