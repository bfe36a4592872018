use std::sync::Arc;

use axum::{
    debug_handler,
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;

use crate::{
    api::{Backend, CurrentUser, NewRoom},
    config::Config,
    form::{join_datetime, normalize_date, DateStyle, FieldErrors, Rule},
    include_res, res,
    session::{AuthState, Guard, SessionUser},
};

use super::InFlight;

const RETURN_TO: &str = "/room/create";
const SIGNUP_PATH: &str = "/signup";
pub(crate) const SUBMIT_FAILED: &str = "データの送信に失敗しました";
pub(crate) const LOAD_FAILED: &str = "データの取得に失敗しました";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RoomForm {
    pub(crate) room_name: String,
    pub(crate) description: String,
    pub(crate) date: String,
    pub(crate) time: String,
}

impl RoomForm {
    fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::default();
        errors.check("room_name", Rule::required().max(64), &self.room_name);
        errors.check("description", Rule::required().max(256), &self.description);
        errors.check("date", Rule::required(), &self.date);
        errors.check("time", Rule::required(), &self.time);
        errors
    }

    /// Builds the backend payload with `host` as the only host.
    fn into_payload(self, host: &CurrentUser, style: DateStyle) -> Result<NewRoom, FieldErrors> {
        let mut errors = self.validate();
        let date = normalize_date(&self.date, style);
        if date.is_none() {
            errors.add("date");
        }
        let Some(date) = date.filter(|_| errors.is_empty()) else {
            return Err(errors);
        };

        Ok(NewRoom {
            datetime: join_datetime(&date, &self.time),
            room_name: self.room_name,
            description: self.description,
            date,
            time: self.time,
            hosts: vec![host.id.clone()],
        })
    }
}

/// The mutually exclusive states of the room-creation page.
#[derive(Debug)]
pub(crate) enum CreateRoomView {
    /// A submission by this user is still waiting on the backend.
    Loading,
    AuthError(String),
    Form {
        form: RoomForm,
        errors: FieldErrors,
        alert: Option<&'static str>,
    },
    /// Signed in, but the profile could not be loaded.
    Unavailable,
}

impl CreateRoomView {
    fn blank() -> Self {
        CreateRoomView::Form { form: RoomForm::default(), errors: FieldErrors::default(), alert: None }
    }

    pub(crate) fn render(&self) -> String {
        let body = match self {
            CreateRoomView::Loading => {
                r#"<h2 class="title">ルーム作成</h2><div class="loading" role="status">Loading...</div>"#.to_owned()
            }
            CreateRoomView::AuthError(message) => format!(
                r#"<h2 class="title">ルーム作成</h2><h4>Error</h4><pre>{}</pre>"#,
                res::text(message)
            ),
            CreateRoomView::Unavailable => format!(
                r#"<h2 class="title">ルーム作成</h2><div class="text-center">{LOAD_FAILED}</div>"#
            ),
            CreateRoomView::Form { form, errors, alert } => {
                let alert = alert
                    .map(|message| format!(r#"<dialog class="alert" open role="alertdialog"><p>{message}</p><form method="dialog"><button>OK</button></form></dialog>"#))
                    .unwrap_or_default();
                res::fill(include_res!(str, "/pages/rooms/create.html"), &[
                    ("alert", alert.as_str()),
                    ("room_name", res::attr(&form.room_name).as_str()),
                    ("room_name_error", errors.html("room_name")),
                    ("description", res::text(&form.description).as_str()),
                    ("description_error", errors.html("description")),
                    ("date", res::attr(&form.date).as_str()),
                    ("date_error", errors.html("date")),
                    ("time", res::attr(&form.time).as_str()),
                    ("time_error", errors.html("time")),
                ])
            }
        };
        res::page("ルーム作成", &body)
    }
}

#[derive(Debug)]
pub(crate) enum Outcome {
    Redirect(String),
    View(CreateRoomView),
}

impl IntoResponse for Outcome {
    fn into_response(self) -> Response {
        match self {
            // 303 so the browser follows a POST with a GET
            Outcome::Redirect(to) => Redirect::to(&to).into_response(),
            Outcome::View(view) => Html(view.render()).into_response(),
        }
    }
}

/// Signed in and registered, or where to go instead.
async fn gate(backend: &dyn Backend, auth: AuthState) -> Result<(SessionUser, CurrentUser), Outcome> {
    let user = match auth.require(RETURN_TO) {
        Guard::Authenticated(user) => user,
        Guard::Redirect(to) => return Err(Outcome::Redirect(to)),
        Guard::Error(message) => return Err(Outcome::View(CreateRoomView::AuthError(message))),
    };

    match backend.current_user(&user.access_token).await {
        Ok(Some(current)) => Ok((user, current)),
        Ok(None) => Err(Outcome::Redirect(SIGNUP_PATH.to_owned())),
        Err(e) => {
            tracing::warn!(error = %e, sub = %user.sub, "could not load current user");
            Err(Outcome::View(CreateRoomView::Unavailable))
        }
    }
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn create_room_page(
    State(backend): State<Arc<dyn Backend>>,
    State(in_flight): State<InFlight>,
    auth: AuthState,
) -> Outcome {
    let (user, _) = match gate(backend.as_ref(), auth).await {
        Ok(gated) => gated,
        Err(outcome) => return outcome,
    };

    if in_flight.is_active(&user.sub) {
        return Outcome::View(CreateRoomView::Loading);
    }
    Outcome::View(CreateRoomView::blank())
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn create_room(
    State(backend): State<Arc<dyn Backend>>,
    State(in_flight): State<InFlight>,
    State(config): State<Arc<Config>>,
    auth: AuthState,
    Form(form): Form<RoomForm>,
) -> Outcome {
    let (user, current) = match gate(backend.as_ref(), auth).await {
        Ok(gated) => gated,
        Err(outcome) => return outcome,
    };

    let payload = match form.clone().into_payload(&current, config.date_style) {
        Ok(payload) => payload,
        Err(errors) => return Outcome::View(CreateRoomView::Form { form, errors, alert: None }),
    };

    let Some(_guard) = in_flight.begin(&user.sub) else {
        return Outcome::View(CreateRoomView::Loading);
    };

    match backend.create_room(&user.access_token, &payload).await {
        Ok(room) => {
            tracing::info!(room_id = %room.id, sub = %user.sub, "room created");
            Outcome::Redirect(format!("/room/{}", room.id))
        }
        Err(e) => {
            tracing::warn!(error = %e, sub = %user.sub, "room creation failed");
            Outcome::View(CreateRoomView::Form { form, errors: FieldErrors::default(), alert: Some(SUBMIT_FAILED) })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        api::{fake::FakeBackend, Id},
        config::test_config,
        form::INVALID_FIELD,
        session::alice,
    };

    fn form() -> RoomForm {
        RoomForm {
            room_name: "サークル飲み会".to_owned(),
            description: "駅前で集合".to_owned(),
            date: "2024-01-05".to_owned(),
            time: "18:30".to_owned(),
        }
    }

    async fn submit(backend: &Arc<FakeBackend>, in_flight: &InFlight, auth: AuthState, form: RoomForm) -> Outcome {
        let backend: Arc<dyn Backend> = backend.clone();
        create_room(
            State(backend),
            State(in_flight.clone()),
            State(Arc::new(test_config())),
            auth,
            Form(form),
        )
        .await
    }

    #[tokio::test]
    async fn valid_submission_posts_creator_as_sole_host_and_redirects() {
        let backend = Arc::new(FakeBackend::with_profile(Id::Number(3)));
        let outcome = submit(&backend, &InFlight::default(), AuthState::Authenticated(alice()), form()).await;

        assert!(matches!(outcome, Outcome::Redirect(ref to) if to == "/room/7"), "{outcome:?}");
        let created = backend.created();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].hosts, vec![Id::Number(3)]);
        assert_eq!(created[0].date, "2024-1-5");
        assert_eq!(created[0].datetime, "2024-1-5T18:30");
        assert_eq!(created[0].time, "18:30");
    }

    #[tokio::test]
    async fn overlong_or_empty_title_blocks_the_request() {
        let backend = Arc::new(FakeBackend::with_profile(Id::Number(3)));
        for room_name in ["".to_owned(), "a".repeat(65)] {
            let outcome = submit(
                &backend,
                &InFlight::default(),
                AuthState::Authenticated(alice()),
                RoomForm { room_name, ..form() },
            )
            .await;

            let Outcome::View(view) = outcome else { panic!("expected the form again") };
            let CreateRoomView::Form { errors, .. } = &view else { panic!("expected the form, got {view:?}") };
            assert!(errors.has("room_name"));
            assert!(!errors.has("description"));
            assert!(view.render().contains(INVALID_FIELD));
        }
        assert!(backend.created().is_empty());
    }

    #[tokio::test]
    async fn unparsable_date_is_a_field_error() {
        let backend = Arc::new(FakeBackend::with_profile(Id::Number(3)));
        let outcome = submit(
            &backend,
            &InFlight::default(),
            AuthState::Authenticated(alice()),
            RoomForm { date: "2024-02-30".to_owned(), ..form() },
        )
        .await;

        assert!(matches!(outcome, Outcome::View(CreateRoomView::Form { ref errors, .. }) if errors.has("date")));
        assert!(backend.created().is_empty());
    }

    #[tokio::test]
    async fn failed_creation_alerts_and_clears_loading() {
        let backend = Arc::new(FakeBackend { fail_writes: true, ..FakeBackend::with_profile(Id::Number(3)) });
        let in_flight = InFlight::default();
        let outcome = submit(&backend, &in_flight, AuthState::Authenticated(alice()), form()).await;

        let Outcome::View(view) = outcome else { panic!("expected a view") };
        assert!(matches!(view, CreateRoomView::Form { alert: Some(SUBMIT_FAILED), .. }));
        assert!(view.render().contains(SUBMIT_FAILED));
        assert!(view.render().contains("サークル飲み会"));
        assert!(!in_flight.is_active(&alice().sub));
        assert_eq!(backend.created().len(), 1);
    }

    #[tokio::test]
    async fn submission_while_another_is_in_flight_shows_loading() {
        let backend = Arc::new(FakeBackend::with_profile(Id::Number(3)));
        let in_flight = InFlight::default();
        let _pending = in_flight.begin(&alice().sub).unwrap();

        let outcome = submit(&backend, &in_flight, AuthState::Authenticated(alice()), form()).await;
        assert!(matches!(outcome, Outcome::View(CreateRoomView::Loading)));
        assert!(backend.created().is_empty());
    }

    #[tokio::test]
    async fn anonymous_users_go_to_login() {
        let backend = Arc::new(FakeBackend::with_profile(Id::Number(3)));
        let outcome = submit(&backend, &InFlight::default(), AuthState::Anonymous, form()).await;
        assert!(matches!(outcome, Outcome::Redirect(ref to) if to.starts_with("/api/auth/login?returnTo=")));
        assert!(backend.created().is_empty());
    }

    #[tokio::test]
    async fn unregistered_users_go_to_signup() {
        let backend = Arc::new(FakeBackend::default());
        let outcome = submit(&backend, &InFlight::default(), AuthState::Authenticated(alice()), form()).await;
        assert!(matches!(outcome, Outcome::Redirect(ref to) if to == "/signup"));
    }

    #[tokio::test]
    async fn auth_errors_are_shown_verbatim() {
        let backend: Arc<dyn Backend> = Arc::new(FakeBackend::default());
        let outcome = create_room_page(
            State(backend),
            State(InFlight::default()),
            AuthState::Failed("access_denied: <nope>".into()),
        )
        .await;

        let Outcome::View(view) = outcome else { panic!("expected a view") };
        assert!(view.render().contains("<pre>access_denied: &lt;nope&gt;</pre>"));
    }

    #[test]
    fn blank_form_has_no_errors_or_alert() {
        let html = CreateRoomView::blank().render();
        assert!(html.contains("<title>ルーム作成 | e-Shoku</title>"));
        assert!(!html.contains(INVALID_FIELD));
        assert!(!html.contains(SUBMIT_FAILED));
        assert!(CreateRoomView::Unavailable.render().contains(LOAD_FAILED));
    }
}
