use std::sync::Arc;

use axum::{debug_handler, extract::State, response::Html, Form};
use serde::Deserialize;

use crate::{
    api::{Backend, Gender, NewUser},
    config::Config,
    form::{normalize_date, DateStyle, FieldErrors, Rule},
    include_res, res,
    session::{AuthState, SessionUser, LOGIN_PATH},
};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct SignUpForm {
    pub(crate) username: String,
    /// Ignored; the session's name is always sent.
    pub(crate) display_name: String,
    pub(crate) date_of_birth: String,
    pub(crate) gender: String,
}

impl SignUpForm {
    fn into_payload(self, user: &SessionUser, style: DateStyle) -> Result<NewUser, FieldErrors> {
        let mut errors = FieldErrors::default();
        errors.check("username", Rule::required().min(2).max(128), &self.username);

        let date_of_birth = normalize_date(&self.date_of_birth, style);
        if date_of_birth.is_none() {
            errors.add("date_of_birth");
        }
        let gender = Gender::from_code(&self.gender);
        if gender.is_none() {
            errors.add("gender");
        }

        match (date_of_birth, gender) {
            (Some(date_of_birth), Some(gender)) if errors.is_empty() => Ok(NewUser {
                username: self.username,
                display_name: user.name.clone(),
                date_of_birth,
                gender,
            }),
            _ => Err(errors),
        }
    }
}

#[derive(Debug)]
pub(crate) enum SignUpView {
    AuthError(String),
    Form {
        user: SessionUser,
        form: SignUpForm,
        errors: FieldErrors,
    },
    Login,
}

impl SignUpView {
    fn from_auth(auth: AuthState, form: SignUpForm) -> Self {
        match auth {
            AuthState::Authenticated(user) => SignUpView::Form { user, form, errors: FieldErrors::default() },
            AuthState::Anonymous => SignUpView::Login,
            AuthState::Failed(message) => SignUpView::AuthError(message),
        }
    }

    pub(crate) fn render(&self) -> String {
        let body = match self {
            SignUpView::AuthError(message) => {
                format!("<h2>サインアップ</h2><h4>Error</h4><pre>{}</pre>", res::text(message))
            }
            SignUpView::Login => format!(r#"<h2>サインアップ</h2><div><a href="{LOGIN_PATH}">Login</a></div>"#),
            SignUpView::Form { user, form, errors } => {
                let gender_options: String = Gender::ALL.iter()
                    .map(|g| {
                        let selected = if g.code() == form.gender { " selected" } else { "" };
                        format!("                    <option value=\"{}\"{selected}>{}</option>\n", g.code(), g.label())
                    })
                    .collect();
                res::fill(include_res!(str, "/pages/users/signup.html"), &[
                    ("display_name", res::attr(&user.name).as_str()),
                    ("email", res::attr(&user.email).as_str()),
                    ("username", res::attr(&form.username).as_str()),
                    ("username_error", errors.html("username")),
                    ("date_of_birth", res::attr(&form.date_of_birth).as_str()),
                    ("date_of_birth_error", errors.html("date_of_birth")),
                    ("gender_options", gender_options.as_str()),
                    ("gender_error", errors.html("gender")),
                ])
            }
        };
        res::page("サインアップ", &body)
    }
}

#[debug_handler]
pub(crate) async fn signup_page(auth: AuthState) -> Html<String> {
    Html(SignUpView::from_auth(auth, SignUpForm::default()).render())
}

/// Registers the profile. The backend's answer is only logged; the form is
/// shown again either way.
#[debug_handler(state = crate::AppState)]
pub(crate) async fn signup(
    State(backend): State<Arc<dyn Backend>>,
    State(config): State<Arc<Config>>,
    auth: AuthState,
    Form(form): Form<SignUpForm>,
) -> Html<String> {
    let view = match SignUpView::from_auth(auth, form) {
        SignUpView::Form { user, form, .. } => match form.clone().into_payload(&user, config.date_style) {
            Ok(payload) => {
                match backend.register_user(&user.access_token, &payload).await {
                    Ok(response) => tracing::info!(sub = %user.sub, %response, "user registered"),
                    Err(e) => tracing::warn!(error = %e, sub = %user.sub, "user registration failed"),
                }
                SignUpView::Form { user, form, errors: FieldErrors::default() }
            }
            Err(errors) => SignUpView::Form { user, form, errors },
        },
        other => other,
    };
    Html(view.render())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        api::fake::FakeBackend,
        config::test_config,
        form::INVALID_FIELD,
        session::alice,
    };

    fn form() -> SignUpForm {
        SignUpForm {
            username: "alice_w".to_owned(),
            display_name: "Mallory".to_owned(),
            date_of_birth: "2000-12-31".to_owned(),
            gender: "PNTS".to_owned(),
        }
    }

    async fn submit(backend: &Arc<FakeBackend>, auth: AuthState, form: SignUpForm) -> String {
        let backend: Arc<dyn Backend> = backend.clone();
        signup(State(backend), State(Arc::new(test_config())), auth, Form(form)).await.0
    }

    #[tokio::test]
    async fn session_name_is_shown_read_only() {
        let Html(html) = signup_page(AuthState::Authenticated(alice())).await;
        assert!(html.contains(r#"id="staticDisplayName" value="Alice" readonly"#));
        assert!(html.contains(r#"value="alice@example.com" readonly"#));
    }

    #[tokio::test]
    async fn display_name_always_comes_from_the_session() {
        let backend = Arc::new(FakeBackend::default());
        submit(&backend, AuthState::Authenticated(alice()), form()).await;

        let registered = backend.registered();
        assert_eq!(registered.len(), 1);
        assert_eq!(registered[0].display_name, "Alice");
        assert_eq!(registered[0].date_of_birth, "2000-12-31");
        assert_eq!(registered[0].gender, Gender::Pnts);
        assert_eq!(registered[0].username, "alice_w");
    }

    #[tokio::test]
    async fn date_of_birth_is_normalized() {
        let backend = Arc::new(FakeBackend::default());
        submit(
            &backend,
            AuthState::Authenticated(alice()),
            SignUpForm { date_of_birth: "1999-04-07".to_owned(), ..form() },
        )
        .await;
        assert_eq!(backend.registered()[0].date_of_birth, "1999-4-7");
    }

    #[tokio::test]
    async fn invalid_fields_block_registration() {
        let backend = Arc::new(FakeBackend::default());
        let html = submit(
            &backend,
            AuthState::Authenticated(alice()),
            SignUpForm { username: "a".to_owned(), gender: "".to_owned(), ..form() },
        )
        .await;

        assert_eq!(html.matches(INVALID_FIELD).count(), 2);
        assert!(backend.registered().is_empty());
    }

    #[tokio::test]
    async fn failed_registration_only_logs() {
        let backend = Arc::new(FakeBackend { fail_writes: true, ..Default::default() });
        let html = submit(&backend, AuthState::Authenticated(alice()), form()).await;

        assert_eq!(backend.registered().len(), 1);
        assert!(html.contains(r#"value="alice_w""#));
        assert!(!html.contains(INVALID_FIELD));
    }

    #[tokio::test]
    async fn anonymous_visitors_get_a_login_link() {
        let Html(html) = signup_page(AuthState::Anonymous).await;
        assert!(html.contains(r#"<a href="/api/auth/login">Login</a>"#));

        let backend = Arc::new(FakeBackend::default());
        let html = submit(&backend, AuthState::Anonymous, form()).await;
        assert!(html.contains("Login"));
        assert!(backend.registered().is_empty());
    }

    #[tokio::test]
    async fn auth_errors_are_shown_verbatim() {
        let Html(html) = signup_page(AuthState::Failed("login_required".into())).await;
        assert!(html.contains("<pre>login_required</pre>"));
    }
}
