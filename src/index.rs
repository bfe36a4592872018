use axum::{debug_handler, response::Html};

use crate::{include_res, res, session::{AuthState, LOGIN_PATH}};

#[debug_handler]
pub async fn index(auth: AuthState) -> Html<String> {
    let (greeting, session_link) = match auth {
        AuthState::Authenticated(user) => (
            format!("ようこそ、{}さん", res::text(&user.name)),
            r#"<a href="/api/auth/logout">ログアウト</a>"#.to_owned(),
        ),
        AuthState::Anonymous => (
            "ログインしてください".to_owned(),
            format!(r#"<a href="{LOGIN_PATH}">ログイン</a>"#),
        ),
        AuthState::Failed(message) => (
            format!("<pre>{}</pre>", res::text(&message)),
            format!(r#"<a href="{LOGIN_PATH}">ログイン</a>"#),
        ),
    };

    let body = res::fill(include_res!(str, "/pages/index.html"), &[
        ("greeting", greeting.as_str()),
        ("session_link", session_link.as_str()),
    ]);
    Html(res::page("ホーム", &body))
}
