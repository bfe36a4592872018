use axum::{
    debug_handler,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
};
use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::AppResult;

#[macro_export]
macro_rules! include_res {
    (str, $p:expr) => {
        include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/res", $p))
    };
}

#[debug_handler]
pub async fn stylesheet() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/css")], include_res!(str, "/style.css"))
}

/// Substitutes `{key}` placeholders in one pass, so filled-in values are
/// never scanned again. Unknown placeholders are left as they are.
pub fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let value = tail.find('}').and_then(|end| {
            let key = &tail[1..end];
            values.iter().find(|(k, _)| *k == key).map(|(_, v)| (*v, end))
        });
        match value {
            Some((value, end)) => {
                out.push_str(value);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Wraps `body` in the site layout.
pub fn page(title: &str, body: &str) -> String {
    fill(include_res!(str, "/pages/layout.html"), &[("title", text(title).as_str()), ("body", body)])
}

pub fn sorry(what: &str) -> AppResult<Response> {
    let body = fill(include_res!(str, "/pages/sorry.html"), &[("what", text(what).as_str())]);
    Ok((StatusCode::NOT_FOUND, Html(page("見つかりません", &body))).into_response())
}

/// Escapes a value for element content.
pub fn text(value: &str) -> String {
    encode_text(value).into_owned()
}

/// Escapes a value for a double-quoted attribute.
pub fn attr(value: &str) -> String {
    encode_double_quoted_attribute(value).into_owned()
}
