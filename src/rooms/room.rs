use std::sync::Arc;

use axum::{
    debug_handler,
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
};

use crate::{
    api::{Backend, RoomData},
    include_res, res,
    session::{AuthState, Guard},
    AppResult, Markdown,
};

#[debug_handler(state = crate::AppState)]
pub(crate) async fn room(
    State(backend): State<Arc<dyn Backend>>,
    Path(room_id): Path<String>,
    auth: AuthState,
) -> AppResult<Response> {
    let user = match auth.require(&format!("/room/{room_id}")) {
        Guard::Authenticated(user) => user,
        Guard::Redirect(to) => return Ok(Redirect::to(&to).into_response()),
        Guard::Error(message) => {
            let body = format!("<h4>Error</h4><pre>{}</pre>", res::text(&message));
            return Ok(Html(res::page("ルーム", &body)).into_response());
        }
    };

    let Some(room) = backend.room(&user.access_token, &room_id).await? else {
        return res::sorry("room");
    };

    Ok(Html(render(&room)).into_response())
}

fn render(room: &RoomData) -> String {
    let title = room.room_name.as_deref().unwrap_or("ルーム");
    let description = Markdown(room.description.as_deref().unwrap_or_default()).to_html();
    let hosts: String = room.hosts.iter()
        .map(|host| format!("<li>{}</li>\n", res::text(&host.to_string())))
        .collect();

    let body = res::fill(include_res!(str, "/pages/rooms/room.html"), &[
        ("room_name", res::text(title).as_str()),
        ("datetime", res::text(room.datetime.as_deref().unwrap_or_default()).as_str()),
        ("description", description.as_str()),
        ("hosts", hosts.as_str()),
    ]);
    res::page(title, &body)
}
