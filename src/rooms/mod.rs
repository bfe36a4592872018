mod in_flight;
mod new;
mod room;

use axum::{routing::get, Router};

pub use in_flight::{InFlight, InFlightGuard};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create", get(new::create_room_page).post(new::create_room))
        .route("/{id}", get(room::room))
}
