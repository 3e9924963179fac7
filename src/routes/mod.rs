use axum::routing::{get, post, put};
use axum::Router;

use crate::config::{create_cors_layer, create_security_headers_layer};
use crate::handlers::{auth, bookings, events, health_check, users};
use crate::state::AppState;

pub fn create_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/auth", auth_routes())
        .nest("/api/events", event_routes())
        .nest("/api/bookings", booking_routes())
        .nest("/api/users", user_routes())
        .layer(create_security_headers_layer())
        .layer(create_cors_layer())
        .with_state(state)
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/profile", get(auth::get_profile).put(auth::update_profile))
        .route("/change-password", put(auth::change_password))
}

fn event_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(events::list_events).post(events::create_event))
        .route(
            "/:id",
            get(events::get_event)
                .put(events::update_event)
                .delete(events::delete_event),
        )
        .route("/my/created", get(events::my_events))
}

fn booking_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            post(bookings::create_booking).get(bookings::list_bookings),
        )
        .route("/my", get(bookings::my_bookings))
        .route("/:id", get(bookings::get_booking))
        .route("/:id/cancel", put(bookings::cancel_booking))
}

fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(users::list_users))
        .route("/:id", get(users::get_user).delete(users::delete_user))
        .route("/:id/role", put(users::update_user_role))
        .route("/:id/status", put(users::toggle_user_status))
}
