//! Account routes. `/users/me` and `/users/:id` share one handler; the
//! former falls back to the session's user.

use crate::handlers::users::{handle_user_fetch, handle_user_login, handle_user_logout, handle_user_sign_up};
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};

pub fn user_routes(state: AppState) -> Router {
    Router::new()
        .route("/users", post(handle_user_sign_up))
        .route("/users/login", get(handle_user_login).post(handle_user_login))
        .route("/users/logout", post(handle_user_logout))
        .route("/users/me", get(handle_user_fetch))
        .route("/users/:id", get(handle_user_fetch))
        .with_state(state)
}
