use crate::handlers::schemas::handle_schema_fetch;
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn schema_routes(state: AppState) -> Router {
    Router::new()
        .route("/schemas/:className", get(handle_schema_fetch))
        .with_state(state)
}
