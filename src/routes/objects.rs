//! Object CRUD routes, partitioned by class name.

use crate::handlers::objects::{
    handle_object_create, handle_object_delete, handle_object_fetch, handle_object_update,
    handle_objects_list,
};
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn object_routes(state: AppState) -> Router {
    Router::new()
        .route("/classes/:className", get(handle_objects_list).post(handle_object_create))
        .route(
            "/classes/:className/:objectId",
            get(handle_object_fetch)
                .patch(handle_object_update)
                .delete(handle_object_delete),
        )
        .with_state(state)
}
