pub mod common;
pub mod objects;
pub mod schemas;
pub mod users;

pub use common::common_routes;
pub use objects::object_routes;
pub use schemas::schema_routes;
pub use users::user_routes;

use crate::state::AppState;
use axum::Router;

/// Every route this crate serves, merged into one router.
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .merge(common_routes(state.clone()))
        .merge(object_routes(state.clone()))
        .merge(schema_routes(state.clone()))
        .merge(user_routes(state))
}
