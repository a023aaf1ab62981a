//! BaaS SDK: JSON:API objects, schemas, and users over a document store.

pub mod attributes;
pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod migration;
pub mod password;
pub mod provider;
pub mod response;
pub mod routes;
pub mod service;
pub mod session;
pub mod state;
pub mod store;

pub use attributes::prepare_attributes;
pub use config::{load_object_cache, load_schema_cache, ServerConfig};
pub use error::{AppError, ConfigError, ProviderError, ProviderResult, StoreError};
pub use handlers::{user_auth_required, user_fetched, AuthGuard, CurrentUser};
pub use migration::{apply_migrations, ensure_database_exists};
pub use provider::{Criteria, FetchOptions, ObjectsDataProvider, SchemasDataProvider, UsersDataProvider};
pub use response::{error_body, success_many, success_one};
pub use routes::{api_routes, common_routes, object_routes, schema_routes, user_routes};
pub use session::SessionStore;
pub use state::{AppState, SignUpConfig};
pub use store::{DocumentCollection, MemoryCollection, PgCollection};
