//! Example server: reads config from the environment, provisions the document
//! tables, seeds the caches, and serves the object, schema, and user routes.
//! `/users/me` sits behind the auth guard and the current-user loader.

use axum::{middleware, routing::get, Extension, Json, Router};
use baas_sdk::{
    api_routes, apply_migrations, ensure_database_exists, load_object_cache, load_schema_cache,
    user_auth_required, user_fetched, AppState, AuthGuard, CurrentUser, ObjectsDataProvider,
    PgCollection, SchemasDataProvider, ServerConfig, SessionStore, SignUpConfig, UsersDataProvider,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("baas_sdk=info".parse()?))
        .init();

    let config = ServerConfig::from_env()?;
    ensure_database_exists(&config.store.database_url).await?;
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(config.store.max_connections)
        .connect(&config.store.database_url)
        .await?;
    apply_migrations(&pool, &config.store, &config.auth.login_field).await?;

    let store = &config.store;
    let objects = ObjectsDataProvider::new(Arc::new(PgCollection::new(pool.clone(), &store.schema, &store.objects_table)))
        .with_cache(load_object_cache(config.cache.objects_seed.as_deref()).await?);
    let schemas = SchemasDataProvider::new(Arc::new(PgCollection::new(pool.clone(), &store.schema, &store.schemas_table)))
        .with_cache(load_schema_cache(config.cache.schemas_seed.as_deref()).await?);
    let users = UsersDataProvider::new(Arc::new(PgCollection::new(pool, &store.schema, &store.users_table)))
        .with_cost(config.auth.bcrypt_cost)
        .with_unique_field(config.auth.login_field.clone());
    let sessions = Arc::new(SessionStore::new(config.auth.session_cookie.clone()).with_ttl(config.auth.session_ttl));

    let state = AppState {
        objects: Arc::new(objects),
        schemas: Arc::new(schemas),
        users: Arc::new(users),
        sessions: sessions.clone(),
        sign_up: SignUpConfig::from(&config.auth),
    };

    let mut guard = AuthGuard::new(sessions);
    if let Some(url) = &config.auth.login_url {
        guard = guard.with_login_url(url.clone());
    }
    let account = Router::new()
        .route(
            "/account",
            get(|Extension(me): Extension<CurrentUser>| async move { Json(me.0) }),
        )
        .layer(middleware::from_fn_with_state(state.clone(), user_fetched))
        .layer(middleware::from_fn_with_state(guard, user_auth_required));

    let app = Router::new()
        .merge(api_routes(state))
        .merge(account)
        .layer(RequestBodyLimitLayer::new(1024 * 1024))
        .layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
