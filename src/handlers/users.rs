//! Sign-up, login, profile fetch, and logout.

use super::{body_attributes, failure, invalid, record_id, with_cookie};
use crate::attributes::{iso_from_millis, prepare_attributes};
use crate::error::ProviderError;
use crate::extractors::Session;
use crate::provider::{Criteria, UsersDataProvider, PASSWORD};
use crate::response::{error_body, success_many_created, success_one, ErrorObject, JsonApi, Resource};
use crate::service::Violations;
use crate::state::{AppState, SignUpConfig};
use crate::store::Record;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderValue, StatusCode},
    response::Response,
    Json,
};
use serde_json::Value;
use std::collections::HashMap;

pub const USER_RESOURCE_TYPE: &str = "users";

/// Stored user fields safe to send back: no password, no identifier.
fn public_attributes(user: &Record) -> Record {
    let mut attributes = user.clone();
    attributes.remove(PASSWORD);
    prepare_attributes(&attributes)
}

pub async fn user_sign_up(
    provider: &UsersDataProvider,
    config: &SignUpConfig,
    session: &mut Session,
    attributes: Record,
) -> (JsonApi, Option<HeaderValue>) {
    let mut violations = Violations::new();
    violations.require_attribute(&attributes, &config.login_field);
    violations.require_attribute(&attributes, PASSWORD);
    if !violations.is_empty() {
        return (invalid(violations), None);
    }

    match provider.insert(attributes).await {
        Ok(created) => {
            tracing::debug!(object_id = %created.object_id, "created new user by user_sign_up");
            let cookie = if config.login_if_success {
                session.login(created.object_id.clone())
            } else {
                None
            };
            let mut attributes = Record::new();
            if let Some(created_at) = iso_from_millis(created.created_at) {
                attributes.insert("created_at".to_string(), Value::String(created_at));
            }
            let reply = success_many_created(vec![Resource::new(USER_RESOURCE_TYPE)
                .with_id(created.object_id)
                .with_attributes(attributes)]);
            (reply, cookie)
        }
        Err(e @ ProviderError::Conflict(_)) => {
            (failure(&e, "The user is already existing", &config.login_field), None)
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to create new user by user_sign_up");
            (failure(&e, "could not create user", &config.login_field), None)
        }
    }
}

pub async fn user_login(
    provider: &UsersDataProvider,
    login_field: &str,
    session: &mut Session,
    query: &HashMap<String, String>,
) -> (JsonApi, Option<HeaderValue>) {
    let mut violations = Violations::new();
    let login = violations.require_param_titled(query, login_field, "Please fill out this field");
    let password = violations.require_param_titled(query, PASSWORD, "Please fill out this field");
    let (Some(login), Some(password)) = (login, password) else {
        return (invalid(violations), None);
    };

    let criteria = Criteria::new()
        .with_field(login_field, login)
        .with_field(PASSWORD, password);
    match provider.find_one(criteria).await {
        Ok(user) => {
            let Some(user_id) = record_id(&user) else {
                tracing::error!("found user has no objectId");
                return (
                    error_body(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        vec![ErrorObject::for_parameter("Invalid login or password", login_field)],
                    ),
                    None,
                );
            };
            let cookie = session.login(user_id.clone());
            let reply = success_one(
                Resource::new(USER_RESOURCE_TYPE)
                    .with_id(user_id)
                    .with_attributes(public_attributes(&user)),
            );
            (reply, cookie)
        }
        Err(ProviderError::NotFound | ProviderError::InvalidId(_)) => (
            error_body(
                StatusCode::UNAUTHORIZED,
                vec![ErrorObject::for_parameter("Invalid login or password", login_field)],
            ),
            None,
        ),
        Err(e) => (failure(&e, "Invalid login or password", login_field), None),
    }
}

/// Fetch the user named by `user_id`, or the session's user when absent.
pub async fn user_fetch(provider: &UsersDataProvider, user_id: Option<&str>, session: &Session) -> JsonApi {
    let Some(user_id) = user_id.filter(|id| !id.is_empty()).or(session.user_id()) else {
        return error_body(
            StatusCode::UNAUTHORIZED,
            vec![ErrorObject::new("The user is not logged in")],
        );
    };
    match provider.find_one(Criteria::new().with_object_id(user_id)).await {
        Ok(user) => success_one(
            Resource::new(USER_RESOURCE_TYPE)
                .with_id(record_id(&user).unwrap_or_else(|| user_id.to_string()))
                .with_attributes(public_attributes(&user)),
        ),
        Err(ProviderError::Store(e)) => {
            tracing::error!(user_id = %user_id, error = %e, "could not fetch user");
            error_body(
                StatusCode::INTERNAL_SERVER_ERROR,
                vec![ErrorObject::new("The user is not found")],
            )
        }
        Err(_) => error_body(StatusCode::NOT_FOUND, vec![ErrorObject::new("The user is not found")]),
    }
}

pub fn user_logout(session: &mut Session) -> (JsonApi, Option<HeaderValue>) {
    if !session.is_logged_in() {
        return (
            error_body(
                StatusCode::UNAUTHORIZED,
                vec![ErrorObject::new("The user is not logged in yet")],
            ),
            None,
        );
    }
    let (user_id, cookie) = session.logout();
    let mut resource = Resource::new(USER_RESOURCE_TYPE);
    resource.id = user_id;
    (success_one(resource), cookie)
}

/// POST /users
pub async fn handle_user_sign_up(
    State(state): State<AppState>,
    mut session: Session,
    body: Option<Json<Value>>,
) -> Response {
    let (reply, cookie) = user_sign_up(&state.users, &state.sign_up, &mut session, body_attributes(body)).await;
    with_cookie(reply, cookie)
}

/// GET or POST /users/login?<loginField>=..&password=..
pub async fn handle_user_login(
    State(state): State<AppState>,
    mut session: Session,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let (reply, cookie) = user_login(&state.users, &state.sign_up.login_field, &mut session, &query).await;
    with_cookie(reply, cookie)
}

/// GET /users/me and GET /users/:id
pub async fn handle_user_fetch(
    State(state): State<AppState>,
    session: Session,
    params: Option<Path<HashMap<String, String>>>,
) -> JsonApi {
    let user_id = params.as_ref().and_then(|Path(p)| p.get("id")).map(String::as_str);
    user_fetch(&state.users, user_id, &session).await
}

/// POST /users/logout
pub async fn handle_user_logout(mut session: Session) -> Response {
    let (reply, cookie) = user_logout(&mut session);
    with_cookie(reply, cookie)
}
