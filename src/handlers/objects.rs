//! Object handlers: list, create, fetch, update, soft delete.
//!
//! Each axum handler is a thin shell over a plain async function taking the
//! provider and the request parts it needs.

use super::{body_attributes, failure, invalid, record_id};
use crate::attributes::{prepare_attributes, OBJECT_ID};
use crate::error::ProviderError;
use crate::extractors::Session;
use crate::provider::{Criteria, FetchOptions, ObjectsDataProvider, CLASS_NAME, CREATED_AT, DELETED_AT};
use crate::response::{success_many, success_one, JsonApi, Resource};
use crate::service::Violations;
use crate::state::AppState;
use crate::store::Record;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;
use std::collections::HashMap;

pub const RESOURCE_TYPE_PREFIX: &str = "object_";
pub const MAX_PAGE_LIMIT: u64 = 1000;
/// Stamped by the provider on create and delete; a PATCH body cannot set them.
pub const PROTECTED_ATTRIBUTES: [&str; 3] = [CLASS_NAME, CREATED_AT, DELETED_AT];

pub fn object_resource_type(class_name: &str) -> String {
    format!("{}{}", RESOURCE_TYPE_PREFIX, class_name)
}

/// `filter[key]=value` pairs become equality criteria; keys carrying the `$`
/// operator sigil are dropped and `filter[objectId]` selects by id.
/// `page[offset]` / `page[limit]` window the result.
pub fn list_criteria(class_name: &str, query: &[(String, String)]) -> (Criteria, FetchOptions) {
    let mut criteria = Criteria::new();
    let mut options = FetchOptions::default();
    for (key, value) in query {
        if let Some(field) = bracketed(key, "filter") {
            if field.contains('$') {
                tracing::debug!(key = %field, "dropped filter key with operator sigil");
                continue;
            }
            if field == OBJECT_ID {
                criteria.object_id = Some(value.clone());
                continue;
            }
            criteria.fields.insert(field.to_string(), Value::String(value.clone()));
        } else if let Some(page) = bracketed(key, "page") {
            match page {
                "offset" => {
                    if let Ok(n) = value.parse() {
                        options.skip = n;
                    }
                }
                "limit" => {
                    if let Ok(n) = value.parse::<u64>() {
                        options.limit = n.min(MAX_PAGE_LIMIT);
                    }
                }
                _ => {}
            }
        }
    }
    criteria.fields.remove(CLASS_NAME);
    criteria.class_name = Some(class_name.to_string());
    (criteria, options)
}

fn bracketed<'a>(key: &'a str, prefix: &str) -> Option<&'a str> {
    key.strip_prefix(prefix)?
        .strip_prefix('[')?
        .strip_suffix(']')
        .filter(|inner| !inner.is_empty())
}

pub async fn objects_list(
    provider: &ObjectsDataProvider,
    params: &HashMap<String, String>,
    query: &[(String, String)],
) -> JsonApi {
    tracing::debug!(params = ?params, "objects_list");
    let mut violations = Violations::new();
    let class_name = violations.require_param(params, "className");
    let Some(class_name) = class_name else {
        return invalid(violations);
    };
    let (criteria, options) = list_criteria(class_name, query);
    match provider.fetch_objects(criteria, options).await {
        Ok(found) => {
            let kind = object_resource_type(class_name);
            success_many(
                found
                    .iter()
                    .map(|record| {
                        let mut resource = Resource::new(kind.clone()).with_attributes(prepare_attributes(record));
                        resource.id = record_id(record);
                        resource
                    })
                    .collect(),
            )
        }
        Err(e) => failure(&e, "could not fetch objects", "className"),
    }
}

pub async fn object_create(
    provider: &ObjectsDataProvider,
    params: &HashMap<String, String>,
    session_user: Option<&str>,
    attributes: Record,
) -> JsonApi {
    tracing::debug!(params = ?params, "object_create");
    let mut violations = Violations::new();
    let class_name = violations.require_param(params, "className");
    let Some(class_name) = class_name else {
        return invalid(violations);
    };
    let mut data = attributes;
    if let Some(user_id) = session_user {
        data.insert("createdBy".to_string(), Value::String(user_id.to_string()));
    }
    match provider.create_object(class_name, data).await {
        Ok(created) => {
            let mut reply = success_one(
                Resource::new(object_resource_type(class_name))
                    .with_id(created.object_id.clone())
                    .with_attributes(prepare_attributes(&created.to_record())),
            );
            reply.status = StatusCode::CREATED;
            reply
        }
        Err(e) => failure(&e, "could not create object", "objectId"),
    }
}

pub async fn object_fetch(provider: &ObjectsDataProvider, params: &HashMap<String, String>) -> JsonApi {
    tracing::debug!(params = ?params, "object_fetch");
    let mut violations = Violations::new();
    let class_name = violations.require_param(params, "className");
    let object_id = violations.require_param(params, "objectId");
    let (Some(class_name), Some(object_id)) = (class_name, object_id) else {
        return invalid(violations);
    };
    match provider.fetch_object(class_name, object_id).await {
        Ok(record) => success_one(
            Resource::new(object_resource_type(class_name))
                .with_id(record_id(&record).unwrap_or_else(|| object_id.to_string()))
                .with_attributes(prepare_attributes(&record)),
        ),
        Err(ProviderError::NotFound) => failure(&ProviderError::NotFound, "entry is not found", "objectId"),
        Err(e) => failure(&e, "could not fetch object", "objectId"),
    }
}

pub async fn object_update(
    provider: &ObjectsDataProvider,
    params: &HashMap<String, String>,
    attributes: Record,
) -> JsonApi {
    tracing::debug!(params = ?params, "object_update");
    let mut violations = Violations::new();
    let class_name = violations.require_param(params, "className");
    let object_id = violations.require_param(params, "objectId");
    let (Some(class_name), Some(object_id)) = (class_name, object_id) else {
        return invalid(violations);
    };
    let mut changes = attributes;
    for key in PROTECTED_ATTRIBUTES {
        if changes.remove(key).is_some() {
            tracing::debug!(key = %key, "dropped protected attribute from update");
        }
    }
    match provider
        .update_object(Criteria::class(class_name).with_object_id(object_id), changes)
        .await
    {
        Ok(updated) => success_one(
            Resource::new(object_resource_type(class_name))
                .with_id(object_id)
                .with_attributes(prepare_attributes(&updated.to_record())),
        ),
        Err(e) => failure(&e, "could not update object", "objectId"),
    }
}

pub async fn object_delete(provider: &ObjectsDataProvider, params: &HashMap<String, String>) -> JsonApi {
    tracing::debug!(params = ?params, "object_delete");
    let mut violations = Violations::new();
    let class_name = violations.require_param(params, "className");
    let object_id = violations.require_param(params, "objectId");
    let (Some(class_name), Some(object_id)) = (class_name, object_id) else {
        return invalid(violations);
    };
    match provider.delete_object(class_name, object_id).await {
        Ok(deleted) => success_one(
            Resource::new(object_resource_type(class_name)).with_attributes(prepare_attributes(&deleted.to_record())),
        ),
        Err(e) => failure(&e, "could not delete object", "objectId"),
    }
}

/// GET /classes/:className
pub async fn handle_objects_list(
    State(state): State<AppState>,
    Path(params): Path<HashMap<String, String>>,
    Query(query): Query<Vec<(String, String)>>,
) -> JsonApi {
    objects_list(&state.objects, &params, &query).await
}

/// POST /classes/:className
pub async fn handle_object_create(
    State(state): State<AppState>,
    session: Session,
    Path(params): Path<HashMap<String, String>>,
    body: Option<Json<Value>>,
) -> JsonApi {
    object_create(&state.objects, &params, session.user_id(), body_attributes(body)).await
}

/// GET /classes/:className/:objectId
pub async fn handle_object_fetch(
    State(state): State<AppState>,
    Path(params): Path<HashMap<String, String>>,
) -> JsonApi {
    object_fetch(&state.objects, &params).await
}

/// PATCH /classes/:className/:objectId
pub async fn handle_object_update(
    State(state): State<AppState>,
    Path(params): Path<HashMap<String, String>>,
    body: Option<Json<Value>>,
) -> JsonApi {
    object_update(&state.objects, &params, body_attributes(body)).await
}

/// DELETE /classes/:className/:objectId
pub async fn handle_object_delete(
    State(state): State<AppState>,
    Path(params): Path<HashMap<String, String>>,
) -> JsonApi {
    object_delete(&state.objects, &params).await
}
