use super::{failure, invalid};
use crate::attributes::prepare_attributes;
use crate::error::ProviderError;
use crate::provider::SchemasDataProvider;
use crate::response::{success_one, JsonApi, Resource};
use crate::service::Violations;
use crate::state::AppState;
use axum::extract::{Path, State};
use std::collections::HashMap;

pub const SCHEMA_RESOURCE_TYPE: &str = "schema";

pub async fn schema_fetch(provider: &SchemasDataProvider, params: &HashMap<String, String>) -> JsonApi {
    tracing::debug!(params = ?params, "schema_fetch");
    let mut violations = Violations::new();
    let Some(class_name) = violations.require_param(params, "className") else {
        return invalid(violations);
    };
    match provider.fetch_object(class_name).await {
        Ok(record) => success_one(
            Resource::new(SCHEMA_RESOURCE_TYPE)
                .with_id(class_name)
                .with_attributes(prepare_attributes(&record)),
        ),
        Err(ProviderError::NotFound) => failure(&ProviderError::NotFound, "entry is not found", "className"),
        Err(e) => failure(&e, "could not fetch schema", "className"),
    }
}

/// GET /schemas/:className
pub async fn handle_schema_fetch(
    State(state): State<AppState>,
    Path(params): Path<HashMap<String, String>>,
) -> JsonApi {
    schema_fetch(&state.schemas, &params).await
}
