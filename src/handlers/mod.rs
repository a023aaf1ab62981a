//! HTTP handlers for objects, schemas, and users, plus the session middleware.

pub mod auth;
pub mod objects;
pub mod schemas;
pub mod users;
pub use auth::*;
pub use objects::*;
pub use schemas::*;
pub use users::*;

use crate::attributes::OBJECT_ID;
use crate::error::ProviderError;
use crate::response::{error_body, ErrorObject, JsonApi};
use crate::service::Violations;
use crate::store::{Record, ID_FIELD};
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;

/// `data.attributes` of a JSON:API request body; empty when absent.
fn body_attributes(body: Option<Json<Value>>) -> Record {
    let Some(Json(body)) = body else {
        return Record::new();
    };
    let mut attributes = match body.get("data").and_then(|d| d.get("attributes")) {
        Some(Value::Object(m)) => m.clone(),
        _ => Record::new(),
    };
    attributes.remove(OBJECT_ID);
    attributes.remove(ID_FIELD);
    attributes
}

/// Identifier of a provider record as a string.
fn record_id(record: &Record) -> Option<String> {
    match record.get(OBJECT_ID)? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn invalid(violations: Violations) -> JsonApi {
    error_body(StatusCode::BAD_REQUEST, violations.into_errors())
}

fn failure(err: &ProviderError, title: &str, parameter: &str) -> JsonApi {
    error_body(err.status(), vec![ErrorObject::for_parameter(title, parameter)])
}

fn with_cookie(reply: JsonApi, cookie: Option<HeaderValue>) -> Response {
    let mut response = reply.into_response();
    if let Some(cookie) = cookie {
        response.headers_mut().append(header::SET_COOKIE, cookie);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn body_attributes_reads_json_api_body() {
        let body = json!({"data": {"type": "object_Note", "attributes": {"title": "a", "objectId": "x", "_id": "y"}}});
        let attrs = body_attributes(Some(Json(body)));
        assert_eq!(Value::Object(attrs), json!({"title": "a"}));
        assert!(body_attributes(None).is_empty());
        assert!(body_attributes(Some(Json(json!({"data": []})))).is_empty());
    }

    #[test]
    fn record_id_stringifies() {
        let rec = json!({"objectId": "abc"}).as_object().cloned().unwrap();
        assert_eq!(record_id(&rec).as_deref(), Some("abc"));
        assert!(record_id(&Record::new()).is_none());
    }
}
