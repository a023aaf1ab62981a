//! JSON:API envelope types: `{data: ...}` on success, `{errors: [...]}` otherwise.

use crate::store::Record;
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

pub const JSON_API_CONTENT_TYPE: &str = "application/vnd.api+json";

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Resource {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Record>,
}

impl Resource {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: None,
            attributes: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_attributes(mut self, attributes: Record) -> Self {
        self.attributes = Some(attributes);
        self
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum PrimaryData {
    One(Resource),
    Many(Vec<Resource>),
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ErrorSource {
    pub parameter: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ErrorObject {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<ErrorSource>,
}

impl ErrorObject {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            source: None,
        }
    }

    pub fn for_parameter(title: impl Into<String>, parameter: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            source: Some(ErrorSource {
                parameter: parameter.into(),
            }),
        }
    }
}

/// Top-level document. Serializes as `{"data": ...}` or `{"errors": [...]}`.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Document {
    Data(PrimaryData),
    Errors(Vec<ErrorObject>),
}

/// A JSON:API document paired with its status code.
#[derive(Debug, Clone)]
pub struct JsonApi {
    pub status: StatusCode,
    pub document: Document,
}

impl JsonApi {
    pub fn new(status: StatusCode, document: Document) -> Self {
        Self { status, document }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.document, Document::Data(_))
    }
}

impl IntoResponse for JsonApi {
    fn into_response(self) -> Response {
        let mut response = (self.status, Json(self.document)).into_response();
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(JSON_API_CONTENT_TYPE),
        );
        response
    }
}

pub fn success_one(resource: Resource) -> JsonApi {
    JsonApi::new(StatusCode::OK, Document::Data(PrimaryData::One(resource)))
}

pub fn success_many(resources: Vec<Resource>) -> JsonApi {
    JsonApi::new(StatusCode::OK, Document::Data(PrimaryData::Many(resources)))
}

pub fn success_many_created(resources: Vec<Resource>) -> JsonApi {
    JsonApi::new(StatusCode::CREATED, Document::Data(PrimaryData::Many(resources)))
}

pub fn error_body(status: StatusCode, errors: Vec<ErrorObject>) -> JsonApi {
    JsonApi::new(status, Document::Errors(errors))
}
