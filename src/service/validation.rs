//! Required-field checks. Violations accumulate in order so one response can
//! report every missing field at once.

use crate::response::ErrorObject;
use crate::store::Record;
use serde_json::Value;
use std::collections::HashMap;

pub const REQUIRED_FIELD_MISSING: &str = "required field is missing";

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Violations {
    errors: Vec<ErrorObject>,
}

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    /// A path or query parameter that must be present and non-empty.
    pub fn require_param<'a>(&mut self, params: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
        self.require_param_titled(params, name, REQUIRED_FIELD_MISSING)
    }

    pub fn require_param_titled<'a>(
        &mut self,
        params: &'a HashMap<String, String>,
        name: &str,
        title: &str,
    ) -> Option<&'a str> {
        match params.get(name).map(String::as_str) {
            Some(v) if !v.trim().is_empty() => Some(v),
            _ => {
                self.push(ErrorObject::for_parameter(title, name));
                None
            }
        }
    }

    /// An attribute that must be present; strings must also be non-empty.
    pub fn require_attribute<'a>(&mut self, attributes: &'a Record, name: &str) -> Option<&'a Value> {
        match attributes.get(name) {
            Some(Value::Null) | None => None,
            Some(Value::String(s)) if s.trim().is_empty() => None,
            Some(v) => Some(v),
        }
        .or_else(|| {
            self.push(ErrorObject::for_parameter(REQUIRED_FIELD_MISSING, name));
            None
        })
    }

    pub fn push(&mut self, error: ErrorObject) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_errors(self) -> Vec<ErrorObject> {
        self.errors
    }
}
