//! Request validation shared by the handlers.

mod validation;
pub use validation::{Violations, REQUIRED_FIELD_MISSING};
