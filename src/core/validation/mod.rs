//! Validation of mapped entities
//!
//! Validation failures are an expected outcome, not an error: validators
//! return a [`ValidationResult`] and the controller answers with
//! `{"success": false, ...}` when it holds errors.

pub mod entity_validator;
pub mod result;

pub use entity_validator::{EntityValidator, StandardEntityValidator};
pub use result::ValidationResult;
