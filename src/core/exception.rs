//! Turning action failures into client responses

use serde_json::{Value, json};

use crate::core::error::{AdminError, AdminResult};
use crate::core::operation::Operation;

/// Converts a failure raised during an action into a response
///
/// Returning `Err` hands the error back to the caller: the handler could not
/// classify it and it propagates out of the action.
pub trait ExceptionHandler: Send + Sync {
    fn create_response(&self, error: AdminError, operation: Operation) -> AdminResult<Value>;
}

/// Default handler
///
/// Persistence failures become `{"success": false, ...}` responses. Bad
/// requests, configuration, hydration, access and internal errors propagate.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultExceptionHandler;

impl ExceptionHandler for DefaultExceptionHandler {
    fn create_response(&self, error: AdminError, operation: Operation) -> AdminResult<Value> {
        match error {
            AdminError::Persistence(e) => {
                tracing::error!(
                    operation = %operation,
                    error_code = e.error_code(),
                    "Persistence failure: {}",
                    e
                );
                Ok(json!({
                    "success": false,
                    "operation": operation.as_str(),
                    "error_code": e.error_code(),
                    "message": e.to_string(),
                }))
            }
            other => Err(other),
        }
    }
}
