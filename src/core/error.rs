//! Typed error handling for admin controllers
//!
//! Every action of a [`CrudController`](crate::controller::CrudController)
//! returns an [`AdminResult`]. The error side is split into categories so
//! that exception handlers and HTTP exposures can classify failures instead
//! of dealing with an opaque error type.
//!
//! # Error Categories
//!
//! - [`BadRequestError`]: malformed or missing request input, located by a
//!   JSON pointer (`/record`, `/filter`, `/hydration/profile`, ...)
//! - [`ConfigError`]: controller configuration problems (programmer errors)
//! - [`HydrationError`]: failures while turning entities into client data
//! - [`PersistenceError`]: failures reported by the persistence backend
//! - [`RequestError`]: routing problems in the remote action surface
//!
//! Validation failures are not errors: they are returned as
//! `{"success": false, ...}` responses by the controller.
//!
//! # Example
//!
//! ```rust,ignore
//! match controller.get_action(&params) {
//!     Ok(response) => println!("{}", response),
//!     Err(AdminError::BadRequest(e)) => {
//!         eprintln!("bad input at {}: {}", e.path(), e.message());
//!     }
//!     Err(e) => eprintln!("Other error: {}", e),
//! }
//! ```

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::Value;
use std::fmt;

use crate::hydration::HydrationError;

/// The main error type for admin controllers
#[derive(Debug)]
pub enum AdminError {
    /// Malformed or missing request input
    BadRequest(BadRequestError),

    /// Configuration errors
    Config(ConfigError),

    /// Hydration errors
    Hydration(HydrationError),

    /// Persistence backend errors
    Persistence(PersistenceError),

    /// Remote routing errors (unknown controller, unknown action, bad body)
    Request(RequestError),

    /// The configured access check rejected the operation
    AccessDenied { operation: String, message: String },

    /// Internal errors (should not happen in normal operation)
    Internal(String),
}

impl fmt::Display for AdminError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdminError::BadRequest(e) => write!(f, "{}", e),
            AdminError::Config(e) => write!(f, "{}", e),
            AdminError::Hydration(e) => write!(f, "{}", e),
            AdminError::Persistence(e) => write!(f, "{}", e),
            AdminError::Request(e) => write!(f, "{}", e),
            AdminError::AccessDenied { operation, message } => {
                write!(f, "Access denied for '{}': {}", operation, message)
            }
            AdminError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AdminError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AdminError::BadRequest(e) => Some(e),
            AdminError::Config(e) => Some(e),
            AdminError::Hydration(e) => Some(e),
            AdminError::Persistence(e) => Some(e),
            AdminError::Request(e) => Some(e),
            AdminError::AccessDenied { .. } | AdminError::Internal(_) => None,
        }
    }
}

/// Error response body for HTTP responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Always `false`, mirrors the success flag of regular responses
    pub success: bool,
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// JSON pointer to the offending input, for bad requests
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl AdminError {
    /// Shortcut for a bad request located at `path`
    pub fn bad_request(message: impl Into<String>, path: &str, params: &Value) -> Self {
        AdminError::BadRequest(
            BadRequestError::new(message)
                .with_path(path)
                .with_params(params),
        )
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AdminError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AdminError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AdminError::Hydration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AdminError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AdminError::Request(e) => e.status_code(),
            AdminError::AccessDenied { .. } => StatusCode::FORBIDDEN,
            AdminError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            AdminError::BadRequest(_) => "BAD_REQUEST",
            AdminError::Config(_) => "CONFIG_ERROR",
            AdminError::Hydration(_) => "HYDRATION_ERROR",
            AdminError::Persistence(e) => e.error_code(),
            AdminError::Request(e) => e.error_code(),
            AdminError::AccessDenied { .. } => "ACCESS_DENIED",
            AdminError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Convert to an error response
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            success: false,
            code: self.error_code().to_string(),
            message: self.to_string(),
            path: match self {
                AdminError::BadRequest(e) => Some(e.path().to_string()),
                _ => None,
            },
            details: self.details(),
        }
    }

    fn details(&self) -> Option<Value> {
        match self {
            AdminError::BadRequest(e) => Some(serde_json::json!({ "params": e.params() })),
            AdminError::AccessDenied { operation, .. } => {
                Some(serde_json::json!({ "operation": operation }))
            }
            _ => None,
        }
    }
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(self.to_response());
        (status, body).into_response()
    }
}

// =============================================================================
// Bad Request
// =============================================================================

/// Malformed request input
///
/// Carries a JSON pointer to the offending location and the original request
/// params so that clients can diagnose the problem.
#[derive(Debug, Clone)]
pub struct BadRequestError {
    message: String,
    path: String,
    params: Value,
}

impl BadRequestError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: "/".to_string(),
            params: Value::Null,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_params(mut self, params: &Value) -> Self {
        self.params = params.clone();
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// JSON pointer of the offending input
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn params(&self) -> &Value {
        &self.params
    }
}

impl fmt::Display for BadRequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bad request at '{}': {}", self.path, self.message)
    }
}

impl std::error::Error for BadRequestError {}

impl From<BadRequestError> for AdminError {
    fn from(err: BadRequestError) -> Self {
        AdminError::BadRequest(err)
    }
}

// =============================================================================
// Config Errors
// =============================================================================

/// Errors related to controller configuration
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to parse configuration file
    ParseError {
        file: Option<String>,
        message: String,
    },

    /// Missing required field in configuration
    MissingField { field: String, context: String },

    /// IO error while reading configuration
    IoError { message: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ParseError { file, message } => {
                if let Some(file) = file {
                    write!(f, "Failed to parse config file '{}': {}", file, message)
                } else {
                    write!(f, "Failed to parse config: {}", message)
                }
            }
            ConfigError::MissingField { field, context } => {
                write!(f, "Missing required field '{}' in {}", field, context)
            }
            ConfigError::IoError { message } => {
                write!(f, "IO error: {}", message)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for AdminError {
    fn from(err: ConfigError) -> Self {
        AdminError::Config(err)
    }
}

// =============================================================================
// Persistence Errors
// =============================================================================

/// Errors reported by persistence backends
#[derive(Debug)]
pub enum PersistenceError {
    /// Query execution error
    QueryError { backend: String, message: String },

    /// Write (save/update/remove) error
    WriteError {
        backend: String,
        operation: String,
        message: String,
    },

    /// Data integrity error
    IntegrityError { message: String },

    /// Backend not available
    Unavailable { backend: String },
}

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistenceError::QueryError { backend, message } => {
                write!(f, "{} query error: {}", backend, message)
            }
            PersistenceError::WriteError {
                backend,
                operation,
                message,
            } => {
                write!(f, "{} {} failed: {}", backend, operation, message)
            }
            PersistenceError::IntegrityError { message } => {
                write!(f, "Data integrity error: {}", message)
            }
            PersistenceError::Unavailable { backend } => {
                write!(f, "Storage backend '{}' is unavailable", backend)
            }
        }
    }
}

impl std::error::Error for PersistenceError {}

impl PersistenceError {
    pub fn error_code(&self) -> &'static str {
        match self {
            PersistenceError::QueryError { .. } => "PERSISTENCE_QUERY_ERROR",
            PersistenceError::WriteError { .. } => "PERSISTENCE_WRITE_ERROR",
            PersistenceError::IntegrityError { .. } => "PERSISTENCE_INTEGRITY_ERROR",
            PersistenceError::Unavailable { .. } => "PERSISTENCE_UNAVAILABLE",
        }
    }
}

impl From<PersistenceError> for AdminError {
    fn from(err: PersistenceError) -> Self {
        AdminError::Persistence(err)
    }
}

// =============================================================================
// Request Errors
// =============================================================================

/// Errors raised while routing a remote action call
#[derive(Debug)]
pub enum RequestError {
    /// No controller registered under this name
    UnknownController { name: String },

    /// Action name is not part of the CRUD surface
    UnknownAction { action: String },

    /// Request body is not usable as action params
    InvalidBody { message: String },
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestError::UnknownController { name } => {
                write!(f, "Unknown controller: {}", name)
            }
            RequestError::UnknownAction { action } => {
                write!(f, "Unknown action: {}", action)
            }
            RequestError::InvalidBody { message } => {
                write!(f, "Invalid request body: {}", message)
            }
        }
    }
}

impl std::error::Error for RequestError {}

impl RequestError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RequestError::UnknownController { .. } => StatusCode::NOT_FOUND,
            RequestError::UnknownAction { .. } => StatusCode::NOT_FOUND,
            RequestError::InvalidBody { .. } => StatusCode::BAD_REQUEST,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            RequestError::UnknownController { .. } => "UNKNOWN_CONTROLLER",
            RequestError::UnknownAction { .. } => "UNKNOWN_ACTION",
            RequestError::InvalidBody { .. } => "INVALID_BODY",
        }
    }
}

impl From<RequestError> for AdminError {
    fn from(err: RequestError) -> Self {
        AdminError::Request(err)
    }
}

impl From<HydrationError> for AdminError {
    fn from(err: HydrationError) -> Self {
        AdminError::Hydration(err)
    }
}

// =============================================================================
// Conversions from external errors
// =============================================================================

impl From<serde_json::Error> for AdminError {
    fn from(err: serde_json::Error) -> Self {
        AdminError::Internal(format!("JSON conversion failed: {}", err))
    }
}

impl From<std::io::Error> for AdminError {
    fn from(err: std::io::Error) -> Self {
        AdminError::Config(ConfigError::IoError {
            message: err.to_string(),
        })
    }
}

impl From<serde_yaml::Error> for AdminError {
    fn from(err: serde_yaml::Error) -> Self {
        AdminError::Config(ConfigError::ParseError {
            file: None,
            message: err.to_string(),
        })
    }
}

/// A specialized Result type for admin operations
pub type AdminResult<T> = Result<T, AdminError>;
