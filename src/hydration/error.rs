use thiserror::Error;

use crate::hydration::accessor::PropertyPathError;

/// Failure while hydrating an object
#[derive(Debug, Error)]
pub enum HydrationError {
    #[error("Hydration profile '{profile}' is not defined")]
    UnknownProfile { profile: String },

    #[error("Hydration group '{group}' is not defined")]
    UnknownGroup { group: String },

    #[error("Unable to resolve expression '{path}' on {type_name}")]
    Extraction {
        path: String,
        type_name: String,
        #[source]
        source: PropertyPathError,
    },

    #[error("Hydration group '{group}' returned {found}, expected {expected}")]
    InvalidGroupResult {
        group: String,
        found: &'static str,
        expected: &'static str,
    },

    #[error("Hydrator of group '{group}' failed: {source}")]
    HydratorFailed {
        group: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Unable to serialize {type_name}: {source}")]
    Serialization {
        type_name: String,
        #[source]
        source: serde_json::Error,
    },
}
