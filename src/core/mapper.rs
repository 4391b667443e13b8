//! Mapping of client record data onto entities

use serde_json::Value;

use crate::core::entity::AdminEntity;
use crate::core::error::{AdminError, AdminResult};

/// Copies incoming record data onto an entity, in place
pub trait DataMapper<E>: Send + Sync {
    fn map_data(&self, record: &Value, entity: &mut E) -> AdminResult<()>;
}

/// Default mapper working on the entity's JSON form
///
/// The record's keys are laid over the serialized entity and the result is
/// deserialized back. Protected fields keep their current value whatever
/// the record says.
#[derive(Debug, Clone)]
pub struct JsonDataMapper {
    protected_fields: Vec<String>,
}

impl JsonDataMapper {
    /// Mapper protecting the `id` field
    pub fn new() -> Self {
        Self {
            protected_fields: vec!["id".to_string()],
        }
    }

    /// Replace the set of protected fields
    pub fn with_protected_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.protected_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    fn is_protected(&self, field: &str) -> bool {
        self.protected_fields.iter().any(|f| f == field)
    }
}

impl Default for JsonDataMapper {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: AdminEntity> DataMapper<E> for JsonDataMapper {
    fn map_data(&self, record: &Value, entity: &mut E) -> AdminResult<()> {
        let Value::Object(fields) = record else {
            return Err(AdminError::bad_request(
                "Record must be an object",
                "/record",
                record,
            ));
        };

        let mut current = match serde_json::to_value(&*entity)? {
            Value::Object(map) => map,
            other => {
                return Err(AdminError::Internal(format!(
                    "{} does not serialize to an object (got {})",
                    std::any::type_name::<E>(),
                    other
                )));
            }
        };

        for (field, value) in fields {
            if !self.is_protected(field) {
                current.insert(field.clone(), value.clone());
            }
        }

        *entity = serde_json::from_value(Value::Object(current)).map_err(|e| {
            AdminError::bad_request(
                format!(
                    "Record cannot be mapped onto {}: {}",
                    E::entity_type(),
                    e
                ),
                "/record",
                record,
            )
        })?;

        Ok(())
    }
}
