//! Entity validators used by the create and update pipelines

use validator::Validate;

use crate::config::CrudConfig;
use crate::core::entity::AdminEntity;
use crate::core::error::AdminResult;
use crate::core::validation::ValidationResult;

/// Validates a mapped entity before it is persisted
pub trait EntityValidator<E>: Send + Sync {
    fn validate(&self, entity: &E, config: &CrudConfig<E>) -> AdminResult<ValidationResult>;
}

/// Default validator
///
/// Runs the entity's `validator` derive rules unless the configuration sets
/// `ignore_standard_validator`, then the entity's own validation hook named
/// by `entity_validation_method`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardEntityValidator;

impl<E: AdminEntity> EntityValidator<E> for StandardEntityValidator {
    fn validate(&self, entity: &E, config: &CrudConfig<E>) -> AdminResult<ValidationResult> {
        let mut result = ValidationResult::new();

        if !config.ignore_standard_validator {
            if let Err(errors) = Validate::validate(entity) {
                result.merge(errors.into());
            }
        }

        entity.validate_with(&config.entity_validation_method, &mut result);

        Ok(result)
    }
}
