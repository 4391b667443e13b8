//! Entity creation for the create pipeline

use serde_json::Value;

use crate::config::CrudConfig;
use crate::core::entity::AdminEntity;
use crate::core::error::AdminResult;

/// Creates the blank entity that incoming record data is mapped onto
pub trait EntityFactory<E>: Send + Sync {
    fn create(&self, params: &Value, config: &CrudConfig<E>) -> AdminResult<E>;
}

/// Default factory, returns `E::default()`
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultEntityFactory;

impl<E: AdminEntity> EntityFactory<E> for DefaultEntityFactory {
    fn create(&self, _params: &Value, _config: &CrudConfig<E>) -> AdminResult<E> {
        Ok(E::default())
    }
}
