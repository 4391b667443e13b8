//! Core module containing the pipeline contracts and their defaults

pub mod entity;
pub mod error;
pub mod exception;
pub mod factory;
pub mod mapper;
pub mod operation;
pub mod params;
pub mod persistence;
pub mod validation;

pub use entity::AdminEntity;
pub use error::{AdminError, AdminResult};
pub use exception::{DefaultExceptionHandler, ExceptionHandler};
pub use factory::{DefaultEntityFactory, EntityFactory};
pub use mapper::{DataMapper, JsonDataMapper};
pub use operation::Operation;
pub use persistence::{DefaultModelManager, ModelManager, OperationResult, PersistenceHandler};
pub use validation::{EntityValidator, StandardEntityValidator, ValidationResult};
