//! Collaborators injected into a CRUD controller

use std::sync::Arc;

use crate::core::entity::AdminEntity;
use crate::core::exception::{DefaultExceptionHandler, ExceptionHandler};
use crate::core::factory::{DefaultEntityFactory, EntityFactory};
use crate::core::mapper::{DataMapper, JsonDataMapper};
use crate::core::persistence::{DefaultModelManager, ModelManager, PersistenceHandler};
use crate::core::validation::{EntityValidator, StandardEntityValidator};
use crate::hydration::HydrationService;

/// Default collaborators handed to the configuration hooks
///
/// Only the persistence handler has no default; every other service can be
/// replaced with the `with_*` methods.
pub struct CrudServices<E> {
    pub factory: Arc<dyn EntityFactory<E>>,
    pub mapper: Arc<dyn DataMapper<E>>,
    pub validator: Arc<dyn EntityValidator<E>>,
    pub persistence: Arc<dyn PersistenceHandler<E>>,
    pub exception_handler: Arc<dyn ExceptionHandler>,
    pub model_manager: Arc<dyn ModelManager>,
    pub hydrator: HydrationService,
}

impl<E: AdminEntity> CrudServices<E> {
    pub fn new(persistence: Arc<dyn PersistenceHandler<E>>) -> Self {
        Self {
            factory: Arc::new(DefaultEntityFactory),
            mapper: Arc::new(JsonDataMapper::new()),
            validator: Arc::new(StandardEntityValidator),
            persistence,
            exception_handler: Arc::new(DefaultExceptionHandler),
            model_manager: Arc::new(DefaultModelManager),
            hydrator: HydrationService::new(),
        }
    }
}

impl<E> CrudServices<E> {
    pub fn with_factory(mut self, factory: impl EntityFactory<E> + 'static) -> Self {
        self.factory = Arc::new(factory);
        self
    }

    pub fn with_mapper(mut self, mapper: impl DataMapper<E> + 'static) -> Self {
        self.mapper = Arc::new(mapper);
        self
    }

    pub fn with_validator(mut self, validator: impl EntityValidator<E> + 'static) -> Self {
        self.validator = Arc::new(validator);
        self
    }

    pub fn with_exception_handler(mut self, handler: impl ExceptionHandler + 'static) -> Self {
        self.exception_handler = Arc::new(handler);
        self
    }

    pub fn with_model_manager(mut self, manager: impl ModelManager + 'static) -> Self {
        self.model_manager = Arc::new(manager);
        self
    }

    pub fn with_hydrator(mut self, hydrator: HydrationService) -> Self {
        self.hydrator = hydrator;
        self
    }
}

impl<E> Clone for CrudServices<E> {
    fn clone(&self) -> Self {
        Self {
            factory: Arc::clone(&self.factory),
            mapper: Arc::clone(&self.mapper),
            validator: Arc::clone(&self.validator),
            persistence: Arc::clone(&self.persistence),
            exception_handler: Arc::clone(&self.exception_handler),
            model_manager: Arc::clone(&self.model_manager),
            hydrator: self.hydrator,
        }
    }
}
