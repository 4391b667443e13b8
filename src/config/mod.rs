//! Controller configuration: partial overrides, defaults and resolution
//!
//! A controller supplies a [`ConfigOverrides`]: every key is optional. Each
//! action resolves it with [`prepare_config`], which fills unset keys with
//! the default hooks and checks that `entity` and `hydration` are present.
//!
//! Hooks receive the stage arguments plus the default collaborator for the
//! stage, so an override can wrap the default instead of replacing it:
//!
//! ```rust,ignore
//! let overrides = ConfigOverrides::<Article>::for_entity()
//!     .hydration(hydration)
//!     .create_entity(|params, factory, config| {
//!         let mut article = factory.create(params, config)?;
//!         article.status = "draft".to_string();
//!         Ok(article)
//!     });
//! ```

use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::core::entity::AdminEntity;
use crate::core::error::{AdminError, AdminResult, ConfigError};
use crate::core::exception::ExceptionHandler;
use crate::core::factory::EntityFactory;
use crate::core::mapper::DataMapper;
use crate::core::operation::Operation;
use crate::core::params;
use crate::core::persistence::{OperationResult, PersistenceHandler};
use crate::core::validation::{EntityValidator, ValidationResult};
use crate::hydration::{HydrationConfig, HydrationSpec};

/// Default name of the entity validation routine
pub const DEFAULT_ENTITY_VALIDATION_METHOD: &str = "validate";

/// `(params, default factory, config) -> entity`
pub type CreateEntityHook<E> =
    Arc<dyn Fn(&Value, &dyn EntityFactory<E>, &CrudConfig<E>) -> AdminResult<E> + Send + Sync>;

/// `(params, entity, default mapper)`, mutates the entity from `params.record`
pub type MapDataHook<E> =
    Arc<dyn Fn(&Value, &mut E, &dyn DataMapper<E>) -> AdminResult<()> + Send + Sync>;

/// `(entity, default validator, config) -> validation result`
pub type ValidateHook<E> = Arc<
    dyn Fn(&E, &dyn EntityValidator<E>, &CrudConfig<E>) -> AdminResult<ValidationResult>
        + Send
        + Sync,
>;

/// `(entity, persistence handler) -> operation result`
pub type PersistHook<E> =
    Arc<dyn Fn(&mut E, &dyn PersistenceHandler<E>) -> AdminResult<OperationResult> + Send + Sync>;

/// `(error, operation, default handler) -> response`; `Err` propagates
pub type ExceptionHook =
    Arc<dyn Fn(AdminError, Operation, &dyn ExceptionHandler) -> AdminResult<Value> + Send + Sync>;

/// `(operation, params)`; `Err` rejects the call
pub type AccessCheckHook = Arc<dyn Fn(Operation, &Value) -> AdminResult<()> + Send + Sync>;

/// Fully resolved configuration of one action invocation
pub struct CrudConfig<E> {
    /// Entity type the controller manages
    pub entity: String,
    pub hydration: HydrationConfig<E>,
    pub create_entity: CreateEntityHook<E>,
    pub map_data_on_create: MapDataHook<E>,
    pub map_data_on_update: MapDataHook<E>,
    /// `None` skips validation of new records
    pub new_record_validator: Option<ValidateHook<E>>,
    /// `None` skips validation of updated records
    pub updated_record_validator: Option<ValidateHook<E>>,
    pub save_entity_handler: PersistHook<E>,
    pub update_entity_handler: PersistHook<E>,
    pub exception_handler: ExceptionHook,
    /// `None` allows every operation
    pub access_check: Option<AccessCheckHook>,
    pub ignore_standard_validator: bool,
    pub entity_validation_method: String,
}

impl<E> fmt::Debug for CrudConfig<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrudConfig")
            .field("entity", &self.entity)
            .field("hydration", &self.hydration)
            .field("new_record_validator", &self.new_record_validator.is_some())
            .field(
                "updated_record_validator",
                &self.updated_record_validator.is_some(),
            )
            .field("access_check", &self.access_check.is_some())
            .field("ignore_standard_validator", &self.ignore_standard_validator)
            .field("entity_validation_method", &self.entity_validation_method)
            .finish_non_exhaustive()
    }
}

/// Partial configuration supplied by a controller
///
/// Validator slots are tri-state: unset (`None`, the default validator is
/// used), set, or disabled (`Some(None)`, validation is skipped).
pub struct ConfigOverrides<E> {
    pub entity: Option<String>,
    pub hydration: Option<HydrationConfig<E>>,
    pub create_entity: Option<CreateEntityHook<E>>,
    pub map_data_on_create: Option<MapDataHook<E>>,
    pub map_data_on_update: Option<MapDataHook<E>>,
    pub new_record_validator: Option<Option<ValidateHook<E>>>,
    pub updated_record_validator: Option<Option<ValidateHook<E>>>,
    pub save_entity_handler: Option<PersistHook<E>>,
    pub update_entity_handler: Option<PersistHook<E>>,
    pub exception_handler: Option<ExceptionHook>,
    pub access_check: Option<AccessCheckHook>,
    pub ignore_standard_validator: Option<bool>,
    pub entity_validation_method: Option<String>,
}

impl<E> Default for ConfigOverrides<E> {
    fn default() -> Self {
        Self {
            entity: None,
            hydration: None,
            create_entity: None,
            map_data_on_create: None,
            map_data_on_update: None,
            new_record_validator: None,
            updated_record_validator: None,
            save_entity_handler: None,
            update_entity_handler: None,
            exception_handler: None,
            access_check: None,
            ignore_standard_validator: None,
            entity_validation_method: None,
        }
    }
}

impl<E> Clone for ConfigOverrides<E> {
    fn clone(&self) -> Self {
        Self {
            entity: self.entity.clone(),
            hydration: self.hydration.clone(),
            create_entity: self.create_entity.clone(),
            map_data_on_create: self.map_data_on_create.clone(),
            map_data_on_update: self.map_data_on_update.clone(),
            new_record_validator: self.new_record_validator.clone(),
            updated_record_validator: self.updated_record_validator.clone(),
            save_entity_handler: self.save_entity_handler.clone(),
            update_entity_handler: self.update_entity_handler.clone(),
            exception_handler: self.exception_handler.clone(),
            access_check: self.access_check.clone(),
            ignore_standard_validator: self.ignore_standard_validator,
            entity_validation_method: self.entity_validation_method.clone(),
        }
    }
}

impl<E> fmt::Debug for ConfigOverrides<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let set = |hook: bool| if hook { "set" } else { "unset" };
        f.debug_struct("ConfigOverrides")
            .field("entity", &self.entity)
            .field("hydration", &self.hydration)
            .field("create_entity", &set(self.create_entity.is_some()))
            .field("map_data_on_create", &set(self.map_data_on_create.is_some()))
            .field("map_data_on_update", &set(self.map_data_on_update.is_some()))
            .field(
                "new_record_validator",
                &set(self.new_record_validator.is_some()),
            )
            .field(
                "updated_record_validator",
                &set(self.updated_record_validator.is_some()),
            )
            .field("save_entity_handler", &set(self.save_entity_handler.is_some()))
            .field(
                "update_entity_handler",
                &set(self.update_entity_handler.is_some()),
            )
            .field("exception_handler", &set(self.exception_handler.is_some()))
            .field("access_check", &set(self.access_check.is_some()))
            .field("ignore_standard_validator", &self.ignore_standard_validator)
            .field("entity_validation_method", &self.entity_validation_method)
            .finish()
    }
}

/// Declarative part of a configuration file
///
/// ```yaml
/// entity: article
/// ignore_standard_validator: false
/// entity_validation_method: validate
/// hydration:
///   profiles:
///     list: [main]
///   groups:
///     main: { id: id, title: title }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    entity: Option<String>,
    ignore_standard_validator: Option<bool>,
    entity_validation_method: Option<String>,
    hydration: Option<HydrationSpec>,
}

impl<E> ConfigOverrides<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    pub fn hydration(mut self, hydration: HydrationConfig<E>) -> Self {
        self.hydration = Some(hydration);
        self
    }

    pub fn create_entity<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Value, &dyn EntityFactory<E>, &CrudConfig<E>) -> AdminResult<E>
            + Send
            + Sync
            + 'static,
    {
        self.create_entity = Some(Arc::new(hook));
        self
    }

    pub fn map_data_on_create<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Value, &mut E, &dyn DataMapper<E>) -> AdminResult<()> + Send + Sync + 'static,
    {
        self.map_data_on_create = Some(Arc::new(hook));
        self
    }

    pub fn map_data_on_update<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Value, &mut E, &dyn DataMapper<E>) -> AdminResult<()> + Send + Sync + 'static,
    {
        self.map_data_on_update = Some(Arc::new(hook));
        self
    }

    pub fn new_record_validator<F>(mut self, hook: F) -> Self
    where
        F: Fn(&E, &dyn EntityValidator<E>, &CrudConfig<E>) -> AdminResult<ValidationResult>
            + Send
            + Sync
            + 'static,
    {
        self.new_record_validator = Some(Some(Arc::new(hook)));
        self
    }

    /// Skip validation of new records
    pub fn without_new_record_validator(mut self) -> Self {
        self.new_record_validator = Some(None);
        self
    }

    pub fn updated_record_validator<F>(mut self, hook: F) -> Self
    where
        F: Fn(&E, &dyn EntityValidator<E>, &CrudConfig<E>) -> AdminResult<ValidationResult>
            + Send
            + Sync
            + 'static,
    {
        self.updated_record_validator = Some(Some(Arc::new(hook)));
        self
    }

    /// Skip validation of updated records
    pub fn without_updated_record_validator(mut self) -> Self {
        self.updated_record_validator = Some(None);
        self
    }

    pub fn save_entity_handler<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut E, &dyn PersistenceHandler<E>) -> AdminResult<OperationResult>
            + Send
            + Sync
            + 'static,
    {
        self.save_entity_handler = Some(Arc::new(hook));
        self
    }

    pub fn update_entity_handler<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut E, &dyn PersistenceHandler<E>) -> AdminResult<OperationResult>
            + Send
            + Sync
            + 'static,
    {
        self.update_entity_handler = Some(Arc::new(hook));
        self
    }

    pub fn exception_handler<F>(mut self, hook: F) -> Self
    where
        F: Fn(AdminError, Operation, &dyn ExceptionHandler) -> AdminResult<Value>
            + Send
            + Sync
            + 'static,
    {
        self.exception_handler = Some(Arc::new(hook));
        self
    }

    pub fn access_check<F>(mut self, hook: F) -> Self
    where
        F: Fn(Operation, &Value) -> AdminResult<()> + Send + Sync + 'static,
    {
        self.access_check = Some(Arc::new(hook));
        self
    }

    pub fn ignore_standard_validator(mut self, ignore: bool) -> Self {
        self.ignore_standard_validator = Some(ignore);
        self
    }

    pub fn entity_validation_method(mut self, method: impl Into<String>) -> Self {
        self.entity_validation_method = Some(method.into());
        self
    }

    /// Shallow merge: every key set in `other` replaces ours
    pub fn merge(self, other: ConfigOverrides<E>) -> Self {
        Self {
            entity: other.entity.or(self.entity),
            hydration: other.hydration.or(self.hydration),
            create_entity: other.create_entity.or(self.create_entity),
            map_data_on_create: other.map_data_on_create.or(self.map_data_on_create),
            map_data_on_update: other.map_data_on_update.or(self.map_data_on_update),
            new_record_validator: other.new_record_validator.or(self.new_record_validator),
            updated_record_validator: other
                .updated_record_validator
                .or(self.updated_record_validator),
            save_entity_handler: other.save_entity_handler.or(self.save_entity_handler),
            update_entity_handler: other.update_entity_handler.or(self.update_entity_handler),
            exception_handler: other.exception_handler.or(self.exception_handler),
            access_check: other.access_check.or(self.access_check),
            ignore_standard_validator: other
                .ignore_standard_validator
                .or(self.ignore_standard_validator),
            entity_validation_method: other
                .entity_validation_method
                .or(self.entity_validation_method),
        }
    }

    /// Load the declarative keys from a YAML string
    pub fn from_yaml_str(yaml: &str) -> AdminResult<Self> {
        let file: ConfigFile = serde_yaml::from_str(yaml)?;
        Ok(Self::from_file(file))
    }

    /// Load the declarative keys from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> AdminResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let file: ConfigFile = serde_yaml::from_str(&content).map_err(|e| {
            AdminError::Config(ConfigError::ParseError {
                file: Some(path.display().to_string()),
                message: e.to_string(),
            })
        })?;
        Ok(Self::from_file(file))
    }

    fn from_file(file: ConfigFile) -> Self {
        Self {
            entity: file.entity,
            hydration: file.hydration.map(HydrationSpec::into_config),
            ignore_standard_validator: file.ignore_standard_validator,
            entity_validation_method: file.entity_validation_method,
            ..Self::default()
        }
    }
}

impl<E: AdminEntity> ConfigOverrides<E> {
    /// Overrides with `entity` set to `E`'s entity type
    pub fn for_entity() -> Self {
        Self::new().entity(E::entity_type())
    }
}

/// Resolve overrides into a complete configuration
///
/// Unset keys get their defaults; a missing `entity` or `hydration` is a
/// configuration error.
pub fn prepare_config<E: AdminEntity>(overrides: ConfigOverrides<E>) -> AdminResult<CrudConfig<E>> {
    let missing = |field: &str| {
        AdminError::Config(ConfigError::MissingField {
            field: field.to_string(),
            context: format!("controller configuration for {}", std::any::type_name::<E>()),
        })
    };

    let entity = overrides.entity.ok_or_else(|| missing("entity"))?;
    let hydration = overrides.hydration.ok_or_else(|| missing("hydration"))?;

    Ok(CrudConfig {
        entity,
        hydration,
        create_entity: overrides
            .create_entity
            .unwrap_or_else(default_create_entity::<E>),
        map_data_on_create: overrides
            .map_data_on_create
            .unwrap_or_else(default_map_data::<E>),
        map_data_on_update: overrides
            .map_data_on_update
            .unwrap_or_else(default_map_data::<E>),
        new_record_validator: overrides
            .new_record_validator
            .unwrap_or_else(|| Some(default_validator::<E>())),
        updated_record_validator: overrides
            .updated_record_validator
            .unwrap_or_else(|| Some(default_validator::<E>())),
        save_entity_handler: overrides
            .save_entity_handler
            .unwrap_or_else(default_save::<E>),
        update_entity_handler: overrides
            .update_entity_handler
            .unwrap_or_else(default_update::<E>),
        exception_handler: overrides
            .exception_handler
            .unwrap_or_else(default_exception_handler),
        access_check: overrides.access_check,
        ignore_standard_validator: overrides.ignore_standard_validator.unwrap_or(false),
        entity_validation_method: overrides
            .entity_validation_method
            .unwrap_or_else(|| DEFAULT_ENTITY_VALIDATION_METHOD.to_string()),
    })
}

fn default_create_entity<E: AdminEntity>() -> CreateEntityHook<E> {
    Arc::new(
        |params: &Value, factory: &dyn EntityFactory<E>, config: &CrudConfig<E>| {
            factory.create(params, config)
        },
    )
}

fn default_map_data<E: AdminEntity>() -> MapDataHook<E> {
    Arc::new(|params: &Value, entity: &mut E, mapper: &dyn DataMapper<E>| {
        // Mappers only see the record; bad requests report the whole params
        mapper
            .map_data(params::record(params)?, entity)
            .map_err(|error| match error {
                AdminError::BadRequest(e) => e.with_params(params).into(),
                other => other,
            })
    })
}

fn default_validator<E: AdminEntity>() -> ValidateHook<E> {
    Arc::new(
        |entity: &E, validator: &dyn EntityValidator<E>, config: &CrudConfig<E>| {
            validator.validate(entity, config)
        },
    )
}

fn default_save<E: AdminEntity>() -> PersistHook<E> {
    Arc::new(|entity: &mut E, persistence: &dyn PersistenceHandler<E>| {
        persistence.save(entity)
    })
}

fn default_update<E: AdminEntity>() -> PersistHook<E> {
    Arc::new(|entity: &mut E, persistence: &dyn PersistenceHandler<E>| {
        persistence.update(entity)
    })
}

fn default_exception_handler() -> ExceptionHook {
    Arc::new(
        |error: AdminError, operation: Operation, handler: &dyn ExceptionHandler| {
            handler.create_response(error, operation)
        },
    )
}
