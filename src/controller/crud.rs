//! The CRUD controller and its remote actions
//!
//! Every action resolves the controller configuration, runs the access
//! check, then runs its pipeline. Any failure past configuration resolution
//! goes through the configured exception handler, which either turns it
//! into a response or lets it propagate.

use serde_json::{Map, Value, json};
use std::sync::Arc;

use crate::config::{ConfigOverrides, CrudConfig, ValidateHook, prepare_config};
use crate::controller::services::CrudServices;
use crate::core::entity::AdminEntity;
use crate::core::error::{AdminError, AdminResult};
use crate::core::operation::Operation;
use crate::core::params::{self, HydrationRequest};
use crate::core::persistence::OperationResult;
use crate::core::validation::ValidationResult;
use crate::hydration::HydrationError;
use crate::server::registry::RemoteController;

/// Supplies a controller's configuration overrides
///
/// Called once per action, so the overrides may depend on runtime state.
pub trait CrudConfigSource<E>: Send + Sync {
    fn config(&self) -> ConfigOverrides<E>;
}

impl<E, F> CrudConfigSource<E> for F
where
    F: Fn() -> ConfigOverrides<E> + Send + Sync,
{
    fn config(&self) -> ConfigOverrides<E> {
        self()
    }
}

/// Generic CRUD controller over one entity type
pub struct CrudController<E> {
    services: CrudServices<E>,
    source: Arc<dyn CrudConfigSource<E>>,
}

impl<E> Clone for CrudController<E> {
    fn clone(&self) -> Self {
        Self {
            services: self.services.clone(),
            source: Arc::clone(&self.source),
        }
    }
}

impl<E: AdminEntity> CrudController<E> {
    pub fn new(services: CrudServices<E>, source: impl CrudConfigSource<E> + 'static) -> Self {
        Self {
            services,
            source: Arc::new(source),
        }
    }

    /// Controller whose overrides never change
    pub fn with_overrides(services: CrudServices<E>, overrides: ConfigOverrides<E>) -> Self {
        Self::new(services, move || overrides.clone())
    }

    pub fn services(&self) -> &CrudServices<E> {
        &self.services
    }

    /// Resolve the configuration for one action invocation
    pub fn prepared_config(&self) -> AdminResult<CrudConfig<E>> {
        prepare_config(self.source.config())
    }

    /// `record` → create → map → validate → save
    pub fn create_action(&self, params: &Value) -> AdminResult<Value> {
        self.run(Operation::Create, params, |config| {
            params::record(params)?;
            let hydration = self.requested_hydration(params, config)?;

            let mut entity = (config.create_entity)(params, self.services.factory.as_ref(), config)?;
            (config.map_data_on_create)(params, &mut entity, self.services.mapper.as_ref())?;

            if let Some(validation) =
                self.validate(&entity, config.new_record_validator.as_ref(), config)?
            {
                return Ok(validation);
            }

            let result =
                (config.save_entity_handler)(&mut entity, self.services.persistence.as_ref())?;
            self.write_response(result, &entity, hydration.as_ref(), params, config)
        })
    }

    /// The single entity matching `filter`, hydrated
    pub fn get_action(&self, params: &Value) -> AdminResult<Value> {
        self.run(Operation::Get, params, |config| {
            let request = self.hydration_request(params, config)?;
            let entity = self.find_one(params, config)?;
            let result = self.hydrate(&entity, &request, params, config)?;

            Ok(json!({ "success": true, "result": result }))
        })
    }

    /// Hydrated entities matching `filter`, with the total count
    ///
    /// The count and the fetch are two independent persistence calls.
    pub fn list_action(&self, params: &Value) -> AdminResult<Value> {
        self.run(Operation::List, params, |config| {
            let request = self.hydration_request(params, config)?;
            let persistence = self.services.persistence.as_ref();

            let total = persistence.get_count(&config.entity, params)?;
            let items = persistence
                .query(&config.entity, params)?
                .iter()
                .map(|entity| self.hydrate(entity, &request, params, config))
                .collect::<AdminResult<Vec<_>>>()?;

            Ok(json!({ "success": true, "items": items, "total": total }))
        })
    }

    /// Remove every entity matching `filter`
    pub fn remove_action(&self, params: &Value) -> AdminResult<Value> {
        self.run(Operation::Remove, params, |config| {
            let result = self
                .services
                .persistence
                .remove(&config.entity, params)?;
            Ok(self.success(result))
        })
    }

    /// `record` → find one → map → validate → update
    pub fn update_action(&self, params: &Value) -> AdminResult<Value> {
        self.run(Operation::Update, params, |config| {
            params::record(params)?;
            let hydration = self.requested_hydration(params, config)?;

            let mut entity = self.find_one(params, config)?;
            (config.map_data_on_update)(params, &mut entity, self.services.mapper.as_ref())?;

            if let Some(validation) =
                self.validate(&entity, config.updated_record_validator.as_ref(), config)?
            {
                return Ok(validation);
            }

            let result =
                (config.update_entity_handler)(&mut entity, self.services.persistence.as_ref())?;
            self.write_response(result, &entity, hydration.as_ref(), params, config)
        })
    }

    /// Field values of a blank record, for client forms
    pub fn get_new_record_values_action(&self, params: &Value) -> AdminResult<Value> {
        self.run(Operation::GetNewRecordValues, params, |config| {
            let hydration = self.requested_hydration(params, config)?;
            let entity = (config.create_entity)(params, self.services.factory.as_ref(), config)?;

            let result = match &hydration {
                Some(request) => self.hydrate(&entity, request, params, config)?,
                None => serde_json::to_value(&entity)?,
            };

            Ok(json!({ "success": true, "result": result }))
        })
    }

    /// Dispatch `operation` to its action
    pub fn dispatch(&self, operation: Operation, params: &Value) -> AdminResult<Value> {
        match operation {
            Operation::Create => self.create_action(params),
            Operation::Get => self.get_action(params),
            Operation::List => self.list_action(params),
            Operation::Remove => self.remove_action(params),
            Operation::Update => self.update_action(params),
            Operation::GetNewRecordValues => self.get_new_record_values_action(params),
        }
    }

    fn run<F>(&self, operation: Operation, params: &Value, body: F) -> AdminResult<Value>
    where
        F: FnOnce(&CrudConfig<E>) -> AdminResult<Value>,
    {
        let config = self.prepared_config()?;

        tracing::debug!(
            entity = %config.entity,
            operation = %operation,
            "Running CRUD action"
        );

        let outcome = match &config.access_check {
            Some(check) => check(operation, params).and_then(|()| body(&config)),
            None => body(&config),
        };

        outcome.or_else(|error| {
            tracing::warn!(
                entity = %config.entity,
                operation = %operation,
                error_code = error.error_code(),
                "CRUD action failed: {}",
                error
            );
            (config.exception_handler)(error, operation, self.services.exception_handler.as_ref())
        })
    }

    /// Run a validator slot; `Some(response)` when the entity is invalid
    fn validate(
        &self,
        entity: &E,
        validator: Option<&ValidateHook<E>>,
        config: &CrudConfig<E>,
    ) -> AdminResult<Option<Value>> {
        let Some(validator) = validator else {
            return Ok(None);
        };

        let result: ValidationResult = validator(entity, self.services.validator.as_ref(), config)?;
        if !result.has_errors() {
            return Ok(None);
        }

        tracing::debug!(entity = %config.entity, "Record failed validation");
        let mut response = Map::new();
        response.insert("success".to_string(), Value::Bool(false));
        response.extend(result.to_map());
        Ok(Some(Value::Object(response)))
    }

    /// Hydration request of `params`, checked against the configured
    /// profiles and groups before anything is read or written
    fn hydration_request(
        &self,
        params: &Value,
        config: &CrudConfig<E>,
    ) -> AdminResult<HydrationRequest> {
        let request = HydrationRequest::from_params(params)?;

        if config.hydration.get_profile(&request.profile).is_none() {
            let error = HydrationError::UnknownProfile {
                profile: request.profile.clone(),
            };
            return Err(AdminError::bad_request(
                error.to_string(),
                "/hydration/profile",
                params,
            ));
        }

        if let Some(selection) = &request.groups {
            for group in selection.names() {
                if config.hydration.get_group(group).is_none() {
                    let error = HydrationError::UnknownGroup {
                        group: group.to_string(),
                    };
                    return Err(AdminError::bad_request(
                        error.to_string(),
                        "/hydration/group",
                        params,
                    ));
                }
            }
        }

        Ok(request)
    }

    /// Like [`Self::hydration_request`], `None` when no hydration is asked for
    fn requested_hydration(
        &self,
        params: &Value,
        config: &CrudConfig<E>,
    ) -> AdminResult<Option<HydrationRequest>> {
        if HydrationRequest::is_requested(params) {
            self.hydration_request(params, config).map(Some)
        } else {
            Ok(None)
        }
    }

    /// The only entity matching `filter`; paging never narrows the matches
    fn find_one(&self, params: &Value, config: &CrudConfig<E>) -> AdminResult<E> {
        let mut matches = self
            .services
            .persistence
            .query(&config.entity, &params::without_paging(params))?;
        let count = matches.len();

        match matches.pop() {
            Some(entity) if count == 1 => Ok(entity),
            _ => Err(AdminError::bad_request(
                format!(
                    "Query must return exactly one result, but {} were returned",
                    count
                ),
                "/filter",
                params,
            )),
        }
    }

    fn success(&self, result: OperationResult) -> Value {
        let mut response = Map::new();
        response.insert("success".to_string(), Value::Bool(true));
        response.extend(result.to_map(self.services.model_manager.as_ref()));
        Value::Object(response)
    }

    fn write_response(
        &self,
        result: OperationResult,
        entity: &E,
        hydration: Option<&HydrationRequest>,
        params: &Value,
        config: &CrudConfig<E>,
    ) -> AdminResult<Value> {
        let mut response = self.success(result);

        if let Some(request) = hydration {
            let hydrated = self.hydrate(entity, request, params, config)?;
            if let Value::Object(map) = &mut response {
                map.insert("result".to_string(), hydrated);
            }
        }

        Ok(response)
    }

    fn hydrate(
        &self,
        entity: &E,
        request: &HydrationRequest,
        params: &Value,
        config: &CrudConfig<E>,
    ) -> AdminResult<Value> {
        self.services
            .hydrator
            .hydrate(
                entity,
                &config.hydration,
                &request.profile,
                request.groups.as_ref(),
            )
            .map_err(|error| match error {
                HydrationError::UnknownProfile { .. } => {
                    AdminError::bad_request(error.to_string(), "/hydration/profile", params)
                }
                HydrationError::UnknownGroup { ref group } if request.requests_group(group) => {
                    AdminError::bad_request(error.to_string(), "/hydration/group", params)
                }
                other => other.into(),
            })
    }
}

impl<E: AdminEntity> RemoteController for CrudController<E> {
    fn entity_type(&self) -> &str {
        E::entity_type()
    }

    fn handle(&self, operation: Operation, params: &Value) -> AdminResult<Value> {
        self.dispatch(operation, params)
    }
}
