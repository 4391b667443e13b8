//! Controller registry for the remote action surface

use indexmap::IndexMap;
use serde_json::{Value, json};
use std::sync::Arc;

use crate::core::error::{AdminResult, RequestError};
use crate::core::operation::Operation;

/// A controller callable through the remote action surface
///
/// Implemented by every [`CrudController`](crate::controller::CrudController);
/// custom controllers can implement it directly.
pub trait RemoteController: Send + Sync {
    /// The entity type the controller manages
    fn entity_type(&self) -> &str;

    /// Actions the controller accepts
    fn actions(&self) -> &[Operation] {
        &Operation::ALL
    }

    /// Run `operation` with the request params
    fn handle(&self, operation: Operation, params: &Value) -> AdminResult<Value>;
}

/// Registry of the controllers exposed by a server, by name
#[derive(Default)]
pub struct ControllerRegistry {
    controllers: IndexMap<String, Arc<dyn RemoteController>>,
}

impl ControllerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a controller, replacing any controller of the same name
    pub fn register(&mut self, name: impl Into<String>, controller: Arc<dyn RemoteController>) {
        let name = name.into();
        if self.controllers.insert(name.clone(), controller).is_some() {
            tracing::warn!(controller = %name, "Controller registered twice, keeping the last one");
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn RemoteController>> {
        self.controllers.get(name).cloned()
    }

    /// Resolve a controller and one of its actions from route segments
    pub fn resolve(
        &self,
        name: &str,
        action: &str,
    ) -> AdminResult<(Arc<dyn RemoteController>, Operation)> {
        let controller = self.get(name).ok_or_else(|| RequestError::UnknownController {
            name: name.to_string(),
        })?;

        let operation: Operation = action.parse()?;
        if !controller.actions().contains(&operation) {
            return Err(RequestError::UnknownAction {
                action: action.to_string(),
            }
            .into());
        }

        Ok((controller, operation))
    }

    pub fn names(&self) -> Vec<&str> {
        self.controllers.keys().map(String::as_str).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }

    /// Description of the registered controllers, served at `/api`
    pub fn describe(&self) -> Value {
        let controllers: Vec<Value> = self
            .controllers
            .iter()
            .map(|(name, controller)| {
                json!({
                    "name": name,
                    "entity": controller.entity_type(),
                    "actions": controller
                        .actions()
                        .iter()
                        .map(|op| op.as_str())
                        .collect::<Vec<_>>(),
                })
            })
            .collect();

        json!({ "controllers": controllers })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::AdminError;

    struct ReadOnly;

    impl RemoteController for ReadOnly {
        fn entity_type(&self) -> &str {
            "report"
        }

        fn actions(&self) -> &[Operation] {
            &[Operation::Get, Operation::List]
        }

        fn handle(&self, operation: Operation, _params: &Value) -> AdminResult<Value> {
            Ok(json!({ "success": true, "operation": operation.as_str() }))
        }
    }

    fn registry() -> ControllerRegistry {
        let mut registry = ControllerRegistry::new();
        registry.register("reports", Arc::new(ReadOnly));
        registry
    }

    #[test]
    fn test_new_registry_is_empty() {
        assert!(ControllerRegistry::new().is_empty());
    }

    #[test]
    fn test_resolve_known_action() {
        let (controller, operation) = registry().resolve("reports", "list").unwrap();
        assert_eq!(operation, Operation::List);
        assert_eq!(controller.entity_type(), "report");
    }

    #[test]
    fn test_resolve_unknown_controller() {
        let err = registry().resolve("orders", "list").err().unwrap();
        assert!(matches!(
            err,
            AdminError::Request(RequestError::UnknownController { .. })
        ));
    }

    #[test]
    fn test_resolve_unsupported_action() {
        let err = registry().resolve("reports", "create").err().unwrap();
        assert!(matches!(
            err,
            AdminError::Request(RequestError::UnknownAction { .. })
        ));

        let err = registry().resolve("reports", "truncate").err().unwrap();
        assert!(matches!(
            err,
            AdminError::Request(RequestError::UnknownAction { .. })
        ));
    }

    #[test]
    fn test_describe() {
        let description = registry().describe();
        assert_eq!(
            description,
            json!({
                "controllers": [
                    { "name": "reports", "entity": "report", "actions": ["get", "list"] }
                ]
            })
        );
    }
}
