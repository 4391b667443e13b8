//! REST exposure of registered controllers
//!
//! Routes:
//! - `POST /{controller}/{action}`: run an action, the body is the params object
//! - `GET /api`: registered controllers and their actions
//! - `GET /health`, `GET /healthz`: health checks

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use std::sync::Arc;

use crate::core::error::{AdminError, AdminResult, RequestError};
use crate::server::registry::ControllerRegistry;

/// REST API exposure of a [`ControllerRegistry`]
pub struct RestExposure;

impl RestExposure {
    /// Build the router: health checks, the API description, every custom
    /// router, then the action route
    pub fn build_router(registry: Arc<ControllerRegistry>, custom_routes: Vec<Router>) -> Router {
        let mut app = Self::health_routes();

        for custom_router in custom_routes {
            app = app.merge(custom_router);
        }

        let api_routes = Router::new()
            .route("/api", get(Self::describe))
            .route("/{controller}/{action}", post(Self::call_action))
            .with_state(registry);

        app.merge(api_routes)
    }

    fn health_routes() -> Router {
        Router::new()
            .route("/health", get(Self::health_check))
            .route("/healthz", get(Self::health_check))
    }

    async fn health_check() -> Json<Value> {
        Json(json!({
            "status": "ok",
            "service": "this-admin"
        }))
    }

    async fn describe(State(registry): State<Arc<ControllerRegistry>>) -> Json<Value> {
        Json(registry.describe())
    }

    /// Run one action
    ///
    /// Actions are synchronous and may block on storage, so they run on the
    /// blocking pool.
    async fn call_action(
        State(registry): State<Arc<ControllerRegistry>>,
        Path((controller_name, action)): Path<(String, String)>,
        body: Bytes,
    ) -> AdminResult<Json<Value>> {
        let (controller, operation) = registry.resolve(&controller_name, &action)?;
        let params = parse_params(&body)?;

        tracing::debug!(
            controller = %controller_name,
            operation = %operation,
            "Remote action call"
        );

        let response = tokio::task::spawn_blocking(move || controller.handle(operation, &params))
            .await
            .map_err(|e| AdminError::Internal(format!("Action task failed: {}", e)))??;

        Ok(Json(response))
    }
}

/// Params object of an action call; an empty body means `{}`
fn parse_params(body: &[u8]) -> AdminResult<Value> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(json!({}));
    }

    match serde_json::from_slice::<Value>(body) {
        Ok(params @ Value::Object(_)) => Ok(params),
        Ok(_) => Err(RequestError::InvalidBody {
            message: "Params must be a JSON object".to_string(),
        }
        .into()),
        Err(e) => Err(RequestError::InvalidBody {
            message: e.to_string(),
        }
        .into()),
    }
}
