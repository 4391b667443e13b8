//! AdminServerBuilder for fluent API to build HTTP servers

use super::registry::{ControllerRegistry, RemoteController};
use super::rest::RestExposure;
use anyhow::Result;
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Builder for the HTTP server exposing CRUD controllers
///
/// # Example
///
/// ```ignore
/// let app = AdminServerBuilder::new()
///     .register("articles", CrudController::with_overrides(services, overrides))
///     .with_permissive_cors()
///     .build()?;
/// ```
pub struct AdminServerBuilder {
    registry: ControllerRegistry,
    custom_routes: Vec<Router>,
    cors: Option<CorsLayer>,
}

impl AdminServerBuilder {
    pub fn new() -> Self {
        Self {
            registry: ControllerRegistry::new(),
            custom_routes: Vec::new(),
            cors: None,
        }
    }

    /// Expose a controller under `/{name}/{action}`
    pub fn register(
        mut self,
        name: impl Into<String>,
        controller: impl RemoteController + 'static,
    ) -> Self {
        self.registry.register(name, Arc::new(controller));
        self
    }

    /// Expose an already shared controller
    pub fn register_arc(
        mut self,
        name: impl Into<String>,
        controller: Arc<dyn RemoteController>,
    ) -> Self {
        self.registry.register(name, controller);
        self
    }

    /// Add custom routes to the server
    ///
    /// Use this for endpoints that are not controller actions, such as
    /// authentication or webhooks.
    pub fn with_custom_routes(mut self, routes: Router) -> Self {
        self.custom_routes.push(routes);
        self
    }

    /// Answer cross-origin requests with the given policy
    pub fn with_cors(mut self, cors: CorsLayer) -> Self {
        self.cors = Some(cors);
        self
    }

    /// Allow any origin, method and header (admin UIs served elsewhere)
    pub fn with_permissive_cors(self) -> Self {
        self.with_cors(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    }

    /// Build the final router
    pub fn build(self) -> Result<Router> {
        if self.registry.is_empty() {
            anyhow::bail!("No controller registered. Call .register() first");
        }

        tracing::debug!(controllers = ?self.registry.names(), "Building admin router");

        let registry = Arc::new(self.registry);
        let app = RestExposure::build_router(registry, self.custom_routes);

        let layers = ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .option_layer(self.cors);

        Ok(app.layer(layers))
    }

    /// Serve the application with graceful shutdown
    ///
    /// Binds to `addr` and stops on SIGTERM or Ctrl+C.
    pub async fn serve(self, addr: &str) -> Result<()> {
        let app = self.build()?;
        let listener = TcpListener::bind(addr).await?;

        tracing::info!("Server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

impl Default for AdminServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Wait for shutdown signal (SIGTERM or Ctrl+C)
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, initiating graceful shutdown...");
        },
    }
}
