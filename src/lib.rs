//! # This-Admin
//!
//! A generic CRUD admin layer: configurable controllers exposing create, get,
//! list, remove and update actions over entities, and a hydration engine
//! turning entities into client data.
//!
//! ## Features
//!
//! - **Configuration-Driven Pipeline**: every stage (entity creation, data
//!   mapping, validation, persistence, exception handling) is a hook with a
//!   default, overridable per controller without subclassing
//! - **Hydration Profiles**: named profiles of property-path or callable
//!   groups, merged flat or partitioned by group
//! - **Structured Errors**: bad requests carry the JSON pointer of the
//!   offending input and the original params
//! - **Configuration Files**: entity, flags and hydration loaded from YAML
//! - **HTTP Exposure**: `POST /{controller}/{action}` over axum
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use this_admin::prelude::*;
//!
//! impl_admin_entity!(
//!     Article,
//!     "article",
//!     {
//!         #[validate(length(min = 1))]
//!         title: String,
//!         body: String,
//!     }
//! );
//!
//! let hydration = HydrationConfig::new()
//!     .group("main", HydrationGroup::properties([("id", "id"), ("label", "title")]))
//!     .profile("list", HydrationProfile::flat(["main"]));
//!
//! let controller = CrudController::with_overrides(
//!     CrudServices::new(Arc::new(InMemoryPersistenceHandler::<Article>::new())),
//!     ConfigOverrides::for_entity().hydration(hydration),
//! );
//!
//! let response = controller.create_action(&json!({
//!     "record": { "title": "Hello" },
//!     "hydration": { "profile": "list" }
//! }))?;
//!
//! AdminServerBuilder::new()
//!     .register("articles", controller)
//!     .serve("127.0.0.1:3000")
//!     .await?;
//! ```

pub mod config;
pub mod controller;
pub mod core;
pub mod entities;
pub mod hydration;
pub mod logging;
pub mod server;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core Traits ===
    pub use crate::core::{
        entity::AdminEntity,
        error::{AdminError, AdminResult, BadRequestError, ConfigError, PersistenceError},
        exception::{DefaultExceptionHandler, ExceptionHandler},
        factory::{DefaultEntityFactory, EntityFactory},
        mapper::{DataMapper, JsonDataMapper},
        operation::Operation,
        persistence::{
            DefaultModelManager, ModelManager, OperationResult, PersistenceHandler,
        },
        validation::{EntityValidator, StandardEntityValidator, ValidationResult},
    };

    // === Macros ===
    pub use crate::impl_admin_entity;

    // === Config ===
    pub use crate::config::{ConfigOverrides, CrudConfig, prepare_config};

    // === Controllers ===
    pub use crate::controller::{CrudConfigSource, CrudController, CrudServices};

    // === Hydration ===
    pub use crate::hydration::{
        GroupResult, GroupSelection, HydrationConfig, HydrationContext, HydrationError,
        HydrationGroup, HydrationProfile, HydrationService, PropertyAccessor,
    };

    // === Storage ===
    pub use crate::storage::InMemoryPersistenceHandler;

    // === Server ===
    pub use crate::server::{AdminServerBuilder, ControllerRegistry, RemoteController};

    // === External dependencies ===
    pub use chrono::{DateTime, Utc};
    pub use serde::{Deserialize, Serialize};
    pub use serde_json::{Value, json};
    pub use std::sync::Arc;
    pub use uuid::Uuid;
    pub use validator::Validate;
}
