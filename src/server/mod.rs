//! Server module exposing CRUD controllers over HTTP
//!
//! This module provides an `AdminServerBuilder` that registers:
//! - one `POST /{controller}/{action}` route per registered controller
//! - an API description route (`GET /api`)
//! - health check routes

pub mod builder;
pub mod registry;
pub mod rest;

pub use builder::AdminServerBuilder;
pub use registry::{ControllerRegistry, RemoteController};
pub use rest::RestExposure;
