//! CRUD controllers
//!
//! A [`CrudController`] exposes `create`, `get`, `list`, `remove`, `update`
//! and `getNewRecordValues` over one entity type. Its behaviour is shaped by
//! a [`ConfigOverrides`](crate::config::ConfigOverrides) resolved on each
//! call and by the collaborators in [`CrudServices`].

pub mod crud;
pub mod services;

pub use crud::{CrudConfigSource, CrudController};
pub use services::CrudServices;
