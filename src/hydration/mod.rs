//! Hydration: turning domain objects into client data
//!
//! A [`HydrationConfig`] names *profiles* (ordered group lists) and *groups*
//! (property-path extractions or callables). The [`HydrationService`] runs a
//! profile, or an explicit selection of groups, against an object.

pub mod accessor;
pub mod config;
pub mod error;
pub mod service;

pub use accessor::{PathSegment, PropertyAccessor, PropertyPath, PropertyPathError};
pub use config::{
    GroupHydrator, GroupResult, GroupSelection, GroupSpec, HydrationConfig, HydrationContext,
    HydrationGroup, HydrationProfile, HydrationSpec, ProfileSpec, TransformFn,
};
pub use error::HydrationError;
pub use service::HydrationService;
