//! Entity trait defining what admin controllers can manage

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;
use validator::Validate;

use crate::core::validation::ValidationResult;

/// Base trait for every entity managed by a CRUD controller.
///
/// Entities travel through the pipeline as plain Rust values:
/// - `Default` gives the default entity factory a fresh instance
/// - `Serialize`/`DeserializeOwned` back the default data mapper and the
///   property paths used by hydration
/// - `Validate` is the standard validator run before persisting
///
/// The `impl_admin_entity!` macro generates a conforming struct.
pub trait AdminEntity:
    Serialize + DeserializeOwned + Validate + Default + Clone + Send + Sync + 'static
{
    /// The entity type name (e.g., "article", "user")
    fn entity_type() -> &'static str;

    /// Identifier, `None` until the entity has been saved
    fn id(&self) -> Option<Uuid>;

    /// Assign the identifier generated by the persistence layer
    fn assign_id(&mut self, id: Uuid);

    /// Record a write at `now`. Entities without timestamps ignore it.
    fn touch(&mut self, _now: DateTime<Utc>) {}

    /// Entity-level validation invoked by the standard validator.
    ///
    /// `method` is the configured `entity_validation_method` (default
    /// `"validate"`), letting one entity expose several validation routines.
    /// Unknown method names are ignored.
    fn validate_with(&self, _method: &str, _result: &mut ValidationResult) {}
}
