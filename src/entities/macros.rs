//! Macros for reducing boilerplate when defining entities
//!
//! These macros generate the struct and the `AdminEntity` implementation
//! needed for each entity type managed by a CRUD controller.

/// Complete macro to create an admin entity with automatic trait implementations
///
/// Fields accept `validator` attributes. Every field must implement
/// `Default`, which is what the default entity factory hands out. An
/// optional `validate_with` function receives the configured
/// `entity_validation_method` and the validation result to fill.
///
/// # Example
///
/// ```rust,ignore
/// use this_admin::prelude::*;
///
/// impl_admin_entity!(
///     Article,
///     "article",
///     {
///         #[validate(length(min = 1))]
///         title: String,
///         body: String,
///         tags: Vec<String>,
///     }
/// );
///
/// fn check_author(author: &Author, method: &str, result: &mut ValidationResult) {
///     if method == "validate" && author.email.is_empty() {
///         result.add_field_error("email", "is required");
///     }
/// }
///
/// impl_admin_entity!(
///     Author,
///     "author",
///     validate_with = check_author,
///     {
///         name: String,
///         email: String,
///     }
/// );
/// ```
#[macro_export]
macro_rules! impl_admin_entity {
    (@struct $type:ident, { $( $(#[$field_attr:meta])* $field:ident : $field_type:ty ),* }) => {
        #[derive(
            Debug,
            Clone,
            Default,
            ::serde::Serialize,
            ::serde::Deserialize,
            ::validator::Validate,
        )]
        pub struct $type {
            /// Identifier, assigned on first save
            #[serde(default)]
            pub id: Option<::uuid::Uuid>,

            /// When this entity was first saved
            #[serde(default)]
            pub created_at: Option<::chrono::DateTime<::chrono::Utc>>,

            /// When this entity was last saved
            #[serde(default)]
            pub updated_at: Option<::chrono::DateTime<::chrono::Utc>>,

            $(
                $(#[$field_attr])*
                #[serde(default)]
                pub $field : $field_type,
            )*
        }
    };

    (@entity $type:ident, $type_name:expr, { $($extra:tt)* }) => {
        impl $crate::core::entity::AdminEntity for $type {
            fn entity_type() -> &'static str {
                $type_name
            }

            fn id(&self) -> Option<::uuid::Uuid> {
                self.id
            }

            fn assign_id(&mut self, id: ::uuid::Uuid) {
                self.id = Some(id);
            }

            fn touch(&mut self, now: ::chrono::DateTime<::chrono::Utc>) {
                if self.created_at.is_none() {
                    self.created_at = Some(now);
                }
                self.updated_at = Some(now);
            }

            $($extra)*
        }
    };

    (
        $type:ident,
        $type_name:expr,
        {
            $( $(#[$field_attr:meta])* $field:ident : $field_type:ty ),* $(,)?
        }
    ) => {
        $crate::impl_admin_entity!(@struct $type, { $( $(#[$field_attr])* $field : $field_type ),* });
        $crate::impl_admin_entity!(@entity $type, $type_name, {});
    };

    (
        $type:ident,
        $type_name:expr,
        validate_with = $validator:path,
        {
            $( $(#[$field_attr:meta])* $field:ident : $field_type:ty ),* $(,)?
        }
    ) => {
        $crate::impl_admin_entity!(@struct $type, { $( $(#[$field_attr])* $field : $field_type ),* });
        $crate::impl_admin_entity!(@entity $type, $type_name, {
            fn validate_with(
                &self,
                method: &str,
                result: &mut $crate::core::validation::ValidationResult,
            ) {
                $validator(self, method, result)
            }
        });
    };
}
