//! Request parameter helpers
//!
//! Actions receive a single JSON object. The keys the pipeline itself
//! understands are:
//!
//! ```text
//! {
//!     "record":    { ... },                              // create, update
//!     "filter":    { "status": "active", "price>": 10 }, // get, list, update, remove
//!     "sort":      "created_at:desc",                    // list
//!     "start":     0,                                     // list
//!     "limit":     25,                                    // list
//!     "hydration": { "profile": "list", "group": "main" }
//! }
//! ```
//!
//! Anything else is passed through untouched to the configured strategies.

use serde_json::Value;

use crate::core::error::{AdminError, AdminResult};
use crate::hydration::GroupSelection;

/// Maximum page size honoured by `limit`
pub const MAX_LIMIT: usize = 1000;

/// Look up a key, treating an explicit `null` like a missing key
fn present<'a>(params: &'a Value, key: &str) -> Option<&'a Value> {
    params.get(key).filter(|v| !v.is_null())
}

/// The `record` to map onto an entity
pub fn record(params: &Value) -> AdminResult<&Value> {
    present(params, "record")
        .ok_or_else(|| AdminError::bad_request("'/record' is not provided", "/record", params))
}

/// Which profile and groups the client asked hydration for
#[derive(Debug, Clone, PartialEq)]
pub struct HydrationRequest {
    pub profile: String,
    pub groups: Option<GroupSelection>,
}

impl HydrationRequest {
    /// Whether the params carry a `hydration` section at all
    pub fn is_requested(params: &Value) -> bool {
        present(params, "hydration").is_some()
    }

    /// Read `hydration.profile` and the optional `hydration.group`
    pub fn from_params(params: &Value) -> AdminResult<Self> {
        let hydration = present(params, "hydration");

        let profile = hydration
            .and_then(|h| present(h, "profile"))
            .ok_or_else(|| {
                AdminError::bad_request(
                    "Hydration profile is not specified.",
                    "/hydration/profile",
                    params,
                )
            })?
            .as_str()
            .ok_or_else(|| {
                AdminError::bad_request(
                    "Hydration profile must be a string.",
                    "/hydration/profile",
                    params,
                )
            })?
            .to_string();

        let groups = match hydration.and_then(|h| present(h, "group")) {
            Some(group) => Some(serde_json::from_value(group.clone()).map_err(|_| {
                AdminError::bad_request(
                    "Hydration group must be a name or a list of names.",
                    "/hydration/group",
                    params,
                )
            })?),
            None => None,
        };

        Ok(Self { profile, groups })
    }

    /// Whether `group` was explicitly asked for
    pub fn requests_group(&self, group: &str) -> bool {
        self.groups
            .as_ref()
            .is_some_and(|selection| selection.names().contains(&group))
    }
}

/// Filtering, sorting and paging read from list-style params
///
/// # Format
/// - `filter`: exact match `{"field": value}`, comparison
///   `{"field>": v, "field<": v, "field>=": v, "field<=": v, "field!=": v}`
/// - `sort`: `"field"`, `"field:asc"`, `"field:desc"`, or a list of those
/// - `start`: offset of the first item (default 0)
/// - `limit`: page size, capped at [`MAX_LIMIT`] (default: no paging)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListParams {
    pub filter: Option<Value>,
    pub sort: Vec<String>,
    pub start: usize,
    pub limit: Option<usize>,
}

impl ListParams {
    pub fn from_params(params: &Value) -> Self {
        let sort = match present(params, "sort") {
            Some(Value::String(s)) => vec![s.clone()],
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        };

        Self {
            filter: present(params, "filter").cloned(),
            sort,
            start: present(params, "start")
                .and_then(Value::as_u64)
                .map(|s| s as usize)
                .unwrap_or(0),
            limit: present(params, "limit")
                .and_then(Value::as_u64)
                .map(|l| (l as usize).clamp(1, MAX_LIMIT)),
        }
    }
}

/// `params` with `start` and `limit` removed
///
/// Lookups that must see every match (get, update) query with these.
pub fn without_paging(params: &Value) -> Value {
    let mut unpaged = params.clone();
    if let Value::Object(map) = &mut unpaged {
        map.shift_remove("start");
        map.shift_remove("limit");
    }
    unpaged
}
