//! In-memory implementation of PersistenceHandler for testing and development

use chrono::Utc;
use indexmap::IndexMap;
use serde_json::Value;
use std::cmp::Ordering;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

use crate::core::entity::AdminEntity;
use crate::core::error::{AdminError, AdminResult, PersistenceError};
use crate::core::params::ListParams;
use crate::core::persistence::{OperationResult, PersistenceHandler};
use crate::hydration::PropertyAccessor;

const BACKEND: &str = "memory";

/// In-memory persistence for one entity type
///
/// Useful for testing and development. Uses RwLock for thread-safe access;
/// clones share the same records. Entities are kept in insertion order.
///
/// Queries understand the `filter`, `sort`, `start` and `limit` params
/// described in [`ListParams`]. Filter and sort fields are property paths
/// into the entity's JSON form (`author.name`, `tags[0]`).
pub struct InMemoryPersistenceHandler<E> {
    entity_type: String,
    records: Arc<RwLock<IndexMap<Uuid, E>>>,
}

impl<E> Clone for InMemoryPersistenceHandler<E> {
    fn clone(&self) -> Self {
        Self {
            entity_type: self.entity_type.clone(),
            records: Arc::clone(&self.records),
        }
    }
}

impl<E: AdminEntity> InMemoryPersistenceHandler<E> {
    /// Handler storing `E` under its own entity type
    pub fn new() -> Self {
        Self::for_entity_type(E::entity_type())
    }

    /// Handler answering queries for `entity_type`
    pub fn for_entity_type(entity_type: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            records: Arc::new(RwLock::new(IndexMap::new())),
        }
    }

    pub fn len(&self) -> AdminResult<usize> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> AdminResult<bool> {
        Ok(self.read()?.is_empty())
    }

    /// Stored entity by id
    pub fn find(&self, id: &Uuid) -> AdminResult<Option<E>> {
        Ok(self.read()?.get(id).cloned())
    }

    fn read(&self) -> AdminResult<RwLockReadGuard<'_, IndexMap<Uuid, E>>> {
        self.records.read().map_err(|e| {
            tracing::error!("Failed to acquire read lock: {}", e);
            AdminError::from(PersistenceError::Unavailable {
                backend: BACKEND.to_string(),
            })
        })
    }

    fn write(&self) -> AdminResult<RwLockWriteGuard<'_, IndexMap<Uuid, E>>> {
        self.records.write().map_err(|e| {
            tracing::error!("Failed to acquire write lock: {}", e);
            AdminError::from(PersistenceError::Unavailable {
                backend: BACKEND.to_string(),
            })
        })
    }

    /// Ids and JSON forms of the entities matching `filter`, sorted
    fn matching(&self, entity_type: &str, params: &Value) -> AdminResult<Vec<(Uuid, Value)>> {
        if entity_type != self.entity_type {
            tracing::debug!(
                requested = entity_type,
                stored = %self.entity_type,
                "Query for another entity type"
            );
            return Ok(Vec::new());
        }

        let list = ListParams::from_params(params);
        let filter = match &list.filter {
            None => None,
            Some(Value::Object(fields)) => Some(fields),
            Some(_) => {
                return Err(AdminError::bad_request(
                    "Filter must be an object",
                    "/filter",
                    params,
                ));
            }
        };

        let records = self.read()?;
        let mut matches = Vec::new();
        for (id, entity) in records.iter() {
            let json = serde_json::to_value(entity)?;
            let keep = filter.is_none_or(|fields| {
                fields
                    .iter()
                    .all(|(key, expected)| matches_filter(&json, key, expected))
            });
            if keep {
                matches.push((*id, json));
            }
        }
        drop(records);

        Ok(apply_sort(matches, &list.sort))
    }
}

impl<E: AdminEntity> Default for InMemoryPersistenceHandler<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: AdminEntity> PersistenceHandler<E> for InMemoryPersistenceHandler<E> {
    fn query(&self, entity_type: &str, params: &Value) -> AdminResult<Vec<E>> {
        let list = ListParams::from_params(params);
        let ids: Vec<Uuid> = self
            .matching(entity_type, params)?
            .into_iter()
            .skip(list.start)
            .take(list.limit.unwrap_or(usize::MAX))
            .map(|(id, _)| id)
            .collect();

        let records = self.read()?;
        Ok(ids.iter().filter_map(|id| records.get(id).cloned()).collect())
    }

    fn get_count(&self, entity_type: &str, params: &Value) -> AdminResult<usize> {
        Ok(self.matching(entity_type, params)?.len())
    }

    fn save(&self, entity: &mut E) -> AdminResult<OperationResult> {
        let id = match entity.id() {
            Some(id) => id,
            None => {
                let id = Uuid::new_v4();
                entity.assign_id(id);
                id
            }
        };
        entity.touch(Utc::now());

        let mut records = self.write()?;
        if records.contains_key(&id) {
            return Err(PersistenceError::IntegrityError {
                message: format!("{} {} already exists", self.entity_type, id),
            }
            .into());
        }
        records.insert(id, entity.clone());

        let mut result = OperationResult::new();
        result.report_created(&self.entity_type, id);
        Ok(result)
    }

    fn update(&self, entity: &mut E) -> AdminResult<OperationResult> {
        let id = entity.id().ok_or_else(|| PersistenceError::WriteError {
            backend: BACKEND.to_string(),
            operation: "update".to_string(),
            message: format!("{} has no id", self.entity_type),
        })?;
        entity.touch(Utc::now());

        let mut records = self.write()?;
        let stored = records.get_mut(&id).ok_or_else(|| PersistenceError::WriteError {
            backend: BACKEND.to_string(),
            operation: "update".to_string(),
            message: format!("{} {} not found", self.entity_type, id),
        })?;
        *stored = entity.clone();

        let mut result = OperationResult::new();
        result.report_updated(&self.entity_type, id);
        Ok(result)
    }

    /// Removes the entities matching `filter`; a missing filter is rejected
    /// rather than clearing the store
    fn remove(&self, entity_type: &str, params: &Value) -> AdminResult<OperationResult> {
        if params.get("filter").is_none_or(Value::is_null) {
            return Err(AdminError::bad_request(
                "'/filter' is not provided",
                "/filter",
                params,
            ));
        }

        let ids: Vec<Uuid> = self
            .matching(entity_type, params)?
            .into_iter()
            .map(|(id, _)| id)
            .collect();

        let mut records = self.write()?;
        let mut result = OperationResult::new();
        for id in ids {
            if records.shift_remove(&id).is_some() {
                result.report_removed(&self.entity_type, id);
            }
        }
        Ok(result)
    }
}

/// Filter key operators, longest first
const OPERATORS: [&str; 5] = [">=", "<=", "!=", ">", "<"];

fn matches_filter(json: &Value, key: &str, expected: &Value) -> bool {
    let (field, operator) = OPERATORS
        .iter()
        .find_map(|op| key.strip_suffix(op).map(|field| (field, *op)))
        .unwrap_or((key, "="));

    let Ok(actual) = PropertyAccessor::new().get_value(json, field) else {
        return false;
    };

    match operator {
        "=" => values_equal(&actual, expected),
        "!=" => !values_equal(&actual, expected),
        op => match compare_values(&actual, expected) {
            Some(ordering) => match op {
                ">" => ordering == Ordering::Greater,
                "<" => ordering == Ordering::Less,
                ">=" => ordering != Ordering::Less,
                "<=" => ordering != Ordering::Greater,
                _ => false,
            },
            None => false,
        },
    }
}

/// Equality with numbers compared by value (`1` equals `1.0`)
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

/// Ordering of two scalars of the same kind
fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Total order for sorting: values of different kinds are ranked
/// bool < number < string < array < object
fn sort_order(a: &Value, b: &Value) -> Ordering {
    fn rank(value: &Value) -> u8 {
        match value {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }

    rank(a)
        .cmp(&rank(b))
        .then_with(|| compare_values(a, b).unwrap_or(Ordering::Equal))
}

/// Sort by each `field[:asc|:desc]` in turn; nulls and missing fields last
fn apply_sort(mut data: Vec<(Uuid, Value)>, sort: &[String]) -> Vec<(Uuid, Value)> {
    if sort.is_empty() {
        return data;
    }

    let keys: Vec<(&str, bool)> = sort
        .iter()
        .map(|spec| match spec.rsplit_once(':') {
            Some((field, "desc")) => (field, true),
            Some((field, "asc")) => (field, false),
            _ => (spec.as_str(), false),
        })
        .collect();

    let accessor = PropertyAccessor::new();
    data.sort_by(|(_, a), (_, b)| {
        for (field, descending) in &keys {
            let x = accessor.get_value(a, field).unwrap_or(Value::Null);
            let y = accessor.get_value(b, field).unwrap_or(Value::Null);
            let ordering = match (x.is_null(), y.is_null()) {
                (true, true) => Ordering::Equal,
                (true, false) => return Ordering::Greater,
                (false, true) => return Ordering::Less,
                (false, false) => sort_order(&x, &y),
            };
            let ordering = if *descending { ordering.reverse() } else { ordering };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });

    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Serialize};
    use serde_json::json;
    use validator::Validate;

    #[derive(Clone, Debug, Default, Serialize, Deserialize, Validate)]
    struct Product {
        id: Option<Uuid>,
        name: String,
        price: f64,
        category: Option<String>,
        updated_at: Option<DateTime<Utc>>,
    }

    impl AdminEntity for Product {
        fn entity_type() -> &'static str {
            "product"
        }

        fn id(&self) -> Option<Uuid> {
            self.id
        }

        fn assign_id(&mut self, id: Uuid) {
            self.id = Some(id);
        }

        fn touch(&mut self, now: DateTime<Utc>) {
            self.updated_at = Some(now);
        }
    }

    fn product(name: &str, price: f64, category: Option<&str>) -> Product {
        Product {
            name: name.to_string(),
            price,
            category: category.map(str::to_string),
            ..Product::default()
        }
    }

    fn seeded() -> InMemoryPersistenceHandler<Product> {
        let store = InMemoryPersistenceHandler::new();
        for mut p in [
            product("Lamp", 30.0, Some("home")),
            product("Desk", 120.0, Some("home")),
            product("Pen", 2.5, Some("office")),
            product("Gift card", 50.0, None),
        ] {
            store.save(&mut p).unwrap();
        }
        store
    }

    fn names(items: &[Product]) -> Vec<&str> {
        items.iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn test_save_assigns_id_and_timestamp() {
        let store = InMemoryPersistenceHandler::<Product>::new();
        let mut lamp = product("Lamp", 30.0, None);

        let result = store.save(&mut lamp).unwrap();

        let id = lamp.id.unwrap();
        assert!(lamp.updated_at.is_some());
        assert_eq!(result.created().next().unwrap().id, id);
        assert_eq!(store.find(&id).unwrap().unwrap().name, "Lamp");
    }

    #[test]
    fn test_save_twice_is_integrity_error() {
        let store = InMemoryPersistenceHandler::<Product>::new();
        let mut lamp = product("Lamp", 30.0, None);
        store.save(&mut lamp).unwrap();

        let err = store.save(&mut lamp).unwrap_err();
        assert!(matches!(
            err,
            AdminError::Persistence(PersistenceError::IntegrityError { .. })
        ));
    }

    #[test]
    fn test_query_exact_and_comparison_filters() {
        let store = seeded();

        let home = store
            .query("product", &json!({ "filter": { "category": "home" } }))
            .unwrap();
        assert_eq!(names(&home), ["Lamp", "Desk"]);

        let cheap = store
            .query("product", &json!({ "filter": { "price<": 50 } }))
            .unwrap();
        assert_eq!(names(&cheap), ["Lamp", "Pen"]);

        let mid = store
            .query("product", &json!({ "filter": { "price>=": 30, "price!=": 120 } }))
            .unwrap();
        assert_eq!(names(&mid), ["Lamp", "Gift card"]);
    }

    #[test]
    fn test_query_sort_and_paging() {
        let store = seeded();
        let params = json!({ "sort": "price:desc", "start": 1, "limit": 2 });

        assert_eq!(names(&store.query("product", &params).unwrap()), ["Gift card", "Lamp"]);
        assert_eq!(store.get_count("product", &params).unwrap(), 4);
    }

    #[test]
    fn test_sort_puts_missing_values_last() {
        let store = seeded();
        let items = store
            .query("product", &json!({ "sort": ["category", "name"] }))
            .unwrap();
        assert_eq!(names(&items), ["Desk", "Lamp", "Pen", "Gift card"]);
    }

    #[test]
    fn test_sort_ranks_mixed_value_kinds() {
        let data: Vec<(Uuid, Value)> = [
            json!({ "v": "b" }),
            json!({ "v": 2 }),
            json!({ "v": true }),
            json!({ "v": [1] }),
            json!({}),
            json!({ "v": "a" }),
            json!({ "v": 1.5 }),
            json!({ "v": { "k": 1 } }),
        ]
        .into_iter()
        .map(|json| (Uuid::new_v4(), json))
        .collect();

        let sorted: Vec<Value> = apply_sort(data.clone(), &["v".to_string()])
            .into_iter()
            .map(|(_, json)| json.get("v").cloned().unwrap_or(Value::Null))
            .collect();
        assert_eq!(
            sorted,
            [
                json!(true),
                json!(1.5),
                json!(2),
                json!("a"),
                json!("b"),
                json!([1]),
                json!({ "k": 1 }),
                Value::Null,
            ]
        );

        let descending: Vec<Value> = apply_sort(data, &["v:desc".to_string()])
            .into_iter()
            .map(|(_, json)| json.get("v").cloned().unwrap_or(Value::Null))
            .collect();
        assert_eq!(descending.first(), Some(&json!({ "k": 1 })));
        assert_eq!(descending.last(), Some(&Value::Null));
    }

    #[test]
    fn test_other_entity_type_matches_nothing() {
        let store = seeded();
        assert!(store.query("order", &json!({})).unwrap().is_empty());
        assert_eq!(store.get_count("order", &json!({})).unwrap(), 0);
    }

    #[test]
    fn test_filter_must_be_object() {
        let err = seeded()
            .query("product", &json!({ "filter": "home" }))
            .unwrap_err();
        assert!(matches!(err, AdminError::BadRequest(ref e) if e.path() == "/filter"));
    }

    #[test]
    fn test_update_replaces_stored_entity() {
        let store = seeded();
        let mut pen = store
            .query("product", &json!({ "filter": { "name": "Pen" } }))
            .unwrap()
            .remove(0);
        pen.price = 3.0;

        let result = store.update(&mut pen).unwrap();

        assert_eq!(result.updated().count(), 1);
        assert_eq!(store.find(&pen.id.unwrap()).unwrap().unwrap().price, 3.0);
    }

    #[test]
    fn test_update_unknown_entity_fails() {
        let store = seeded();
        let mut ghost = product("Ghost", 1.0, None);
        ghost.id = Some(Uuid::new_v4());

        assert!(matches!(
            store.update(&mut ghost),
            Err(AdminError::Persistence(PersistenceError::WriteError { .. }))
        ));
    }

    #[test]
    fn test_remove_by_filter() {
        let store = seeded();
        let result = store
            .remove("product", &json!({ "filter": { "category": "home" } }))
            .unwrap();

        assert_eq!(result.removed().count(), 2);
        assert_eq!(store.len().unwrap(), 2);
    }

    #[test]
    fn test_remove_requires_filter() {
        let store = seeded();
        assert!(store.remove("product", &json!({})).is_err());
        assert_eq!(store.len().unwrap(), 4);
    }
}
