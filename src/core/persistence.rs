//! Persistence contract consumed by CRUD controllers
//!
//! The controller never talks to a storage engine directly: it goes through a
//! [`PersistenceHandler`] and receives an [`OperationResult`] describing what
//! changed. The result is serialized with the help of a [`ModelManager`],
//! which knows how client-side models are named.

use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value, json};
use std::sync::OnceLock;
use uuid::Uuid;

use crate::core::error::AdminResult;

/// Storage operations used by the CRUD pipeline
///
/// `params` is the raw request params; implementations pick what they
/// understand from it (filters, sorting, paging). All calls are synchronous
/// and no transaction spans several calls.
pub trait PersistenceHandler<E>: Send + Sync {
    /// Entities of `entity_type` matching `params`
    fn query(&self, entity_type: &str, params: &Value) -> AdminResult<Vec<E>>;

    /// Number of entities of `entity_type` matching `params`, ignoring paging
    fn get_count(&self, entity_type: &str, params: &Value) -> AdminResult<usize>;

    /// Store a new entity, assigning its identifier
    fn save(&self, entity: &mut E) -> AdminResult<OperationResult>;

    /// Store changes of an existing entity
    fn update(&self, entity: &mut E) -> AdminResult<OperationResult>;

    /// Remove every entity of `entity_type` matching `params`
    fn remove(&self, entity_type: &str, params: &Value) -> AdminResult<OperationResult>;
}

/// What happened to an entity during a write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Created,
    Updated,
    Removed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationEntry {
    pub entity_type: String,
    pub id: Uuid,
    pub kind: OperationKind,
}

/// Record of the entities touched by a persistence call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationResult {
    entries: Vec<OperationEntry>,
}

impl OperationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, entity_type: impl Into<String>, id: Uuid, kind: OperationKind) {
        self.entries.push(OperationEntry {
            entity_type: entity_type.into(),
            id,
            kind,
        });
    }

    pub fn report_created(&mut self, entity_type: impl Into<String>, id: Uuid) {
        self.report(entity_type, id, OperationKind::Created);
    }

    pub fn report_updated(&mut self, entity_type: impl Into<String>, id: Uuid) {
        self.report(entity_type, id, OperationKind::Updated);
    }

    pub fn report_removed(&mut self, entity_type: impl Into<String>, id: Uuid) {
        self.report(entity_type, id, OperationKind::Removed);
    }

    /// Append the entries of another result
    pub fn merge(&mut self, other: OperationResult) {
        self.entries.extend(other.entries);
    }

    pub fn entries(&self) -> &[OperationEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn created(&self) -> impl Iterator<Item = &OperationEntry> {
        self.of_kind(OperationKind::Created)
    }

    pub fn updated(&self) -> impl Iterator<Item = &OperationEntry> {
        self.of_kind(OperationKind::Updated)
    }

    pub fn removed(&self) -> impl Iterator<Item = &OperationEntry> {
        self.of_kind(OperationKind::Removed)
    }

    fn of_kind(&self, kind: OperationKind) -> impl Iterator<Item = &OperationEntry> {
        self.entries.iter().filter(move |e| e.kind == kind)
    }

    /// Response fragment merged into `{"success": true}`
    ///
    /// Contains `id` (first created entity, else first updated one) and the
    /// touched ids grouped by client model under `created_models`,
    /// `updated_models` and `removed_models`. Empty groups are omitted.
    pub fn to_map(&self, model_manager: &dyn ModelManager) -> Map<String, Value> {
        let mut map = Map::new();

        if let Some(primary) = self.created().next().or_else(|| self.updated().next()) {
            map.insert("id".to_string(), json!(primary.id));
        }

        for (key, kind) in [
            ("created_models", OperationKind::Created),
            ("updated_models", OperationKind::Updated),
            ("removed_models", OperationKind::Removed),
        ] {
            let mut models = Map::new();
            for entry in self.of_kind(kind) {
                let ids = models
                    .entry(model_manager.model_id(&entry.entity_type))
                    .or_insert_with(|| Value::Array(Vec::new()));
                if let Value::Array(ids) = ids {
                    ids.push(json!(entry.id));
                }
            }
            if !models.is_empty() {
                map.insert(key.to_string(), Value::Object(models));
            }
        }

        map
    }
}

/// Names client-side models after entity types
pub trait ModelManager: Send + Sync {
    fn model_id(&self, entity_type: &str) -> String;
}

/// Dotted, snake_cased model ids
///
/// `Acme\BlogBundle\Entity\Article` becomes `acme.blog_bundle.article`,
/// `blog::Article` becomes `blog.article`. `Entity`/`Entities` segments are
/// dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultModelManager;

impl ModelManager for DefaultModelManager {
    fn model_id(&self, entity_type: &str) -> String {
        static SEPARATORS: OnceLock<Regex> = OnceLock::new();
        static CAMEL: OnceLock<Regex> = OnceLock::new();
        let separators = SEPARATORS.get_or_init(|| Regex::new(r"::|[\\/.]").unwrap());
        let camel = CAMEL.get_or_init(|| Regex::new(r"([a-z0-9])([A-Z])").unwrap());

        separators
            .split(entity_type)
            .filter(|segment| !segment.is_empty())
            .filter(|segment| {
                !segment.eq_ignore_ascii_case("entity") && !segment.eq_ignore_ascii_case("entities")
            })
            .map(|segment| camel.replace_all(segment, "${1}_${2}").to_lowercase())
            .collect::<Vec<_>>()
            .join(".")
    }
}
