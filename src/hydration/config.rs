//! Hydration configuration: profiles and groups
//!
//! A *group* knows how to turn an object into one piece of client data,
//! either by reading a set of property paths or by running a callable.
//! A *profile* is an ordered list of groups plus a flag telling whether the
//! group outputs are kept apart (`{"group": {...}}`) or merged flat.
//!
//! ```rust,ignore
//! let hydration = HydrationConfig::<Article>::new()
//!     .group("list", HydrationGroup::properties([("id", "id"), ("title", "title")]))
//!     .group("author", HydrationGroup::paths(["author.name", "author.email"]))
//!     .group("stats", HydrationGroup::hydrator(|article: &Article, _ctx: &HydrationContext<'_>| {
//!         Ok(json!({ "words": article.body.split_whitespace().count() }).into())
//!     }))
//!     .profile("list", HydrationProfile::flat(["list"]))
//!     .profile("form", HydrationProfile::grouped(["list", "author", "stats"]));
//! ```

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

use crate::hydration::accessor::PropertyAccessor;

/// Named, ordered selection of groups
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HydrationProfile {
    groups: Vec<String>,
    grouping_needed: bool,
}

impl HydrationProfile {
    pub fn new<I, S>(groups: I, grouping_needed: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            groups: groups.into_iter().map(Into::into).collect(),
            grouping_needed,
        }
    }

    /// Group outputs merged into a single mapping
    pub fn flat<I, S>(groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(groups, false)
    }

    /// Group outputs stored under their group name
    pub fn grouped<I, S>(groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(groups, true)
    }

    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    pub fn is_grouping_needed(&self) -> bool {
        self.grouping_needed
    }
}

/// Post-processing function applied to the accumulated flat result
pub type TransformFn = Arc<dyn Fn(Map<String, Value>) -> Map<String, Value> + Send + Sync>;

/// Output of one group
#[derive(Clone)]
pub enum GroupResult {
    /// Plain data. Flat profiles require a JSON object.
    Value(Value),
    /// Rewrites the result accumulated so far (flat profiles only)
    Transform(TransformFn),
}

impl GroupResult {
    pub fn transform<F>(f: F) -> Self
    where
        F: Fn(Map<String, Value>) -> Map<String, Value> + Send + Sync + 'static,
    {
        GroupResult::Transform(Arc::new(f))
    }
}

impl From<Value> for GroupResult {
    fn from(value: Value) -> Self {
        GroupResult::Value(value)
    }
}

impl From<Map<String, Value>> for GroupResult {
    fn from(map: Map<String, Value>) -> Self {
        GroupResult::Value(Value::Object(map))
    }
}

impl fmt::Debug for GroupResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupResult::Value(value) => f.debug_tuple("Value").field(value).finish(),
            GroupResult::Transform(_) => f.write_str("Transform(..)"),
        }
    }
}

/// What a callable group gets besides the object
#[derive(Debug, Clone, Copy)]
pub struct HydrationContext<'a> {
    /// Profile being hydrated
    pub profile: &'a str,
    /// Group being invoked
    pub group: &'a str,
    /// Accessor the engine uses for property groups
    pub accessor: &'a PropertyAccessor,
}

pub type GroupHydrator<E> =
    Arc<dyn Fn(&E, &HydrationContext<'_>) -> anyhow::Result<GroupResult> + Send + Sync>;

/// How one group extracts data
pub enum HydrationGroup<E> {
    /// Output key → property path
    Properties(IndexMap<String, String>),
    /// Arbitrary callable
    Hydrator(GroupHydrator<E>),
}

impl<E> HydrationGroup<E> {
    /// Property group from `(output key, path)` pairs
    ///
    /// Numeric keys are positional: the path itself becomes the output key.
    pub fn properties<I, K, P>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, P)>,
        K: Into<String>,
        P: Into<String>,
    {
        HydrationGroup::Properties(
            pairs
                .into_iter()
                .map(|(key, path)| {
                    let (key, path) = (key.into(), path.into());
                    if !key.is_empty() && key.bytes().all(|b| b.is_ascii_digit()) {
                        (path.clone(), path)
                    } else {
                        (key, path)
                    }
                })
                .collect(),
        )
    }

    /// Property group where each path is also its output key
    pub fn paths<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        HydrationGroup::Properties(
            paths
                .into_iter()
                .map(|path| {
                    let path = path.into();
                    (path.clone(), path)
                })
                .collect(),
        )
    }

    pub fn hydrator<F>(f: F) -> Self
    where
        F: Fn(&E, &HydrationContext<'_>) -> anyhow::Result<GroupResult> + Send + Sync + 'static,
    {
        HydrationGroup::Hydrator(Arc::new(f))
    }
}

impl<E> Clone for HydrationGroup<E> {
    fn clone(&self) -> Self {
        match self {
            HydrationGroup::Properties(paths) => HydrationGroup::Properties(paths.clone()),
            HydrationGroup::Hydrator(f) => HydrationGroup::Hydrator(Arc::clone(f)),
        }
    }
}

impl<E> fmt::Debug for HydrationGroup<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HydrationGroup::Properties(paths) => {
                f.debug_tuple("Properties").field(paths).finish()
            }
            HydrationGroup::Hydrator(_) => f.write_str("Hydrator(..)"),
        }
    }
}

/// Profiles and groups available to a controller
pub struct HydrationConfig<E> {
    profiles: IndexMap<String, HydrationProfile>,
    groups: IndexMap<String, HydrationGroup<E>>,
}

impl<E> HydrationConfig<E> {
    pub fn new() -> Self {
        Self {
            profiles: IndexMap::new(),
            groups: IndexMap::new(),
        }
    }

    pub fn profile(mut self, name: impl Into<String>, profile: HydrationProfile) -> Self {
        self.profiles.insert(name.into(), profile);
        self
    }

    pub fn group(mut self, name: impl Into<String>, group: HydrationGroup<E>) -> Self {
        self.groups.insert(name.into(), group);
        self
    }

    pub fn get_profile(&self, name: &str) -> Option<&HydrationProfile> {
        self.profiles.get(name)
    }

    pub fn get_group(&self, name: &str) -> Option<&HydrationGroup<E>> {
        self.groups.get(name)
    }

    pub fn profile_names(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }

    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    /// Add the profiles and groups of `other`, replacing same-named ones
    pub fn merge(mut self, other: HydrationConfig<E>) -> Self {
        self.profiles.extend(other.profiles);
        self.groups.extend(other.groups);
        self
    }
}

impl<E> Default for HydrationConfig<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for HydrationConfig<E> {
    fn clone(&self) -> Self {
        Self {
            profiles: self.profiles.clone(),
            groups: self.groups.clone(),
        }
    }
}

impl<E> fmt::Debug for HydrationConfig<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HydrationConfig")
            .field("profiles", &self.profiles)
            .field("groups", &self.groups)
            .finish()
    }
}

/// Groups requested by a client: one name or a list of names
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum GroupSelection {
    One(String),
    Many(Vec<String>),
}

impl GroupSelection {
    pub fn names(&self) -> Vec<&str> {
        match self {
            GroupSelection::One(name) => vec![name.as_str()],
            GroupSelection::Many(names) => names.iter().map(String::as_str).collect(),
        }
    }
}

impl From<&str> for GroupSelection {
    fn from(name: &str) -> Self {
        GroupSelection::One(name.to_string())
    }
}

impl From<Vec<&str>> for GroupSelection {
    fn from(names: Vec<&str>) -> Self {
        GroupSelection::Many(names.into_iter().map(str::to_string).collect())
    }
}

// =============================================================================
// Declarative (YAML) form
// =============================================================================

/// Profile as written in a configuration file
///
/// ```yaml
/// list: [main]                 # flat
/// form:
///   groups: [main, author]
///   grouping_needed: true
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ProfileSpec {
    Groups(Vec<String>),
    Full {
        groups: Vec<String>,
        #[serde(default)]
        grouping_needed: bool,
    },
}

/// Property group as written in a configuration file
///
/// ```yaml
/// main: { id: id, label: name }   # output key -> path
/// author: [author.name]           # path is the key
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum GroupSpec {
    Paths(Vec<String>),
    Properties(IndexMap<String, String>),
}

/// `hydration` section of a configuration file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HydrationSpec {
    #[serde(default)]
    pub profiles: IndexMap<String, ProfileSpec>,
    #[serde(default)]
    pub groups: IndexMap<String, GroupSpec>,
}

impl HydrationSpec {
    pub fn into_config<E>(self) -> HydrationConfig<E> {
        let mut config = HydrationConfig::new();

        for (name, group) in self.groups {
            let group = match group {
                GroupSpec::Paths(paths) => HydrationGroup::paths(paths),
                GroupSpec::Properties(pairs) => HydrationGroup::properties(pairs),
            };
            config = config.group(name, group);
        }

        for (name, profile) in self.profiles {
            let profile = match profile {
                ProfileSpec::Groups(groups) => HydrationProfile::flat(groups),
                ProfileSpec::Full {
                    groups,
                    grouping_needed,
                } => HydrationProfile::new(groups, grouping_needed),
            };
            config = config.profile(name, profile);
        }

        config
    }
}
