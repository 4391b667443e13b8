//! The hydration engine

use serde::Serialize;
use serde_json::{Map, Value};

use crate::hydration::accessor::{PropertyAccessor, type_of};
use crate::hydration::config::{
    GroupResult, GroupSelection, HydrationConfig, HydrationContext, HydrationGroup,
};
use crate::hydration::error::HydrationError;

/// Turns objects into client data according to a [`HydrationConfig`]
///
/// Hydration is a pure function of the object state, the configuration and
/// the selection: hydrating twice gives the same output.
#[derive(Debug, Clone, Copy, Default)]
pub struct HydrationService {
    accessor: PropertyAccessor,
}

/// The object being hydrated, serialized on first property read
struct Subject<'a, E> {
    object: &'a E,
    json: Option<Value>,
}

impl<E: Serialize> Subject<'_, E> {
    fn json(&mut self) -> Result<&Value, HydrationError> {
        let json = match self.json.take() {
            Some(json) => json,
            None => serde_json::to_value(self.object).map_err(|source| {
                HydrationError::Serialization {
                    type_name: std::any::type_name::<E>().to_string(),
                    source,
                }
            })?,
        };
        Ok(self.json.insert(json))
    }
}

impl HydrationService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_accessor(accessor: PropertyAccessor) -> Self {
        Self { accessor }
    }

    pub fn accessor(&self) -> &PropertyAccessor {
        &self.accessor
    }

    /// Hydrate `object` with `profile`
    ///
    /// Without `groups` the profile's own group list is used. With a single
    /// requested group its output is returned as is, whatever the profile's
    /// grouping mode. Several requested groups are combined with the
    /// profile's grouping mode.
    pub fn hydrate<E: Serialize>(
        &self,
        object: &E,
        config: &HydrationConfig<E>,
        profile: &str,
        groups: Option<&GroupSelection>,
    ) -> Result<Value, HydrationError> {
        let definition =
            config
                .get_profile(profile)
                .ok_or_else(|| HydrationError::UnknownProfile {
                    profile: profile.to_string(),
                })?;

        let mut subject = Subject { object, json: None };

        match groups.map(GroupSelection::names) {
            Some(names) if names.len() == 1 => {
                match self.run_group(&mut subject, config, profile, names[0])? {
                    GroupResult::Value(value) => Ok(value),
                    GroupResult::Transform(transform) => Ok(Value::Object(transform(Map::new()))),
                }
            }
            Some(names) => self.combine(
                &mut subject,
                config,
                profile,
                names,
                definition.is_grouping_needed(),
            ),
            None => self.combine(
                &mut subject,
                config,
                profile,
                definition.groups().iter().map(String::as_str),
                definition.is_grouping_needed(),
            ),
        }
    }

    fn combine<'n, E: Serialize>(
        &self,
        subject: &mut Subject<'_, E>,
        config: &HydrationConfig<E>,
        profile: &str,
        names: impl IntoIterator<Item = &'n str>,
        grouping_needed: bool,
    ) -> Result<Value, HydrationError> {
        let mut result = Map::new();

        for name in names {
            let output = self.run_group(subject, config, profile, name)?;

            if grouping_needed {
                match output {
                    GroupResult::Value(value) => {
                        result.insert(name.to_string(), value);
                    }
                    GroupResult::Transform(_) => {
                        return Err(HydrationError::InvalidGroupResult {
                            group: name.to_string(),
                            found: "a transform",
                            expected: "a value",
                        });
                    }
                }
                continue;
            }

            match output {
                GroupResult::Value(Value::Object(fields)) => result.extend(fields),
                GroupResult::Transform(transform) => result = transform(result),
                GroupResult::Value(other) => {
                    return Err(HydrationError::InvalidGroupResult {
                        group: name.to_string(),
                        found: type_of(&other),
                        expected: "an object or a transform",
                    });
                }
            }
        }

        Ok(Value::Object(result))
    }

    fn run_group<E: Serialize>(
        &self,
        subject: &mut Subject<'_, E>,
        config: &HydrationConfig<E>,
        profile: &str,
        name: &str,
    ) -> Result<GroupResult, HydrationError> {
        let group = config
            .get_group(name)
            .ok_or_else(|| HydrationError::UnknownGroup {
                group: name.to_string(),
            })?;

        match group {
            HydrationGroup::Properties(paths) => {
                let json = subject.json()?;
                let mut fields = Map::new();
                for (key, path) in paths {
                    let value = self.accessor.get_value(json, path).map_err(|source| {
                        HydrationError::Extraction {
                            path: path.clone(),
                            type_name: std::any::type_name::<E>().to_string(),
                            source,
                        }
                    })?;
                    fields.insert(key.clone(), value);
                }
                Ok(GroupResult::Value(Value::Object(fields)))
            }
            HydrationGroup::Hydrator(hydrator) => {
                let context = HydrationContext {
                    profile,
                    group: name,
                    accessor: &self.accessor,
                };
                hydrator(subject.object, &context).map_err(|e| HydrationError::HydratorFailed {
                    group: name.to_string(),
                    source: e.into(),
                })
            }
        }
    }
}
