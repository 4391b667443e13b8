//! Property-path access over the JSON form of an object
//!
//! A path is a sequence of dotted property reads and bracketed index reads:
//!
//! ```text
//! title                 -> object["title"]
//! author.name           -> object["author"]["name"]
//! tags[0]               -> object["tags"][0]
//! [meta][origin]        -> object["meta"]["origin"]
//! comments[1].author.id -> object["comments"][1]["author"]["id"]
//! ```
//!
//! Dotted reads require the property to exist. Bracketed reads of a missing
//! index yield `null`, unless the accessor is built with
//! [`PropertyAccessor::with_exception_on_invalid_index`].

use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Failure to parse or follow a property path
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PropertyPathError {
    #[error("Invalid property path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("Property '{property}' does not exist (path '{path}')")]
    NoSuchProperty { path: String, property: String },

    #[error("Index '{index}' does not exist (path '{path}')")]
    NoSuchIndex { path: String, index: String },

    #[error("Cannot read '{segment}' of a {found} value (path '{path}')")]
    UnexpectedType {
        path: String,
        segment: String,
        found: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// `.name` or a leading `name`
    Property(String),
    /// `[key]`
    Index(String),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Property(name) => f.write_str(name),
            PathSegment::Index(key) => write!(f, "[{}]", key),
        }
    }
}

/// A parsed property path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyPath {
    raw: String,
    segments: Vec<PathSegment>,
}

impl PropertyPath {
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for PropertyPath {
    type Err = PropertyPathError;

    fn from_str(path: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| PropertyPathError::InvalidPath {
            path: path.to_string(),
            reason: reason.to_string(),
        };

        if path.is_empty() {
            return Err(invalid("path is empty"));
        }

        let mut segments = Vec::new();
        let mut chars = path.chars().peekable();
        let mut expect_property = !path.starts_with('[');

        while chars.peek().is_some() {
            if expect_property {
                let mut name = String::new();
                while let Some(&c) = chars.peek() {
                    if c == '.' || c == '[' {
                        break;
                    }
                    if c == ']' {
                        return Err(invalid("unexpected ']'"));
                    }
                    name.push(c);
                    chars.next();
                }
                if name.is_empty() {
                    return Err(invalid("empty property name"));
                }
                segments.push(PathSegment::Property(name));
                expect_property = false;
                continue;
            }

            match chars.next() {
                Some('.') => {
                    if chars.peek().is_none() {
                        return Err(invalid("path ends with '.'"));
                    }
                    expect_property = true;
                }
                Some('[') => {
                    let mut key = String::new();
                    loop {
                        match chars.next() {
                            Some(']') => break,
                            Some('[') => return Err(invalid("nested '['")),
                            Some(c) => key.push(c),
                            None => return Err(invalid("unclosed '['")),
                        }
                    }
                    if key.is_empty() {
                        return Err(invalid("empty index"));
                    }
                    segments.push(PathSegment::Index(key));
                }
                Some(c) => return Err(invalid(&format!("unexpected '{}'", c))),
                None => break,
            }
        }

        Ok(Self {
            raw: path.to_string(),
            segments,
        })
    }
}

pub(crate) fn type_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Reads values out of JSON object graphs by property path
#[derive(Debug, Clone, Copy, Default)]
pub struct PropertyAccessor {
    exception_on_invalid_index: bool,
}

impl PropertyAccessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail on missing bracketed indexes instead of yielding `null`
    pub fn with_exception_on_invalid_index(mut self) -> Self {
        self.exception_on_invalid_index = true;
        self
    }

    /// Parse `path` and read it from `object`
    pub fn get_value(&self, object: &Value, path: &str) -> Result<Value, PropertyPathError> {
        let path: PropertyPath = path.parse()?;
        self.read(object, &path)
    }

    /// Read an already parsed path from `object`
    pub fn read(&self, object: &Value, path: &PropertyPath) -> Result<Value, PropertyPathError> {
        let mut current = object;

        for segment in path.segments() {
            current = match (segment, current) {
                (PathSegment::Property(name), Value::Object(map)) => {
                    map.get(name)
                        .ok_or_else(|| PropertyPathError::NoSuchProperty {
                            path: path.to_string(),
                            property: name.clone(),
                        })?
                }
                (PathSegment::Index(key), Value::Object(map)) => match map.get(key) {
                    Some(value) => value,
                    None => return self.missing_index(path, key),
                },
                (PathSegment::Index(key), Value::Array(items)) => {
                    match key.parse::<usize>().ok().and_then(|i| items.get(i)) {
                        Some(value) => value,
                        None => return self.missing_index(path, key),
                    }
                }
                (segment, other) => {
                    return Err(PropertyPathError::UnexpectedType {
                        path: path.to_string(),
                        segment: segment.to_string(),
                        found: type_of(other),
                    });
                }
            };
        }

        Ok(current.clone())
    }

    fn missing_index(&self, path: &PropertyPath, key: &str) -> Result<Value, PropertyPathError> {
        if self.exception_on_invalid_index {
            Err(PropertyPathError::NoSuchIndex {
                path: path.to_string(),
                index: key.to_string(),
            })
        } else {
            Ok(Value::Null)
        }
    }
}
