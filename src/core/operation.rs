//! Remote operations exposed by CRUD controllers

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::error::RequestError;

/// One of the remote-callable actions of a CRUD controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    #[serde(rename = "create")]
    Create,
    #[serde(rename = "get")]
    Get,
    #[serde(rename = "list")]
    List,
    #[serde(rename = "remove")]
    Remove,
    #[serde(rename = "update")]
    Update,
    #[serde(rename = "getNewRecordValues")]
    GetNewRecordValues,
}

impl Operation {
    /// Every operation, in the order the API descriptor lists them
    pub const ALL: [Operation; 6] = [
        Operation::Create,
        Operation::Get,
        Operation::List,
        Operation::Remove,
        Operation::Update,
        Operation::GetNewRecordValues,
    ];

    /// Action name as used on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Get => "get",
            Operation::List => "list",
            Operation::Remove => "remove",
            Operation::Update => "update",
            Operation::GetNewRecordValues => "getNewRecordValues",
        }
    }

    /// Whether the operation writes through the persistence handler
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Operation::Create | Operation::Update | Operation::Remove
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operation::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| RequestError::UnknownAction {
                action: s.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_action_names() {
        assert_eq!("create".parse::<Operation>().unwrap(), Operation::Create);
        assert_eq!(
            "getNewRecordValues".parse::<Operation>().unwrap(),
            Operation::GetNewRecordValues
        );
        assert!("destroy".parse::<Operation>().is_err());
    }

    #[test]
    fn test_display_matches_wire_name() {
        for op in Operation::ALL {
            assert_eq!(op.to_string(), op.as_str());
        }
    }

    #[test]
    fn test_mutations() {
        assert!(Operation::Remove.is_mutation());
        assert!(!Operation::List.is_mutation());
    }
}
