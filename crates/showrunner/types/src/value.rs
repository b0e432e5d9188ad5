//! Parameter values and their declared types
//!
//! Tools exchange data as `ParamValue`s. The universe is deliberately
//! small: string, integer, boolean, list-of-string, map, plus a declared
//! enum of allowed string values on the type side. A value either matches
//! a declared type or it does not — there is no coercion.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A runtime value flowing between workflow steps
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// A UTF-8 string
    String(String),
    /// A signed integer
    Integer(i64),
    /// A boolean
    Boolean(bool),
    /// A list of strings
    StringList(Vec<String>),
    /// A map of named values
    Map(BTreeMap<String, ParamValue>),
}

impl ParamValue {
    /// The name of this value's runtime type, for diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            ParamValue::String(_) => "string",
            ParamValue::Integer(_) => "integer",
            ParamValue::Boolean(_) => "boolean",
            ParamValue::StringList(_) => "list-of-string",
            ParamValue::Map(_) => "map",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            ParamValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::String(s.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        ParamValue::String(s)
    }
}

impl From<i64> for ParamValue {
    fn from(i: i64) -> Self {
        ParamValue::Integer(i)
    }
}

impl From<bool> for ParamValue {
    fn from(b: bool) -> Self {
        ParamValue::Boolean(b)
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(v: Vec<String>) -> Self {
        ParamValue::StringList(v)
    }
}

/// The declared type of a tool parameter or result field
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamType {
    /// Any string
    String,
    /// Any integer
    Integer,
    /// Any boolean
    Boolean,
    /// A list of strings
    StringList,
    /// A map of named values (field types are not declared)
    Map,
    /// One of a fixed set of allowed string values
    Choice(Vec<String>),
}

impl ParamType {
    /// Check whether a runtime value conforms to this declared type
    pub fn matches(&self, value: &ParamValue) -> bool {
        match (self, value) {
            (ParamType::String, ParamValue::String(_)) => true,
            (ParamType::Integer, ParamValue::Integer(_)) => true,
            (ParamType::Boolean, ParamValue::Boolean(_)) => true,
            (ParamType::StringList, ParamValue::StringList(_)) => true,
            (ParamType::Map, ParamValue::Map(_)) => true,
            (ParamType::Choice(allowed), ParamValue::String(s)) => {
                allowed.iter().any(|a| a == s)
            }
            _ => false,
        }
    }

    /// The name of this declared type, for diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Integer => "integer",
            ParamType::Boolean => "boolean",
            ParamType::StringList => "list-of-string",
            ParamType::Map => "map",
            ParamType::Choice(_) => "choice",
        }
    }
}

impl std::fmt::Display for ParamType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamType::Choice(allowed) => write!(f, "choice[{}]", allowed.join("|")),
            other => write!(f, "{}", other.type_name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_matches() {
        assert!(ParamType::String.matches(&ParamValue::from("hello")));
        assert!(ParamType::Integer.matches(&ParamValue::from(42)));
        assert!(ParamType::Boolean.matches(&ParamValue::from(true)));
        assert!(ParamType::StringList.matches(&ParamValue::from(vec!["a".to_string()])));
        assert!(ParamType::Map.matches(&ParamValue::Map(BTreeMap::new())));
    }

    #[test]
    fn test_type_mismatch() {
        // The classic bug: a number serialized as a string is NOT an integer
        assert!(!ParamType::Integer.matches(&ParamValue::from("45")));
        assert!(!ParamType::String.matches(&ParamValue::from(45)));
        assert!(!ParamType::StringList.matches(&ParamValue::from("a")));
    }

    #[test]
    fn test_choice_matches_allowed_values_only() {
        let platform = ParamType::Choice(vec!["youtube".into(), "spotify".into()]);
        assert!(platform.matches(&ParamValue::from("youtube")));
        assert!(platform.matches(&ParamValue::from("spotify")));
        assert!(!platform.matches(&ParamValue::from("myspace")));
        assert!(!platform.matches(&ParamValue::from(1)));
    }

    #[test]
    fn test_type_names() {
        assert_eq!(ParamValue::from("x").type_name(), "string");
        assert_eq!(ParamValue::from(1).type_name(), "integer");
        assert_eq!(format!("{}", ParamType::Choice(vec!["a".into(), "b".into()])), "choice[a|b]");
    }

    #[test]
    fn test_accessors() {
        assert_eq!(ParamValue::from("x").as_str(), Some("x"));
        assert_eq!(ParamValue::from(7).as_integer(), Some(7));
        assert_eq!(ParamValue::from(true).as_bool(), Some(true));
        assert_eq!(ParamValue::from(7).as_str(), None);
    }

    #[test]
    fn test_serde_round_trip() {
        let mut map = BTreeMap::new();
        map.insert("title".to_string(), ParamValue::from("Episode 12"));
        map.insert("duration".to_string(), ParamValue::from(45));
        let value = ParamValue::Map(map);

        let json = serde_json::to_string(&value).unwrap();
        let back: ParamValue = serde_json::from_str(&json).unwrap();
        assert_eq!(back, value);
    }
}
