/*!
 * Core Types
 * Keys, values and mutations shared by every strategy
 */

use super::data_structures::InlineString;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Value stored under a key
pub type Value = u64;

/// Key addressing a counter or map entry
///
/// Counter workloads use a handful of named keys; map workloads use
/// globally unique integer keys.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Key {
    Int(u64),
    Name(InlineString),
}

impl Key {
    /// Named key
    #[inline]
    pub fn name(name: &str) -> Self {
        Key::Name(InlineString::from(name))
    }
}

impl From<u64> for Key {
    #[inline]
    fn from(value: u64) -> Self {
        Key::Int(value)
    }
}

impl From<&str> for Key {
    #[inline]
    fn from(value: &str) -> Self {
        Key::name(value)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Int(n) => write!(f, "{}", n),
            Key::Name(s) => write!(f, "{:?}", s.as_str()),
        }
    }
}

/// A single write against shared state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mutation {
    /// Read-modify-write: `value += delta` (missing keys start at zero)
    Add(Value),
    /// Blind write: `value = v`
    Set(Value),
}

impl Mutation {
    /// Apply to an existing value
    #[inline(always)]
    pub fn apply(self, current: Value) -> Value {
        match self {
            Mutation::Add(delta) => current.wrapping_add(delta),
            Mutation::Set(value) => value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mutation_apply() {
        assert_eq!(Mutation::Add(1).apply(41), 42);
        assert_eq!(Mutation::Set(7).apply(41), 7);
    }

    #[test]
    fn test_key_ordering_and_display() {
        assert!(Key::name("a") < Key::name("b"));
        assert_eq!(Key::from(12).to_string(), "12");
        assert_eq!(Key::from("a").to_string(), "\"a\"");
    }

    #[test]
    fn test_key_serializes_untagged() {
        assert_eq!(serde_json::to_string(&Key::Int(3)).unwrap(), "3");
        assert_eq!(serde_json::to_string(&Key::name("b")).unwrap(), "\"b\"");
    }
}
