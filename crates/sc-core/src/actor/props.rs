//! Open-ended per-actor property bag

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::Mid;

/// Value stored under a property key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropValue {
    Bool(bool),
    Int(i32),
    Str(String),
    Actor(Mid),
}

/// String-keyed properties that no dedicated field covers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Props {
    values: BTreeMap<String, PropValue>,
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&PropValue> {
        self.values.get(key)
    }

    pub fn exists(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: PropValue) -> Option<PropValue> {
        self.values.insert(key.into(), value)
    }

    pub fn erase(&mut self, key: &str) -> Option<PropValue> {
        self.values.remove(key)
    }

    pub fn get_int(&self, key: &str) -> Option<i32> {
        match self.values.get(key) {
            Some(PropValue::Int(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_bool(&self, key: &str) -> bool {
        matches!(self.values.get(key), Some(PropValue::Bool(true)))
    }

    pub fn get_mid(&self, key: &str) -> Option<Mid> {
        match self.values.get(key) {
            Some(PropValue::Actor(m)) => Some(*m),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_getters() {
        let mut props = Props::new();
        props.set("swallowed", PropValue::Bool(true));
        props.set("kills", PropValue::Int(3));
        props.set("summoner", PropValue::Actor(Mid(4)));
        assert!(props.get_bool("swallowed"));
        assert_eq!(props.get_int("kills"), Some(3));
        assert_eq!(props.get_int("swallowed"), None);
        assert_eq!(props.get_mid("summoner"), Some(Mid(4)));
        assert!(props.erase("kills").is_some());
        assert!(!props.exists("kills"));
        assert_eq!(props.len(), 2);
    }
}
