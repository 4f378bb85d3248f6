//! Canonical representation: plain values with sorted mappings.

use std::collections::BTreeMap;

use crate::domain::scalar::Scalar;

/// A plain value tree. Mappings are ordered by key, comments and styles are gone.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Scalar(Scalar),
    Sequence(Vec<Value>),
    Mapping(BTreeMap<Scalar, Value>),
}

impl Value {
    pub fn string(s: impl Into<String>) -> Self {
        Value::Scalar(Scalar::String(s.into()))
    }

    pub fn empty_mapping() -> Self {
        Value::Mapping(BTreeMap::new())
    }

    pub fn as_mapping(&self) -> Option<&BTreeMap<Scalar, Value>> {
        match self {
            Value::Mapping(map) => Some(map),
            _ => None,
        }
    }

    /// Look up a string key in a mapping.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_mapping()
            .and_then(|map| map.get(&Scalar::String(key.to_string())))
    }

    /// Follow a path of string keys.
    pub fn pointer(&self, path: &[&str]) -> Option<&Value> {
        path.iter().try_fold(self, |value, key| value.get(key))
    }

    /// Short type name used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Scalar(Scalar::Null) => "null",
            Value::Scalar(Scalar::Bool(_)) => "bool",
            Value::Scalar(Scalar::Int(_)) => "int",
            Value::Scalar(Scalar::Float(_)) => "float",
            Value::Scalar(Scalar::String(_)) => "string",
            Value::Sequence(_) => "sequence",
            Value::Mapping(_) => "mapping",
        }
    }
}

impl From<Scalar> for Value {
    fn from(s: Scalar) -> Self {
        Value::Scalar(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_nested_mapping_when_following_pointer_then_finds_leaf() {
        let mut inner = BTreeMap::new();
        inner.insert(Scalar::from("id"), Value::string("e1"));
        let mut outer = BTreeMap::new();
        outer.insert(Scalar::from("entity"), Value::Mapping(inner));
        let value = Value::Mapping(outer);

        assert_eq!(
            value.pointer(&["entity", "id"]),
            Some(&Value::string("e1"))
        );
        assert_eq!(value.pointer(&["entity", "missing"]), None);
    }
}
