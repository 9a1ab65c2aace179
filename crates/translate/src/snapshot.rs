//! Configuration snapshots and before/after diffs.
//!
//! Handlers work on typed data (any [`Data`] type). The engine moves that data
//! around as [`Snapshot`] values, which are the serialized form of one node:
//! its attributes plus any child lists that readers attached.

use crate::error::{Error, Result};
use crate::path::ConfigPath;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fmt;

/// Typed attribute set for one node.
///
/// Implemented for every type with the required bounds; handlers never
/// implement it by hand.
pub trait Data:
    Clone + PartialEq + fmt::Debug + Default + Serialize + DeserializeOwned + Send + Sync + 'static
{
}

impl<T> Data for T where
    T: Clone
        + PartialEq
        + fmt::Debug
        + Default
        + Serialize
        + DeserializeOwned
        + Send
        + Sync
        + 'static
{
}

// ============================================================================
// Snapshot
// ============================================================================

/// Structured state of one node: attributes and attached children.
///
/// Always a JSON object. `null` attributes are treated as unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot(Value);

impl Default for Snapshot {
    fn default() -> Self {
        Self(Value::Object(Map::new()))
    }
}

impl Snapshot {
    /// Empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialize typed data into a snapshot.
    pub fn from_data<T: Data>(path: &ConfigPath, data: &T) -> Result<Self> {
        let value = serde_json::to_value(data)
            .map_err(|e| Error::contract(path, "snapshot serialization failed").with_source(e))?;
        Self::from_value(path, value)
    }

    /// Wrap a JSON value, which must be an object.
    pub fn from_value(path: &ConfigPath, value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(Value::Object(strip_nulls(map)))),
            other => Err(Error::contract(
                path,
                format!("snapshot must be an object, got {}", json_type(&other)),
            )),
        }
    }

    /// Deserialize into typed data.
    ///
    /// A shape mismatch means the caller routed the snapshot to the wrong
    /// handler, which is a contract violation.
    pub fn to_data<T: Data>(&self, path: &ConfigPath) -> Result<T> {
        serde_json::from_value(self.0.clone()).map_err(|e| {
            Error::contract(
                path,
                format!("snapshot does not fit {}", std::any::type_name::<T>()),
            )
            .with_after(&self.0)
            .with_source(e)
        })
    }

    /// Attach a completed child list under `node`.
    ///
    /// Pure structural operation. Existing items under the same node are kept
    /// and the new ones appended after them.
    pub fn attach_list(&mut self, node: &str, items: Vec<Self>) {
        if items.is_empty() {
            return;
        }
        if let Value::Object(map) = &mut self.0 {
            let entry = map
                .entry(node.to_string())
                .or_insert_with(|| Value::Array(Vec::new()));
            if let Value::Array(list) = entry {
                list.extend(items.into_iter().map(|s| s.0));
            }
        }
    }

    /// Attach a single (non-list) child under `node`, replacing any previous one.
    pub fn attach_child(&mut self, node: &str, child: Self) {
        if let Value::Object(map) = &mut self.0 {
            map.insert(node.to_string(), child.0);
        }
    }

    /// Attribute by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name).filter(|v| !v.is_null())
    }

    /// Whether the snapshot has no attributes.
    pub fn is_empty(&self) -> bool {
        self.0.as_object().is_none_or(Map::is_empty)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

fn strip_nulls(map: Map<String, Value>) -> Map<String, Value> {
    map.into_iter().filter(|(_, v)| !v.is_null()).collect()
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ============================================================================
// Diff
// ============================================================================

/// What a diff asks a writer to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Change {
    Create,
    Update,
    Delete,
    /// Before and after are equal (or both absent)
    Noop,
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Noop => "no-op",
        };
        f.write_str(s)
    }
}

/// Before/after pair for one node.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Diff<T> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<T>,
}

impl<T: PartialEq> Diff<T> {
    pub fn new(before: Option<T>, after: Option<T>) -> Self {
        Self { before, after }
    }

    pub fn create(after: T) -> Self {
        Self::new(None, Some(after))
    }

    pub fn update(before: T, after: T) -> Self {
        Self::new(Some(before), Some(after))
    }

    pub fn delete(before: T) -> Self {
        Self::new(Some(before), None)
    }

    /// Classify the diff.
    pub fn change(&self) -> Change {
        match (&self.before, &self.after) {
            (None, Some(_)) => Change::Create,
            (Some(_), None) => Change::Delete,
            (Some(before), Some(after)) if before == after => Change::Noop,
            (Some(_), Some(_)) => Change::Update,
            (None, None) => Change::Noop,
        }
    }
}

/// One changed top-level attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldChange {
    pub name: String,
    pub before: Option<Value>,
    pub after: Option<Value>,
}

/// Top-level attributes that differ between two snapshots, sorted by name.
pub fn field_changes(before: Option<&Snapshot>, after: Option<&Snapshot>) -> Vec<FieldChange> {
    let names: BTreeSet<&String> = [before, after]
        .into_iter()
        .flatten()
        .filter_map(|s| s.as_value().as_object())
        .flat_map(Map::keys)
        .collect();

    names
        .into_iter()
        .filter_map(|name| {
            let old = before.and_then(|s| s.get(name)).cloned();
            let new = after.and_then(|s| s.get(name)).cloned();
            (old != new).then(|| FieldChange {
                name: name.clone(),
                before: old,
                after: new,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
    struct Iface {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mtu: Option<u16>,
    }

    fn path() -> ConfigPath {
        ConfigPath::root().keyed("interface", "eth0").child("config")
    }

    #[test]
    fn test_data_roundtrip() {
        let data = Iface {
            name: "eth0".into(),
            mtu: Some(1500),
        };
        let snapshot = Snapshot::from_data(&path(), &data).unwrap();
        assert_eq!(snapshot.get("mtu"), Some(&json!(1500)));
        assert_eq!(snapshot.to_data::<Iface>(&path()).unwrap(), data);
    }

    #[test]
    fn test_nulls_are_unset() {
        let snapshot = Snapshot::from_value(&path(), json!({"name": "eth0", "mtu": null})).unwrap();
        assert!(snapshot.get("mtu").is_none());
        assert_eq!(snapshot.as_value(), &json!({"name": "eth0"}));
    }

    #[test]
    fn test_non_object_rejected() {
        assert!(Snapshot::from_value(&path(), json!([1, 2])).is_err());
    }

    #[test]
    fn test_wrong_shape_is_contract_error() {
        let snapshot = Snapshot::from_value(&path(), json!({"name": 5})).unwrap();
        let err = snapshot.to_data::<Iface>(&path()).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Contract);
    }

    #[test]
    fn test_attach_list_appends() {
        let mut parent = Snapshot::new();
        parent.attach_list("vrf", vec![Snapshot::new()]);
        parent.attach_list("vrf", vec![Snapshot::new(), Snapshot::new()]);
        parent.attach_list("empty", Vec::new());
        assert_eq!(parent.get("vrf").unwrap().as_array().unwrap().len(), 3);
        assert!(parent.get("empty").is_none());
    }

    #[test]
    fn test_diff_classification() {
        assert_eq!(Diff::create(1).change(), Change::Create);
        assert_eq!(Diff::delete(1).change(), Change::Delete);
        assert_eq!(Diff::update(1, 2).change(), Change::Update);
        assert_eq!(Diff::update(1, 1).change(), Change::Noop);
        assert_eq!(Diff::<u8>::new(None, None).change(), Change::Noop);
    }

    #[test]
    fn test_field_changes() {
        let before = Snapshot::from_value(&path(), json!({"name": "eth0", "mtu": 9100})).unwrap();
        let after =
            Snapshot::from_value(&path(), json!({"name": "eth0", "description": "x"})).unwrap();

        let changes = field_changes(Some(&before), Some(&after));
        let names: Vec<_> = changes.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["description", "mtu"]);
        assert_eq!(changes[1].before, Some(json!(9100)));
        assert_eq!(changes[1].after, None);

        assert!(field_changes(Some(&before), Some(&before)).is_empty());
        assert_eq!(field_changes(None, Some(&after)).len(), 2);
    }
}
