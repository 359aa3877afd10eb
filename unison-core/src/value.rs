//! State Tree Values
//!
//! A [`Value`] is an immutable-by-convention snapshot of application state.
//! Container variants are reference counted, so cloning a value is cheap and
//! two values can be compared in two different ways:
//!
//! - **Identity**: do both values point at the same container? Primitives are
//!   compared by value, the way `===` treats them.
//! - **Structure**: are the contents equal? See [`crate::equality`].
//!
//! Stores replace the root value on every reduction and share every
//! untouched subtree with the previous root. Identity therefore changes
//! exactly where the state changed, which is what the selector engine relies
//! on to skip work.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::equality::{self, EqualityPolicy};

/// String-keyed fields of an object value, in insertion order.
pub type Object = IndexMap<String, Value>;

/// A node of the state tree.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(Arc<str>),
    Array(Arc<Vec<Value>>),
    Object(Arc<Object>),
    /// Value-keyed map. Keys are unique by identity.
    Map(Arc<Vec<(Value, Value)>>),
    /// Unique members by identity.
    Set(Arc<Vec<Value>>),
    Bytes(Arc<[u8]>),
}

impl Value {
    /// Build an array value.
    pub fn array<I>(items: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        Value::Array(Arc::new(items.into_iter().map(Into::into).collect()))
    }

    /// Build an object value. Later fields replace earlier fields with the
    /// same key.
    pub fn object<K, V, I>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Value::Object(Arc::new(
            fields
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        ))
    }

    /// Build a map value. Later entries replace earlier entries whose key has
    /// the same identity.
    pub fn map<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (Value, Value)>,
    {
        let mut unique: Vec<(Value, Value)> = Vec::new();
        for (key, value) in entries {
            match unique.iter_mut().find(|(existing, _)| existing.same_identity(&key)) {
                Some(entry) => entry.1 = value,
                None => unique.push((key, value)),
            }
        }
        Value::Map(Arc::new(unique))
    }

    /// Build a set value, dropping members that repeat an earlier identity.
    pub fn set<I>(members: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let mut unique: Vec<Value> = Vec::new();
        for member in members.into_iter().map(Into::into) {
            if !unique.iter().any(|existing| existing.same_identity(&member)) {
                unique.push(member);
            }
        }
        Value::Set(Arc::new(unique))
    }

    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Self {
        let bytes: Vec<u8> = bytes.into();
        Value::Bytes(Arc::from(bytes))
    }

    /// Identity comparison.
    ///
    /// Containers are identical when they share the same allocation.
    /// Primitives compare by value; NaN is identical to NaN so that every
    /// value is identical to itself.
    pub fn same_identity(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => Arc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            (Value::Map(a), Value::Map(b)) => Arc::ptr_eq(a, b),
            (Value::Set(a), Value::Set(b)) => Arc::ptr_eq(a, b),
            (Value::Bytes(a), Value::Bytes(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Name of the variant, used as the comparison tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Map(_) => "map",
            Value::Set(_) => "set",
            Value::Bytes(_) => "bytes",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) | Value::Set(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(fields) => Some(fields),
            _ => None,
        }
    }

    /// Look up an object field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_object().and_then(|fields| fields.get(key))
    }

    /// Look up an array element.
    pub fn at(&self, index: usize) -> Option<&Value> {
        match self {
            Value::Array(items) => items.get(index),
            _ => None,
        }
    }

    /// Look up a value by a chain of object keys.
    pub fn pointer<'a>(&self, path: impl IntoIterator<Item = &'a str>) -> Option<&Value> {
        path.into_iter().try_fold(self, |node, key| node.get(key))
    }

    /// Number of children of a container; zero for primitives.
    pub fn len(&self) -> usize {
        match self {
            Value::Array(items) | Value::Set(items) => items.len(),
            Value::Object(fields) => fields.len(),
            Value::Map(entries) => entries.len(),
            Value::Bytes(bytes) => bytes.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return a new object with `key` set to `value`.
    ///
    /// Every other field keeps its identity. A non-object receiver yields a
    /// one-field object.
    pub fn with_field(&self, key: impl Into<String>, value: impl Into<Value>) -> Value {
        let mut fields = self.as_object().cloned().unwrap_or_default();
        fields.insert(key.into(), value.into());
        Value::Object(Arc::new(fields))
    }

    /// Return a new array with the element at `index` replaced.
    ///
    /// Other elements keep their identity. An index past the end appends, so
    /// a non-array receiver yields a one-element array.
    pub fn with_index(&self, index: usize, value: impl Into<Value>) -> Value {
        let mut items = match self {
            Value::Array(items) => items.as_ref().clone(),
            _ => Vec::new(),
        };
        let value = value.into();
        match items.get_mut(index) {
            Some(slot) => *slot = value,
            None => items.push(value),
        }
        Value::Array(Arc::new(items))
    }

    /// Return a new array with `value` appended.
    ///
    /// Existing elements keep their identity. A non-array receiver yields a
    /// one-element array.
    pub fn with_pushed(&self, value: impl Into<Value>) -> Value {
        let mut items = match self {
            Value::Array(items) => items.as_ref().clone(),
            _ => Vec::new(),
        };
        items.push(value.into());
        Value::Array(Arc::new(items))
    }
}

/// Structural equality at unbounded depth.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        equality::equal(self, other, EqualityPolicy::Deep)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Array(items) => f.debug_list().entries(items.iter()).finish(),
            Value::Object(fields) => f.debug_map().entries(fields.iter()).finish(),
            Value::Map(entries) => f
                .debug_map()
                .entries(entries.iter().map(|(k, v)| (k, v)))
                .finish(),
            Value::Set(members) => f.debug_set().entries(members.iter()).finish(),
            Value::Bytes(bytes) => write!(f, "bytes({} bytes)", bytes.len()),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(f64::from(value))
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Number(f64::from(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(value as f64)
    }
}

impl From<usize> for Value {
    fn from(value: usize) -> Self {
        Value::Number(value as f64)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(Arc::from(value))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(Arc::from(value))
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(Arc::new(items))
    }
}

impl From<Object> for Value {
    fn from(fields: Object) -> Self {
        Value::Object(Arc::new(fields))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value as Json;

        match value {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            Json::String(s) => Value::from(s),
            Json::Array(items) => Value::Array(Arc::new(items.into_iter().map(Value::from).collect())),
            Json::Object(fields) => Value::Object(Arc::new(
                fields
                    .into_iter()
                    .map(|(key, value)| (key, Value::from(value)))
                    .collect(),
            )),
        }
    }
}

// ----------------------------------------------------------------------------
// Serde
// ----------------------------------------------------------------------------

/// Maps serialize as a sequence of `[key, value]` pairs, sets as sequences,
/// and bytes as a sequence of numbers. Deserialization goes through the JSON
/// data model, so those three variants come back as arrays.
impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) => serializer.serialize_f64(*n),
            Value::String(s) => serializer.serialize_str(s),
            Value::Array(items) | Value::Set(items) => serializer.collect_seq(items.iter()),
            Value::Object(fields) => serializer.collect_map(fields.iter()),
            Value::Map(entries) => serializer.collect_seq(entries.iter()),
            Value::Bytes(bytes) => serializer.collect_seq(bytes.iter()),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Value::from)
    }
}

// ----------------------------------------------------------------------------
// Actions
// ----------------------------------------------------------------------------

/// A dispatched action: a discriminant plus an opaque payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub payload: Value,
}

impl Action {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            payload: Value::Null,
        }
    }

    pub fn with_payload(kind: impl Into<String>, payload: impl Into<Value>) -> Self {
        Self {
            kind: kind.into(),
            payload: payload.into(),
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn shop() -> Value {
        Value::from(json!({
            "shop": {
                "taxPercent": 8,
                "items": [
                    { "name": "apple", "value": 1.20 },
                    { "name": "orange", "value": 0.95 }
                ]
            }
        }))
    }

    #[test]
    fn clones_share_identity() {
        let state = shop();
        let copy = state.clone();
        assert!(state.same_identity(&copy));
    }

    #[test]
    fn rebuilt_containers_have_new_identity() {
        let a = Value::array([1, 2, 3]);
        let b = Value::array([1, 2, 3]);
        assert!(!a.same_identity(&b));
        assert_eq!(a, b);
    }

    #[test]
    fn primitives_compare_by_value() {
        assert!(Value::from(8).same_identity(&Value::from(8.0)));
        assert!(Value::from("apple").same_identity(&Value::from("apple".to_string())));
        assert!(Value::Number(f64::NAN).same_identity(&Value::Number(f64::NAN)));
        assert!(!Value::from(1).same_identity(&Value::from("1")));
    }

    #[test]
    fn with_field_shares_untouched_children() {
        let state = shop();
        let shop_node = state.get("shop").cloned().unwrap_or_default();
        let next_shop = shop_node.with_field("taxPercent", 10);
        let next = state.with_field("shop", next_shop);

        assert!(!state.same_identity(&next));

        let items_before = state.pointer(["shop", "items"]).unwrap();
        let items_after = next.pointer(["shop", "items"]).unwrap();
        assert!(items_before.same_identity(items_after));

        assert_eq!(next.pointer(["shop", "taxPercent"]).and_then(Value::as_f64), Some(10.0));
    }

    #[test]
    fn with_pushed_appends() {
        let todos = Value::array(["a"]);
        let more = todos.with_pushed("b");
        assert_eq!(more.len(), 2);
        assert!(todos.at(0).unwrap().same_identity(more.at(0).unwrap()));
        assert_eq!(todos.len(), 1);
    }

    #[test]
    fn with_index_replaces_one_element() {
        let rows = Value::array([Value::array([1]), Value::array([2])]);
        let next = rows.with_index(1, 3);

        assert!(rows.at(0).unwrap().same_identity(next.at(0).unwrap()));
        assert_eq!(next.at(1).and_then(Value::as_f64), Some(3.0));
        assert_eq!(rows.with_index(9, 4).len(), 3);
    }

    #[test]
    fn map_and_set_constructors_dedupe_by_identity() {
        let map = Value::map([
            (Value::from("a"), Value::from(1)),
            (Value::from("a"), Value::from(2)),
        ]);
        assert_eq!(map.len(), 1);

        let set = Value::set([1, 1, 2]);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn json_round_trip_of_objects() {
        let state = shop();
        let text = serde_json::to_string(&state).unwrap();
        let back: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(state, back);
    }

    #[test]
    fn action_uses_type_discriminant() {
        let action: Action =
            serde_json::from_value(json!({ "type": "nonce", "payload": 3 })).unwrap();
        assert_eq!(action.kind, "nonce");
        assert_eq!(action.payload.as_f64(), Some(3.0));

        let bare = serde_json::to_value(Action::new("reset")).unwrap();
        assert_eq!(bare, json!({ "type": "reset" }));
    }
}
