//! Raw value domain: the loosely-typed shape accessors read from.
//!
//! A `RawValue` is an explicit tagged union over everything a decoded JSON
//! document (or a hand-built map) can carry. Accessors never mutate it; they
//! only borrow a `RawMap` and inspect the discriminant of each value.

use chrono::{DateTime, SecondsFormat, Utc};
use num_bigint::BigInt;
use serde::Deserialize;
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;
use std::collections::btree_map;
use std::fmt;

/// A single loosely-typed value.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "Value")]
pub enum RawValue {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    BigInt(BigInt),
    String(String),
    Date(DateTime<Utc>),
    Array(Vec<RawValue>),
    Map(RawMap),
}

/// Discriminant of a `RawValue`, used in error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Boolean,
    Integer,
    Float,
    BigInteger,
    String,
    Date,
    Array,
    Object,
}

impl ValueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Null => "null",
            ValueKind::Boolean => "boolean",
            ValueKind::Integer => "integer",
            ValueKind::Float => "float",
            ValueKind::BigInteger => "big-integer",
            ValueKind::String => "string",
            ValueKind::Date => "date",
            ValueKind::Array => "array",
            ValueKind::Object => "object",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl RawValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            RawValue::Null => ValueKind::Null,
            RawValue::Bool(_) => ValueKind::Boolean,
            RawValue::Int(_) | RawValue::UInt(_) => ValueKind::Integer,
            RawValue::Float(_) => ValueKind::Float,
            RawValue::BigInt(_) => ValueKind::BigInteger,
            RawValue::String(_) => ValueKind::String,
            RawValue::Date(_) => ValueKind::Date,
            RawValue::Array(_) => ValueKind::Array,
            RawValue::Map(_) => ValueKind::Object,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, RawValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            RawValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            RawValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[RawValue]> {
        match self {
            RawValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&RawMap> {
        match self {
            RawValue::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Canonical text for this value.
    ///
    /// Strings come back verbatim, numbers in their shortest round-trip
    /// form, dates as RFC 3339 with millisecond precision, and arrays/maps
    /// as compact JSON.
    ///
    /// Integral floats drop the fraction: `Float(2.0)` renders as `"2"`,
    /// the same text as `Int(2)`.
    pub fn to_text(&self) -> String {
        match self {
            RawValue::Null => "null".to_string(),
            RawValue::Bool(b) => b.to_string(),
            RawValue::Int(n) => n.to_string(),
            RawValue::UInt(n) => n.to_string(),
            RawValue::Float(f) => f.to_string(),
            RawValue::BigInt(n) => n.to_string(),
            RawValue::String(s) => s.clone(),
            RawValue::Date(d) => d.to_rfc3339_opts(SecondsFormat::Millis, true),
            RawValue::Array(_) | RawValue::Map(_) => Value::from(self).to_string(),
        }
    }

    /// Short description used when reporting what an accessor found.
    pub(crate) fn describe(&self) -> String {
        match self {
            RawValue::Null => "null".to_string(),
            RawValue::Array(items) => format!("array of length {}", items.len()),
            RawValue::Map(_) => "object".to_string(),
            other => format!("{} `{}`", other.kind(), other.to_text()),
        }
    }
}

impl From<Value> for RawValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => RawValue::Null,
            Value::Bool(b) => RawValue::Bool(b),
            Value::Number(n) => number_to_raw(&n),
            Value::String(s) => RawValue::String(s),
            Value::Array(items) => RawValue::Array(items.into_iter().map(RawValue::from).collect()),
            Value::Object(map) => RawValue::Map(RawMap::from(map)),
        }
    }
}

fn number_to_raw(n: &Number) -> RawValue {
    if let Some(i) = n.as_i64() {
        RawValue::Int(i)
    } else if let Some(u) = n.as_u64() {
        RawValue::UInt(u)
    } else {
        RawValue::Float(n.as_f64().unwrap_or(f64::NAN))
    }
}

impl From<&RawValue> for Value {
    fn from(raw: &RawValue) -> Self {
        match raw {
            RawValue::Null => Value::Null,
            RawValue::Bool(b) => Value::Bool(*b),
            RawValue::Int(n) => Value::from(*n),
            RawValue::UInt(n) => Value::from(*n),
            RawValue::Float(f) => Number::from_f64(*f).map_or(Value::Null, Value::Number),
            RawValue::BigInt(n) => {
                if let Ok(i) = i64::try_from(n) {
                    Value::from(i)
                } else if let Ok(u) = u64::try_from(n) {
                    Value::from(u)
                } else {
                    Value::String(n.to_string())
                }
            }
            RawValue::String(s) => Value::String(s.clone()),
            RawValue::Date(_) => Value::String(raw.to_text()),
            RawValue::Array(items) => Value::Array(items.iter().map(Value::from).collect()),
            RawValue::Map(map) => Value::Object(
                map.iter()
                    .map(|(key, value)| (key.clone(), Value::from(value)))
                    .collect(),
            ),
        }
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

macro_rules! raw_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for RawValue {
                fn from(value: $ty) -> Self {
                    RawValue::$variant(value.into())
                }
            }
        )*
    };
}

raw_from! {
    bool => Bool,
    i8 => Int,
    i16 => Int,
    i32 => Int,
    i64 => Int,
    u8 => UInt,
    u16 => UInt,
    u32 => UInt,
    u64 => UInt,
    f32 => Float,
    f64 => Float,
    BigInt => BigInt,
    String => String,
    &str => String,
    DateTime<Utc> => Date,
    RawMap => Map,
}

impl<T: Into<RawValue>> From<Vec<T>> for RawValue {
    fn from(items: Vec<T>) -> Self {
        RawValue::Array(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<RawValue>> From<Option<T>> for RawValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(RawValue::Null, Into::into)
    }
}

/// String-keyed map of raw values: the source every accessor reads from.
///
/// Accessors only take `&RawMap`; the map is owned by the caller and
/// outlives any single property lookup.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct RawMap(BTreeMap<String, RawValue>);

impl RawMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON object; anything else yields `None`.
    pub fn from_json(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self::from(map)),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&RawValue> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<RawValue>) -> &mut Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, RawValue> {
        self.0.iter()
    }

    pub fn to_json(&self) -> Value {
        Value::from(&RawValue::Map(self.clone()))
    }
}

impl From<Map<String, Value>> for RawMap {
    fn from(map: Map<String, Value>) -> Self {
        Self(
            map.into_iter()
                .map(|(key, value)| (key, RawValue::from(value)))
                .collect(),
        )
    }
}

impl<K: Into<String>, V: Into<RawValue>> FromIterator<(K, V)> for RawMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

impl<'a> IntoIterator for &'a RawMap {
    type Item = (&'a String, &'a RawValue);
    type IntoIter = btree_map::Iter<'a, String, RawValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
