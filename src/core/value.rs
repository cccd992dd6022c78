use crate::core::{Result, StoreError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Payload of an instance property.
///
/// Serialized adjacently tagged: `{"type": "Text", "value": "bar"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum PropertyValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    DateTime(DateTime<Utc>),
    Guid(Uuid),
    Bytes(Vec<u8>),
    List(Vec<PropertyValue>),
    Map(BTreeMap<String, PropertyValue>),
    Json(serde_json::Value),
}

impl PropertyValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "Null",
            Self::Boolean(_) => "Boolean",
            Self::Integer(_) => "Integer",
            Self::Float(_) => "Float",
            Self::Text(_) => "Text",
            Self::DateTime(_) => "DateTime",
            Self::Guid(_) => "Guid",
            Self::Bytes(_) => "Bytes",
            Self::List(_) => "List",
            Self::Map(_) => "Map",
            Self::Json(_) => "Json",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Result<DateTime<Utc>> {
        match self {
            Self::DateTime(at) => Ok(*at),
            other => Err(StoreError::TypeMismatch(format!(
                "expected DateTime, found {}",
                other.type_name()
            ))),
        }
    }

    /// Rejects payloads JSON cannot carry back: NaN and infinite floats,
    /// including ones nested in lists and maps.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Float(number) if !number.is_finite() => Err(StoreError::TypeMismatch(format!(
                "non-finite Float {number} cannot be persisted"
            ))),
            Self::List(items) => items.iter().try_for_each(Self::validate),
            Self::Map(entries) => entries.values().try_for_each(Self::validate),
            _ => Ok(()),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<DateTime<Utc>> for PropertyValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::DateTime(value)
    }
}

impl From<Uuid> for PropertyValue {
    fn from(value: Uuid) -> Self {
        Self::Guid(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueFlag {
    Optional,
    WriteOnly,
    DeletedValue,
}

impl ValueFlag {
    const ALL: [ValueFlag; 3] = [Self::Optional, Self::WriteOnly, Self::DeletedValue];

    fn bit(self) -> u8 {
        match self {
            Self::Optional => 0b001,
            Self::WriteOnly => 0b010,
            Self::DeletedValue => 0b100,
        }
    }
}

/// Option flags attached to an [`InstanceValue`].
///
/// Stored on disk as a list of flag names, e.g. `["WriteOnly"]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<ValueFlag>", into = "Vec<ValueFlag>")]
pub struct ValueOptions(u8);

impl ValueOptions {
    pub const NONE: ValueOptions = ValueOptions(0);
    pub const OPTIONAL: ValueOptions = ValueOptions(0b001);
    pub const WRITE_ONLY: ValueOptions = ValueOptions(0b010);
    pub const DELETED_VALUE: ValueOptions = ValueOptions(0b100);

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn contains(&self, other: ValueOptions) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn union(self, other: ValueOptions) -> Self {
        Self(self.0 | other.0)
    }
}

impl std::ops::BitOr for ValueOptions {
    type Output = ValueOptions;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl From<Vec<ValueFlag>> for ValueOptions {
    fn from(flags: Vec<ValueFlag>) -> Self {
        Self(flags.into_iter().fold(0, |bits, flag| bits | flag.bit()))
    }
}

impl From<ValueOptions> for Vec<ValueFlag> {
    fn from(options: ValueOptions) -> Self {
        ValueFlag::ALL
            .into_iter()
            .filter(|flag| options.0 & flag.bit() != 0)
            .collect()
    }
}

/// A property payload together with its option flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceValue {
    pub value: PropertyValue,
    #[serde(default, skip_serializing_if = "ValueOptions::is_empty")]
    pub options: ValueOptions,
}

impl InstanceValue {
    pub fn new(value: impl Into<PropertyValue>) -> Self {
        Self::with_options(value, ValueOptions::NONE)
    }

    pub fn with_options(value: impl Into<PropertyValue>, options: ValueOptions) -> Self {
        Self {
            value: value.into(),
            options,
        }
    }

    pub fn write_only(value: impl Into<PropertyValue>) -> Self {
        Self::with_options(value, ValueOptions::WRITE_ONLY)
    }

    /// Tombstone: asks the store to remove the key.
    pub fn deleted() -> Self {
        Self::with_options(PropertyValue::Null, ValueOptions::DELETED_VALUE)
    }

    pub fn is_write_only(&self) -> bool {
        self.options.contains(ValueOptions::WRITE_ONLY)
    }

    pub fn is_deleted_value(&self) -> bool {
        self.options.contains(ValueOptions::DELETED_VALUE)
    }

    pub fn is_optional(&self) -> bool {
        self.options.contains(ValueOptions::OPTIONAL)
    }
}
