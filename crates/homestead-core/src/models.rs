//! Data models for Homestead
//!
//! Records are schemaless JSON objects owned by whichever screen manages the
//! collection. The engine only relies on a handful of well-known fields:
//! `id`, `createdAt`, `updatedAt` and `syncStatus`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Field holding the record's unique id
pub const ID_FIELD: &str = "id";
/// Creation timestamp (epoch milliseconds)
pub const CREATED_AT_FIELD: &str = "createdAt";
/// Last update timestamp (epoch milliseconds)
pub const UPDATED_AT_FIELD: &str = "updatedAt";
/// Sync status tag
pub const SYNC_STATUS_FIELD: &str = "syncStatus";

/// Errors raised when a JSON value cannot be used as a record
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("record must be a JSON object, got {0}")]
    NotAnObject(&'static str),

    #[error("record is missing a string `id` field")]
    MissingId,

    #[error("record `id` must not be empty")]
    EmptyId,
}

/// Whether a record has been reconciled with an external system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    #[default]
    Pending,
    Synced,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Pending => "pending",
            SyncStatus::Synced => "synced",
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SyncStatus::Pending),
            "synced" => Ok(SyncStatus::Synced),
            other => Err(format!("unknown sync status '{}'", other)),
        }
    }
}

/// A uniquely identified, timestamped unit of persisted data
///
/// Wraps the JSON object as-is so that fields the engine does not know about
/// survive an export/import round trip untouched. Field order is preserved.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    /// Create a new record with the given id, stamped as pending
    pub fn new(id: impl Into<String>) -> Self {
        let now = Value::from(now_millis());
        let mut fields = Map::new();
        fields.insert(ID_FIELD.to_string(), Value::String(id.into()));
        fields.insert(CREATED_AT_FIELD.to_string(), now.clone());
        fields.insert(UPDATED_AT_FIELD.to_string(), now);
        fields.insert(
            SYNC_STATUS_FIELD.to_string(),
            Value::String(SyncStatus::Pending.as_str().to_string()),
        );
        Self(fields)
    }

    /// Build a record from an arbitrary JSON value
    pub fn from_value(value: Value) -> Result<Self, RecordError> {
        match value {
            Value::Object(map) => Self::from_map(map),
            other => Err(RecordError::NotAnObject(json_kind(&other))),
        }
    }

    /// Build a record from a JSON object, validating the id
    pub fn from_map(map: Map<String, Value>) -> Result<Self, RecordError> {
        match map.get(ID_FIELD) {
            Some(Value::String(id)) if id.is_empty() => Err(RecordError::EmptyId),
            Some(Value::String(_)) => Ok(Self(map)),
            _ => Err(RecordError::MissingId),
        }
    }

    /// Builder-style field setter
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    pub fn id(&self) -> &str {
        // Validated on construction; `set` refuses to replace the id
        self.0
            .get(ID_FIELD)
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Set a field. The `id` field cannot be changed through this method.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        if key == ID_FIELD {
            return;
        }
        self.0.insert(key, value.into());
    }

    pub fn created_at(&self) -> Option<i64> {
        self.0.get(CREATED_AT_FIELD).and_then(Value::as_i64)
    }

    pub fn updated_at(&self) -> Option<i64> {
        self.0.get(UPDATED_AT_FIELD).and_then(Value::as_i64)
    }

    /// Sync status, if present and recognised
    pub fn sync_status(&self) -> Option<SyncStatus> {
        self.0
            .get(SYNC_STATUS_FIELD)
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok())
    }

    /// Mark the record as locally modified at `now_ms`
    pub fn stamp_pending(&mut self, now_ms: i64) {
        self.0.insert(
            SYNC_STATUS_FIELD.to_string(),
            Value::String(SyncStatus::Pending.as_str().to_string()),
        );
        self.0
            .insert(UPDATED_AT_FIELD.to_string(), Value::from(now_ms));
    }

    /// Field names in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let map = Map::<String, Value>::deserialize(deserializer)?;
        Record::from_map(map).map_err(serde::de::Error::custom)
    }
}

/// Current time as epoch milliseconds
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Convert epoch milliseconds to a UTC timestamp
pub fn millis_to_datetime(ms: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms).single()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
