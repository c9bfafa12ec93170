//! Message model shared by the editor and its rendering workers.
//!
//! This crate owns the protocol spoken across the editor/worker boundary.
//! Messages travel in process as typed enums; their `serde` representation
//! matches the structural shapes used on any serialized channel:
//!
//! | Direction | Shape | Tags |
//! |-----------|-------|------|
//! | editor → worker | `[event_name, data]` | `update`, `type`, `remove` |
//! | worker → editor | `{"event_name": .., "data": ..}` | `type`, `rendered` |
//!
//! Tags outside the closed set decode to an explicit `Unknown` variant so
//! both ends can match exhaustively and ignore them on purpose.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// =============================================================================
// TAGS
// =============================================================================

/// Editor → worker: create or shallow-merge an item.
pub const TAG_UPDATE: &str = "update";
/// Editor → worker: request a type announcement. Worker → editor: the announcement.
pub const TAG_TYPE: &str = "type";
/// Editor → worker: drop an item and its surface.
pub const TAG_REMOVE: &str = "remove";
/// Worker → editor: an update was merged and rendered.
pub const TAG_RENDERED: &str = "rendered";

/// Payload key holding the item identifier.
pub const ID_KEY: &str = "id";

/// Open-ended item fields. Alias to reduce noise in signatures.
pub type Fields = Map<String, Value>;

// =============================================================================
// ERRORS
// =============================================================================

/// Error returned when a value does not match the protocol shapes.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The value is not the expected array or record shape.
    #[error("malformed frame: {0}")]
    Json(#[from] serde_json::Error),
    /// An item payload was not a JSON object.
    #[error("item payload must be an object, got {0}")]
    PayloadNotObject(String),
    /// An item payload has no `id` field.
    #[error("item payload has no id")]
    MissingItemId,
    /// The `id` field is neither an integer nor a string.
    #[error("invalid item id: {0}")]
    InvalidItemId(String),
    /// A recognized tag carried data of the wrong type.
    #[error("invalid data for '{event_name}': expected {expected}")]
    InvalidData { event_name: String, expected: &'static str },
}

// =============================================================================
// ITEM ID
// =============================================================================

/// Caller-supplied item identifier. Unique within one worker's item set.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemId {
    Int(i64),
    Text(String),
}

impl ItemId {
    /// Parse an id from a JSON value. Only integers and strings are accepted.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::InvalidItemId`] for any other value.
    pub fn from_value(value: &Value) -> Result<Self, CodecError> {
        match value {
            Value::Number(n) => n
                .as_i64()
                .map(Self::Int)
                .ok_or_else(|| CodecError::InvalidItemId(value.to_string())),
            Value::String(s) => Ok(Self::Text(s.clone())),
            other => Err(CodecError::InvalidItemId(other.to_string())),
        }
    }

    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Int(n) => Value::from(*n),
            Self::Text(s) => Value::String(s.clone()),
        }
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for ItemId {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for ItemId {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

// =============================================================================
// ITEM PAYLOAD
// =============================================================================

/// An item record: a JSON object that always carries a valid `id`.
///
/// Serializes as the plain object, `id` included.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(into = "Fields", try_from = "Fields")]
pub struct ItemPayload {
    id: ItemId,
    fields: Fields,
}

impl ItemPayload {
    /// Build a payload from an object, validating its `id`.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::MissingItemId`] or [`CodecError::InvalidItemId`].
    pub fn new(fields: Fields) -> Result<Self, CodecError> {
        let id = fields.get(ID_KEY).ok_or(CodecError::MissingItemId)?;
        let id = ItemId::from_value(id)?;
        Ok(Self { id, fields })
    }

    /// Build a payload from any JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::PayloadNotObject`] for non-objects, otherwise as [`ItemPayload::new`].
    pub fn from_value(value: Value) -> Result<Self, CodecError> {
        match value {
            Value::Object(fields) => Self::new(fields),
            other => Err(CodecError::PayloadNotObject(other.to_string())),
        }
    }

    #[must_use]
    pub fn id(&self) -> &ItemId {
        &self.id
    }

    #[must_use]
    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Shallow merge: every key of `update` overwrites the same key here,
    /// keys absent from `update` persist. The `id` is never rewritten.
    pub fn merge(&mut self, update: ItemPayload) {
        for (key, value) in update.fields {
            if key == ID_KEY {
                continue;
            }
            self.fields.insert(key, value);
        }
    }
}

impl From<ItemPayload> for Fields {
    fn from(payload: ItemPayload) -> Self {
        payload.fields
    }
}

impl TryFrom<Fields> for ItemPayload {
    type Error = CodecError;

    fn try_from(fields: Fields) -> Result<Self, Self::Error> {
        Self::new(fields)
    }
}

// =============================================================================
// EDITOR → WORKER
// =============================================================================

/// A message posted by the editor to one worker.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(into = "Value", try_from = "Value")]
pub enum EditorMessage {
    /// Insert the item, or shallow-merge it into the existing record.
    Update(ItemPayload),
    /// Ask the worker to announce the item type it renders.
    AnnounceType,
    /// Drop an item and its surface.
    Remove(ItemId),
    /// Any tag outside the recognized set. Receivers ignore it.
    Unknown { event_name: String, data: Value },
}

impl EditorMessage {
    #[must_use]
    pub fn event_name(&self) -> &str {
        match self {
            Self::Update(_) => TAG_UPDATE,
            Self::AnnounceType => TAG_TYPE,
            Self::Remove(_) => TAG_REMOVE,
            Self::Unknown { event_name, .. } => event_name,
        }
    }
}

/// Wire form `[event_name, data]`.
#[derive(Serialize, Deserialize)]
struct EditorFrame(String, Value);

impl From<EditorMessage> for Value {
    fn from(message: EditorMessage) -> Self {
        let (event_name, data) = match message {
            EditorMessage::Update(payload) => (TAG_UPDATE.to_owned(), Value::Object(payload.into())),
            EditorMessage::AnnounceType => (TAG_TYPE.to_owned(), Value::Null),
            EditorMessage::Remove(id) => (TAG_REMOVE.to_owned(), id.to_value()),
            EditorMessage::Unknown { event_name, data } => (event_name, data),
        };
        Value::Array(vec![Value::String(event_name), data])
    }
}

impl TryFrom<Value> for EditorMessage {
    type Error = CodecError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let EditorFrame(event_name, data) = serde_json::from_value(value)?;
        match event_name.as_str() {
            TAG_UPDATE => Ok(Self::Update(ItemPayload::from_value(data)?)),
            TAG_TYPE => Ok(Self::AnnounceType),
            TAG_REMOVE => Ok(Self::Remove(ItemId::from_value(&data)?)),
            _ => Ok(Self::Unknown { event_name, data }),
        }
    }
}

// =============================================================================
// WORKER → EDITOR
// =============================================================================

/// A message posted by a worker back to the editor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(into = "Value", try_from = "Value")]
pub enum WorkerMessage {
    /// The worker renders items of this type.
    Type(String),
    /// The item was merged and rendered.
    Rendered(ItemId),
    /// Any tag outside the recognized set. The registry ignores it.
    Unknown { event_name: String, data: Value },
}

impl WorkerMessage {
    #[must_use]
    pub fn event_name(&self) -> &str {
        match self {
            Self::Type(_) => TAG_TYPE,
            Self::Rendered(_) => TAG_RENDERED,
            Self::Unknown { event_name, .. } => event_name,
        }
    }
}

/// Wire form `{"event_name": .., "data": ..}`.
#[derive(Serialize, Deserialize)]
struct WorkerFrame {
    event_name: String,
    #[serde(default)]
    data: Value,
}

impl From<WorkerMessage> for Value {
    fn from(message: WorkerMessage) -> Self {
        let (event_name, data) = match message {
            WorkerMessage::Type(item_type) => (TAG_TYPE.to_owned(), Value::String(item_type)),
            WorkerMessage::Rendered(id) => (TAG_RENDERED.to_owned(), id.to_value()),
            WorkerMessage::Unknown { event_name, data } => (event_name, data),
        };
        let mut record = Map::new();
        record.insert("event_name".to_owned(), Value::String(event_name));
        record.insert("data".to_owned(), data);
        Value::Object(record)
    }
}

impl TryFrom<Value> for WorkerMessage {
    type Error = CodecError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let WorkerFrame { event_name, data } = serde_json::from_value(value)?;
        match event_name.as_str() {
            TAG_TYPE => match data {
                Value::String(item_type) => Ok(Self::Type(item_type)),
                _ => Err(CodecError::InvalidData { event_name, expected: "a type string" }),
            },
            TAG_RENDERED => Ok(Self::Rendered(ItemId::from_value(&data)?)),
            _ => Ok(Self::Unknown { event_name, data }),
        }
    }
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
