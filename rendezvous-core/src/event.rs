//! Event records as the platform backend returns them.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Identifier of an event.
///
/// The backend is inconsistent about id types: the recommendation service
/// sends strings while the events service sends numbers. Both normalise to
/// the same decimal string so `12` and `"12"` compare equal.
///
/// # Examples
///
/// ```
/// use rendezvous_core::EventId;
///
/// let from_number: EventId = serde_json::from_str("12").unwrap();
/// let from_text: EventId = serde_json::from_str("\"12\"").unwrap();
/// assert_eq!(from_number, from_text);
/// assert_eq!(from_number.as_str(), "12");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    /// Wrap an identifier string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<u64> for EventId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for EventId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for EventId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl<'de> Deserialize<'de> for EventId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Unsigned(u64),
            Signed(i64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(text) => Self(text),
            RawId::Unsigned(number) => Self(number.to_string()),
            RawId::Signed(number) => Self(number.to_string()),
        })
    }
}

/// A scheduled gathering published under a channel.
///
/// Only the id is typed. The backend's other fields are kept verbatim in
/// [`EventRecord::fields`] so a record with an unexpected shape, such as a
/// `null` name or a coordinate object for its location, still hydrates.
/// Accessors read the common fields and return `None` when one is absent or
/// has a type they do not understand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Unique identifier.
    pub id: EventId,
    /// Remaining backend fields, preserved verbatim.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl EventRecord {
    /// Build a record with only an id and a name.
    #[must_use]
    pub fn new(id: impl Into<EventId>, name: impl Into<String>) -> Self {
        let name: String = name.into();
        Self {
            id: id.into(),
            fields: Map::new(),
        }
        .with_field("name", name)
    }

    /// Set a backend field, consuming `self`.
    #[must_use]
    pub fn with_field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_owned(), value.into());
        self
    }

    /// Set the region, consuming `self`.
    #[must_use]
    pub fn with_region(self, region: impl Into<String>) -> Self {
        let region: String = region.into();
        self.with_field("region", region)
    }

    /// Set the capacity, consuming `self`.
    #[must_use]
    pub fn with_capacity(self, capacity: u32) -> Self {
        self.with_field("capacity", capacity)
    }

    /// Raw backend field named `key`.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Display name, when the backend sent a string.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.text("name")
    }

    /// Start time as sent by the backend (ISO-8601).
    #[must_use]
    pub fn start_time(&self) -> Option<&str> {
        self.text("startTime")
    }

    /// Region the event belongs to.
    #[must_use]
    pub fn region(&self) -> Option<&str> {
        self.text("region")
    }

    /// Venue as sent by the backend: an address string or a coordinate
    /// object.
    #[must_use]
    pub fn location(&self) -> Option<&Value> {
        self.field("location").filter(|value| !value.is_null())
    }

    /// Maximum number of attendees.
    #[must_use]
    pub fn capacity(&self) -> Option<u64> {
        self.whole_number("capacity")
    }

    /// Planned duration in minutes.
    #[must_use]
    pub fn duration_minutes(&self) -> Option<u64> {
        self.whole_number("durationMinutes")
    }

    fn text(&self, key: &str) -> Option<&str> {
        self.field(key).and_then(Value::as_str)
    }

    /// Accepts integers, whole floats and numeric strings.
    fn whole_number(&self, key: &str) -> Option<u64> {
        match self.field(key)? {
            Value::Number(number) => number
                .as_u64()
                .or_else(|| number.as_f64().and_then(whole_float)),
            Value::String(text) => text.trim().parse().ok(),
            _ => None,
        }
    }
}

#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "only whole, non-negative values reach the cast"
)]
fn whole_float(value: f64) -> Option<u64> {
    (value.is_finite() && value >= 0.0 && value.fract() == 0.0).then(|| value as u64)
}
