//! Conversation traces delivered by the host.
//!
//! A [`Trace`] carries two discriminators: the coarse `type` and, for generic
//! "custom extension" traces, a `name` inside the payload. Extensions never
//! compare these strings themselves; they call [`Trace::carries`], which is
//! the single place where both discriminators are consulted.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::ext::CATALOG_KEYS;

/// An immutable conversation event describing what should be displayed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    /// Coarse discriminator (e.g. `"ext_video"` or a generic custom type).
    #[serde(rename = "type")]
    pub kind: String,
    /// Free-form payload bag. Anything other than a JSON object is treated
    /// as an empty payload.
    #[serde(default)]
    pub payload: Value,
}

impl Trace {
    /// Create a trace.
    pub fn new(kind: impl Into<String>, payload: Value) -> Self {
        Self {
            kind: kind.into(),
            payload,
        }
    }

    /// The payload as a JSON object, if it is one.
    pub fn payload_object(&self) -> Option<&Map<String, Value>> {
        self.payload.as_object()
    }

    /// The alternate discriminator, `payload.name`, when it is a string.
    pub fn payload_name(&self) -> Option<&str> {
        self.payload_object()?.get("name")?.as_str()
    }

    /// Normalized view of both discriminators.
    pub fn discriminant(&self) -> Discriminant<'_> {
        Discriminant {
            kind: &self.kind,
            name: self.payload_name(),
        }
    }

    /// Whether either discriminator equals `key`.
    pub fn carries(&self, key: &str) -> bool {
        self.discriminant().is(key)
    }

    /// The first discriminator that names a catalog extension, preferring
    /// `type` over `payload.name`.
    pub fn resolved_key(&self) -> Option<&str> {
        self.discriminant().resolve(CATALOG_KEYS)
    }

    /// Deserialize the payload into a typed structure.
    ///
    /// Non-object payloads deserialize as if they were `{}` so that missing
    /// fields surface as field errors rather than type errors.
    pub fn payload_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        match &self.payload {
            Value::Object(_) => serde_json::from_value(self.payload.clone()),
            _ => serde_json::from_value(Value::Object(Map::new())),
        }
    }
}

/// The resolved pair of discriminators for a [`Trace`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Discriminant<'a> {
    pub kind: &'a str,
    pub name: Option<&'a str>,
}

impl<'a> Discriminant<'a> {
    /// True iff `kind == key` or `name == Some(key)`.
    pub fn is(&self, key: &str) -> bool {
        self.kind == key || self.name == Some(key)
    }

    /// Pick the first discriminator contained in `known`.
    pub fn resolve(&self, known: &[&str]) -> Option<&'a str> {
        if known.iter().any(|k| *k == self.kind) {
            return Some(self.kind);
        }
        self.name.filter(|n| known.iter().any(|k| k == n))
    }
}

// ── Loose payload helpers ────────────────────────────────────────────

/// JavaScript-style truthiness for a JSON value.
///
/// `null`, `false`, `0`, `NaN`-like numbers and `""` are false; every other
/// value (including empty arrays and objects) is true.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Serde adapter that reads any JSON value as a truthy flag.
pub(crate) fn truthy<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(is_truthy(&value))
}
