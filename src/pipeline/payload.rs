use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

/// Structured value passed between the input, transform and output stages
///
/// Fields other than `data` and `status` are kept in `extra` so that stages
/// rewriting `data` hand everything else through untouched. A `status` that
/// is not a string also lives in `extra`, unchanged.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope {
    pub data: Value,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Envelope {
    /// Create an envelope with no status
    pub fn new(data: impl Into<Value>) -> Self {
        Self {
            data: data.into(),
            status: None,
            extra: Map::new(),
        }
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Interpret a JSON object carrying a `data` field as an envelope
    pub fn from_value(value: &Value) -> Option<Self> {
        let mut extra = match value {
            Value::Object(map) if map.contains_key("data") => map.clone(),
            _ => return None,
        };

        let data = extra.remove("data")?;
        let status = match extra.remove("status") {
            Some(Value::String(status)) => Some(status),
            Some(other) => {
                extra.insert("status".to_string(), other);
                None
            }
            None => None,
        };

        Some(Self {
            data,
            status,
            extra,
        })
    }
}

/// Value flowing through a pipeline
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Arbitrary caller-supplied data
    Raw(Value),
    Envelope(Envelope),
    /// Formatted display text
    Text(String),
}

impl Payload {
    /// View this payload as an envelope, if it has that shape
    pub fn as_envelope(&self) -> Option<Envelope> {
        match self {
            Payload::Envelope(envelope) => Some(envelope.clone()),
            Payload::Raw(value) => Envelope::from_value(value),
            Payload::Text(_) => None,
        }
    }

    pub fn into_envelope(self) -> Option<Envelope> {
        match self {
            Payload::Envelope(envelope) => Some(envelope),
            other => other.as_envelope(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Payload::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Convert to a JSON value
    pub fn to_value(&self) -> Value {
        match self {
            Payload::Raw(value) => value.clone(),
            Payload::Envelope(envelope) => {
                serde_json::to_value(envelope).unwrap_or_else(|_| envelope.data.clone())
            }
            Payload::Text(text) => Value::String(text.clone()),
        }
    }
}

/// Render a value for display: strings verbatim, everything else as compact JSON
pub fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Raw(value) => f.write_str(&render_value(value)),
            Payload::Envelope(_) => write!(f, "{}", self.to_value()),
            Payload::Text(text) => f.write_str(text),
        }
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Payload::Raw(value)
    }
}

impl From<&str> for Payload {
    fn from(value: &str) -> Self {
        Payload::Raw(Value::String(value.to_string()))
    }
}

impl From<String> for Payload {
    fn from(value: String) -> Self {
        Payload::Raw(Value::String(value))
    }
}

impl From<Envelope> for Payload {
    fn from(envelope: Envelope) -> Self {
        Payload::Envelope(envelope)
    }
}
