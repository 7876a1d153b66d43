use crate::error::NexusResult;
use crate::pipeline::payload::render_value;
use crate::pipeline::{Envelope, Payload, Stage};
use serde_json::Value;

/// Stage that replaces an envelope's data with a `processed(<value>)` marker
///
/// Accepts either an envelope (its `data` is used, all other fields are
/// kept) or any other payload, which is treated as the value itself and
/// wrapped in a new envelope.
pub struct TransformStage;

impl TransformStage {
    pub fn new() -> Self {
        Self
    }

    /// Marker text for a transformed value
    pub fn marker(value: &Value) -> String {
        format!("processed({})", render_value(value))
    }
}

impl Default for TransformStage {
    fn default() -> Self {
        Self::new()
    }
}

impl Stage for TransformStage {
    fn process(&self, input: Payload) -> NexusResult<Payload> {
        let mut envelope = match input {
            Payload::Envelope(envelope) => envelope,
            Payload::Raw(value) => {
                Envelope::from_value(&value).unwrap_or_else(|| Envelope::new(value))
            }
            Payload::Text(text) => Envelope::new(text),
        };

        envelope.data = Value::String(Self::marker(&envelope.data));
        Ok(Payload::Envelope(envelope))
    }

    fn name(&self) -> &str {
        "Transform"
    }
}
