use crate::error::{NexusError, NexusResult};
use crate::pipeline::payload::render_value;
use crate::pipeline::{Payload, Stage};

/// Stage that formats an envelope's data as `Output: <data>`
///
/// # Context Requirements
/// - Input: an envelope, or a JSON object with a `data` field
pub struct OutputStage;

impl OutputStage {
    pub fn new() -> Self {
        Self
    }
}

impl Default for OutputStage {
    fn default() -> Self {
        Self::new()
    }
}

impl Stage for OutputStage {
    fn process(&self, input: Payload) -> NexusResult<Payload> {
        let envelope = input.into_envelope().ok_or_else(|| {
            NexusError::MalformedInput("output stage requires a `data` field".to_string())
        })?;

        Ok(Payload::Text(format!("Output: {}", render_value(&envelope.data))))
    }

    fn name(&self) -> &str {
        "Output"
    }
}
