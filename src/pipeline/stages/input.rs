use crate::error::NexusResult;
use crate::pipeline::{Envelope, Payload, Stage};

/// Status attached to freshly wrapped input
pub const INPUT_OK: &str = "input_ok";

/// Stage that wraps whatever it receives in an envelope
///
/// # Context Outputs
/// - `Payload::Envelope` with `data` set to the input and status `input_ok`
pub struct InputStage;

impl InputStage {
    pub fn new() -> Self {
        Self
    }
}

impl Default for InputStage {
    fn default() -> Self {
        Self::new()
    }
}

impl Stage for InputStage {
    fn process(&self, input: Payload) -> NexusResult<Payload> {
        let data = match input {
            Payload::Raw(value) => value,
            other => other.to_value(),
        };
        Ok(Payload::Envelope(Envelope::new(data).with_status(INPUT_OK)))
    }

    fn name(&self) -> &str {
        "Input"
    }
}
