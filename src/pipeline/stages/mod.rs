//! Concrete pipeline stages
//!
//! The envelope stages form the standard adapter sequence:
//! 1. InputStage - Wrap raw input in an envelope
//! 2. TransformStage - Replace the envelope data with a processed marker
//! 3. OutputStage - Format the envelope data for display
//!
//! The analyzers summarize batches of domain records (sensor readings,
//! transactions, system events) into one line of text.

pub mod analyzers;
pub mod input;
pub mod output;
pub mod transform;

pub use analyzers::{EventAnalyzer, SensorAnalyzer, TransactionAnalyzer};
pub use input::InputStage;
pub use output::OutputStage;
pub use transform::TransformStage;
