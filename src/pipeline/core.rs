use crate::error::{NexusError, NexusResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use super::payload::Payload;

/// A single transformation step in a pipeline
///
/// Stages are constructed once and reused across runs; `process` takes the
/// previous stage's output and returns the input for the next one.
///
/// # Example
/// ```
/// use nexus_lib::error::NexusResult;
/// use nexus_lib::pipeline::{Payload, Stage};
///
/// struct Shout;
///
/// impl Stage for Shout {
///     fn process(&self, input: Payload) -> NexusResult<Payload> {
///         Ok(Payload::Text(input.to_string().to_uppercase()))
///     }
///
///     fn name(&self) -> &str {
///         "Shout"
///     }
/// }
/// ```
pub trait Stage: Send + Sync {
    /// Transform `input` into this stage's output
    ///
    /// Stages that never specialize this fail with `NotImplemented`.
    fn process(&self, _input: Payload) -> NexusResult<Payload> {
        Err(NexusError::NotImplemented(self.name().to_string()))
    }

    /// Get stage name for logging and run reports
    fn name(&self) -> &str;
}

/// Result of a pipeline stage execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageResult {
    pub stage_name: String,
    pub success: bool,
    pub error: Option<String>,
    pub duration: Duration,
}

impl StageResult {
    pub fn success(stage_name: impl Into<String>, duration: Duration) -> Self {
        Self {
            stage_name: stage_name.into(),
            success: true,
            error: None,
            duration,
        }
    }

    pub fn failure(
        stage_name: impl Into<String>,
        error: impl Into<String>,
        duration: Duration,
    ) -> Self {
        Self {
            stage_name: stage_name.into(),
            success: false,
            error: Some(error.into()),
            duration,
        }
    }
}

/// Report of a single pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResult {
    /// Unique id of this run
    pub run_id: Uuid,

    pub pipeline_id: String,

    pub started_at: DateTime<Utc>,

    pub success: bool,

    /// Results from each stage that was executed
    pub stage_results: Vec<StageResult>,

    pub total_duration: Duration,

    /// Error message if failed
    pub error: Option<String>,
}

impl PipelineResult {
    pub fn success(
        pipeline_id: impl Into<String>,
        started_at: DateTime<Utc>,
        stage_results: Vec<StageResult>,
        total_duration: Duration,
    ) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            pipeline_id: pipeline_id.into(),
            started_at,
            success: true,
            stage_results,
            total_duration,
            error: None,
        }
    }

    pub fn failure(
        pipeline_id: impl Into<String>,
        started_at: DateTime<Utc>,
        stage_results: Vec<StageResult>,
        error: impl Into<String>,
        total_duration: Duration,
    ) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            pipeline_id: pipeline_id.into(),
            started_at,
            success: false,
            stage_results,
            total_duration,
            error: Some(error.into()),
        }
    }

    /// Number of stages that ran, including a failing one
    pub fn executed_stages(&self) -> usize {
        self.stage_results.len()
    }

    /// Get the stage that failed (if any)
    pub fn failed_stage(&self) -> Option<&StageResult> {
        self.stage_results.iter().find(|r| !r.success)
    }
}

/// Run counters kept by every pipeline
///
/// `errors` never exceeds `runs`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineMetrics {
    pub runs: u64,
    pub errors: u64,
}

impl PipelineMetrics {
    pub fn successes(&self) -> u64 {
        self.runs.saturating_sub(self.errors)
    }
}
