use super::core::{PipelineMetrics, PipelineResult, Stage, StageResult};
use super::payload::Payload;
use crate::error::NexusResult;
use crate::logger::LogLevel;
use crate::nexus_log;
use chrono::Utc;
use std::time::Instant;

/// Named, ordered sequence of stages
///
/// Stages run in insertion order, each one's output feeding the next. Every
/// call to `run` counts as one run; a failing call also counts one error.
///
/// # Example
/// ```
/// use nexus_lib::pipeline::{Payload, Pipeline};
/// use nexus_lib::pipeline::stages::{InputStage, OutputStage, TransformStage};
///
/// let mut pipeline = Pipeline::builder("display")
///     .add_stage(InputStage::new())
///     .add_stage(TransformStage::new())
///     .add_stage(OutputStage::new())
///     .build();
///
/// let output = pipeline.run(Payload::from("reading")).unwrap();
/// assert_eq!(output.as_text(), Some("Output: processed(reading)"));
/// ```
pub struct Pipeline {
    id: String,
    stages: Vec<Box<dyn Stage>>,
    metrics: PipelineMetrics,
    last_report: Option<PipelineResult>,
}

impl Pipeline {
    /// Create an empty pipeline
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            stages: Vec::new(),
            metrics: PipelineMetrics::default(),
            last_report: None,
        }
    }

    pub fn builder(id: impl Into<String>) -> PipelineBuilder {
        PipelineBuilder::new(id)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    pub fn metrics(&self) -> PipelineMetrics {
        self.metrics
    }

    /// Report of the most recent run, if any
    pub fn last_report(&self) -> Option<&PipelineResult> {
        self.last_report.as_ref()
    }

    /// Append a stage; it runs after every stage already present
    pub fn add_stage<S: Stage + 'static>(&mut self, stage: S) {
        self.stages.push(Box::new(stage));
    }

    pub fn add_boxed_stage(&mut self, stage: Box<dyn Stage>) {
        self.stages.push(stage);
    }

    /// Fold `data` through every stage in order
    ///
    /// A stage failure stops the run and is returned to the caller as is.
    pub fn run(&mut self, data: Payload) -> NexusResult<Payload> {
        self.metrics.runs += 1;

        nexus_log!(
            LogLevel::Debug,
            "pipeline",
            "Starting pipeline '{}' with {} stages (run {})",
            self.id,
            self.stages.len(),
            self.metrics.runs
        );

        let started_at = Utc::now();
        let pipeline_start = Instant::now();
        let mut stage_results = Vec::with_capacity(self.stages.len());
        let mut data = data;

        for (index, stage) in self.stages.iter().enumerate() {
            let stage_name = stage.name();
            let stage_start = Instant::now();

            match stage.process(data) {
                Ok(output) => {
                    let duration = stage_start.elapsed();
                    nexus_log!(
                        LogLevel::Debug,
                        "pipeline",
                        "Stage {}/{} '{}' of '{}' completed in {}us",
                        index + 1,
                        self.stages.len(),
                        stage_name,
                        self.id,
                        duration.as_micros()
                    );
                    stage_results.push(StageResult::success(stage_name, duration));
                    data = output;
                }
                Err(e) => {
                    let duration = stage_start.elapsed();
                    let error_msg = e.to_string();
                    nexus_log!(
                        LogLevel::Error,
                        "pipeline",
                        "Stage '{}' of '{}' failed: {}",
                        stage_name,
                        self.id,
                        error_msg
                    );

                    stage_results.push(StageResult::failure(stage_name, &error_msg, duration));
                    self.metrics.errors += 1;
                    self.last_report = Some(PipelineResult::failure(
                        &self.id,
                        started_at,
                        stage_results,
                        error_msg,
                        pipeline_start.elapsed(),
                    ));
                    return Err(e);
                }
            }
        }

        let total_duration = pipeline_start.elapsed();
        nexus_log!(
            LogLevel::Info,
            "pipeline",
            "Pipeline '{}' completed {} stages in {}us",
            self.id,
            stage_results.len(),
            total_duration.as_micros()
        );

        self.last_report = Some(PipelineResult::success(
            &self.id,
            started_at,
            stage_results,
            total_duration,
        ));
        Ok(data)
    }
}

/// Builder for constructing pipelines
pub struct PipelineBuilder {
    id: String,
    stages: Vec<Box<dyn Stage>>,
}

impl PipelineBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            stages: Vec::new(),
        }
    }

    pub fn add_stage<S: Stage + 'static>(mut self, stage: S) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    pub fn add_boxed_stage(mut self, stage: Box<dyn Stage>) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn build(self) -> Pipeline {
        let mut pipeline = Pipeline::new(self.id);
        pipeline.stages = self.stages;
        pipeline
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NexusError;
    use crate::pipeline::stages::{OutputStage, TransformStage};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    // Appends its tag to a text payload
    struct TagStage {
        tag: &'static str,
    }

    impl Stage for TagStage {
        fn process(&self, input: Payload) -> NexusResult<Payload> {
            Ok(Payload::Text(format!("{}{}", input, self.tag)))
        }

        fn name(&self) -> &str {
            self.tag
        }
    }

    struct FailStage;

    impl Stage for FailStage {
        fn process(&self, _input: Payload) -> NexusResult<Payload> {
            Err(NexusError::MalformedInput("stage k failed".to_string()))
        }

        fn name(&self) -> &str {
            "Fail"
        }
    }

    struct CountingStage {
        calls: Arc<AtomicUsize>,
    }

    impl Stage for CountingStage {
        fn process(&self, input: Payload) -> NexusResult<Payload> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(input)
        }

        fn name(&self) -> &str {
            "Counting"
        }
    }

    #[test]
    fn test_stages_run_in_registration_order() {
        let mut pipeline = Pipeline::builder("order")
            .add_stage(TagStage { tag: "a" })
            .add_stage(TagStage { tag: "b" })
            .add_stage(TagStage { tag: "c" })
            .build();

        let output = pipeline.run(Payload::from(">")).unwrap();

        assert_eq!(output.as_text(), Some(">abc"));
        assert_eq!(pipeline.stage_names(), vec!["a", "b", "c"]);
        assert_eq!(pipeline.metrics(), PipelineMetrics { runs: 1, errors: 0 });
    }

    #[test]
    fn test_empty_pipeline_returns_input() {
        let mut pipeline = Pipeline::new("empty");
        let output = pipeline.run(Payload::from(json!(7))).unwrap();

        assert_eq!(output, Payload::from(json!(7)));
        assert_eq!(pipeline.metrics().runs, 1);
    }

    #[test]
    fn test_failure_counts_once_and_stops() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut pipeline = Pipeline::new("failing");
        pipeline.add_stage(TagStage { tag: "a" });
        pipeline.add_stage(FailStage);
        pipeline.add_stage(CountingStage {
            calls: Arc::clone(&calls),
        });

        let result = pipeline.run(Payload::from("x"));

        match result {
            Err(NexusError::MalformedInput(msg)) => assert_eq!(msg, "stage k failed"),
            other => panic!("expected the stage error, got {:?}", other),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(pipeline.metrics(), PipelineMetrics { runs: 1, errors: 1 });
        assert_eq!(pipeline.stage_count(), 3);

        let report = pipeline.last_report().unwrap();
        assert!(!report.success);
        assert_eq!(report.executed_stages(), 2);
        assert_eq!(report.failed_stage().unwrap().stage_name, "Fail");
    }

    #[test]
    fn test_metrics_accumulate_across_runs() {
        let mut pipeline = Pipeline::builder("display")
            .add_stage(TransformStage::new())
            .add_stage(OutputStage::new())
            .build();

        pipeline.run(Payload::from("a")).unwrap();
        pipeline.run(Payload::Text("b".to_string())).unwrap();
        pipeline.run(Payload::from("c")).unwrap();

        let metrics = pipeline.metrics();
        assert_eq!(metrics.runs, 3);
        assert_eq!(metrics.errors, 0);
        assert!(metrics.errors <= metrics.runs);
        assert!(pipeline.last_report().unwrap().success);
    }

    #[test]
    fn test_add_stage_appends() {
        let mut pipeline = Pipeline::new("growing");
        assert_eq!(pipeline.stage_count(), 0);

        pipeline.add_stage(TransformStage::new());
        pipeline.add_boxed_stage(Box::new(OutputStage::new()));

        assert_eq!(pipeline.stage_names(), vec!["Transform", "Output"]);
    }
}
