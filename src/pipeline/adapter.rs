//! Self-feeding pipelines
//!
//! An [`Adapter`] owns a pipeline pre-loaded with the input, transform and
//! output stages, plus a [`DataSource`] it reads from when a caller supplies
//! no data.

use super::core::PipelineMetrics;
use super::executor::Pipeline;
use super::payload::Payload;
use super::stages::{InputStage, OutputStage, TransformStage};
use crate::error::NexusResult;
use crate::logger::LogLevel;
use crate::nexus_log;
use serde_json::json;

/// Native data supply of an adapter
pub trait DataSource: Send + Sync {
    /// Fetch the next batch of data from this source
    fn read(&self) -> Payload;

    /// Short label for logging, e.g. "json"
    fn kind(&self) -> &str;
}

/// A single JSON sensor record
pub struct JsonSource;

impl DataSource for JsonSource {
    fn read(&self) -> Payload {
        Payload::Raw(json!({"sensor": "temp", "value": 23.5}))
    }

    fn kind(&self) -> &str {
        "json"
    }
}

/// A delimited header line
pub struct CsvSource;

impl DataSource for CsvSource {
    fn read(&self) -> Payload {
        Payload::from("user,action,timestamp")
    }

    fn kind(&self) -> &str {
        "csv"
    }
}

/// An ordered run of text readings
pub struct StreamSource;

impl DataSource for StreamSource {
    fn read(&self) -> Payload {
        Payload::Raw(json!(["22.1", "22.3", "22.0"]))
    }

    fn kind(&self) -> &str {
        "stream"
    }
}

/// Run `pipeline` on `data`, reading from `source` when `data` is absent
pub fn run_with_source(
    pipeline: &mut Pipeline,
    source: &dyn DataSource,
    data: Option<Payload>,
) -> NexusResult<Payload> {
    let input = match data {
        Some(data) => data,
        None => {
            nexus_log!(
                LogLevel::Debug,
                "adapter",
                "No data supplied to '{}', reading from {} source",
                pipeline.id(),
                source.kind()
            );
            source.read()
        }
    };
    pipeline.run(input)
}

/// Pipeline that can supply its own input
pub struct Adapter {
    pipeline: Pipeline,
    source: Box<dyn DataSource>,
}

impl Adapter {
    /// Create an adapter with the standard input/transform/output stages
    pub fn new<D: DataSource + 'static>(id: impl Into<String>, source: D) -> Self {
        let pipeline = Pipeline::builder(id)
            .add_stage(InputStage::new())
            .add_stage(TransformStage::new())
            .add_stage(OutputStage::new())
            .build();

        Self {
            pipeline,
            source: Box::new(source),
        }
    }

    pub fn json(id: impl Into<String>) -> Self {
        Self::new(id, JsonSource)
    }

    pub fn csv(id: impl Into<String>) -> Self {
        Self::new(id, CsvSource)
    }

    pub fn stream(id: impl Into<String>) -> Self {
        Self::new(id, StreamSource)
    }

    pub fn id(&self) -> &str {
        self.pipeline.id()
    }

    pub fn kind(&self) -> &str {
        self.source.kind()
    }

    /// Fetch data from this adapter's source without running it
    pub fn read(&self) -> Payload {
        self.source.read()
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn metrics(&self) -> PipelineMetrics {
        self.pipeline.metrics()
    }

    /// Process `data`, or this adapter's own data when `None`
    pub fn process(&mut self, data: Option<Payload>) -> NexusResult<Payload> {
        run_with_source(&mut self.pipeline, self.source.as_ref(), data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingSource {
        reads: Arc<AtomicUsize>,
    }

    impl DataSource for CountingSource {
        fn read(&self) -> Payload {
            self.reads.fetch_add(1, Ordering::SeqCst);
            Payload::from("from source")
        }

        fn kind(&self) -> &str {
            "counting"
        }
    }

    #[test]
    fn test_adapter_installs_standard_stages() {
        let adapter = Adapter::csv("transaction");
        assert_eq!(
            adapter.pipeline().stage_names(),
            vec!["Input", "Transform", "Output"]
        );
        assert_eq!(adapter.id(), "transaction");
        assert_eq!(adapter.kind(), "csv");
    }

    #[test]
    fn test_no_data_reads_from_source() {
        let reads = Arc::new(AtomicUsize::new(0));
        let mut adapter = Adapter::new(
            "custom",
            CountingSource {
                reads: Arc::clone(&reads),
            },
        );

        let output = adapter.process(None).unwrap();

        assert_eq!(reads.load(Ordering::SeqCst), 1);
        assert_eq!(output.as_text(), Some("Output: processed(from source)"));
    }

    #[test]
    fn test_explicit_data_bypasses_source() {
        let reads = Arc::new(AtomicUsize::new(0));
        let mut adapter = Adapter::new(
            "custom",
            CountingSource {
                reads: Arc::clone(&reads),
            },
        );

        let output = adapter.process(Some(Payload::from("supplied"))).unwrap();

        assert_eq!(reads.load(Ordering::SeqCst), 0);
        assert_eq!(output.as_text(), Some("Output: processed(supplied)"));
        assert_eq!(adapter.metrics().runs, 1);
    }

    #[test]
    fn test_builtin_sources() {
        let mut json = Adapter::json("sensor");
        let output = json.process(None).unwrap();
        assert_eq!(
            output.as_text(),
            Some(r#"Output: processed({"sensor":"temp","value":23.5})"#)
        );

        let mut csv = Adapter::csv("transaction");
        let output = csv.process(None).unwrap();
        assert_eq!(
            output.as_text(),
            Some("Output: processed(user,action,timestamp)")
        );

        let mut stream = Adapter::stream("event");
        let output = stream.process(None).unwrap();
        assert_eq!(
            output.as_text(),
            Some(r#"Output: processed(["22.1","22.3","22.0"])"#)
        );
    }

    #[test]
    fn test_read_is_deterministic() {
        let adapter = Adapter::stream("event");
        assert_eq!(adapter.read(), adapter.read());
    }
}
