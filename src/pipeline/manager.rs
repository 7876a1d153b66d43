//! Registry and executor for named pipelines
//!
//! The [`Manager`] owns every registered pipeline and adapter, runs them by
//! id and chains them so that each one's output feeds the next.

use super::adapter::Adapter;
use super::core::PipelineMetrics;
use super::executor::Pipeline;
use super::payload::Payload;
use crate::config::StatsPolicy;
use crate::error::{NexusError, NexusResult};
use crate::logger::LogLevel;
use crate::nexus_log;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Anything the manager can hold under an id
pub enum Registered {
    Pipeline(Pipeline),
    Adapter(Adapter),
}

impl Registered {
    pub fn id(&self) -> &str {
        match self {
            Registered::Pipeline(pipeline) => pipeline.id(),
            Registered::Adapter(adapter) => adapter.id(),
        }
    }

    pub fn metrics(&self) -> PipelineMetrics {
        match self {
            Registered::Pipeline(pipeline) => pipeline.metrics(),
            Registered::Adapter(adapter) => adapter.metrics(),
        }
    }

    /// Processing entry point
    ///
    /// Adapters fall back to their own source when `data` is `None`; plain
    /// pipelines receive a JSON null instead.
    pub fn process(&mut self, data: Option<Payload>) -> NexusResult<Payload> {
        match self {
            Registered::Pipeline(pipeline) => {
                pipeline.run(data.unwrap_or(Payload::Raw(Value::Null)))
            }
            Registered::Adapter(adapter) => adapter.process(data),
        }
    }
}

impl From<Pipeline> for Registered {
    fn from(pipeline: Pipeline) -> Self {
        Registered::Pipeline(pipeline)
    }
}

impl From<Adapter> for Registered {
    fn from(adapter: Adapter) -> Self {
        Registered::Adapter(adapter)
    }
}

/// Registry of pipelines keyed by id
///
/// Safe to share between threads. Each entry sits behind its own lock, so
/// different pipelines can run at the same time while runs of one pipeline
/// are serialized.
///
/// # Example
/// ```
/// use nexus_lib::pipeline::{Manager, Payload, Pipeline};
/// use nexus_lib::pipeline::stages::TransformStage;
///
/// let manager = Manager::new();
/// for id in ["A", "B"] {
///     let mut pipeline = Pipeline::new(id);
///     pipeline.add_stage(TransformStage::new());
///     manager.register(pipeline).unwrap();
/// }
///
/// let result = manager.chain(&["A", "B"], Some(Payload::from("x"))).unwrap();
/// assert_eq!(result.as_envelope().unwrap().data, "processed(processed(x))");
/// ```
pub struct Manager {
    pipelines: Mutex<HashMap<String, Arc<Mutex<Registered>>>>,
    stats: Mutex<HashMap<String, u64>>,
    policy: StatsPolicy,
}

impl Manager {
    pub fn new() -> Self {
        Self::with_policy(StatsPolicy::default())
    }

    pub fn with_policy(policy: StatsPolicy) -> Self {
        Self {
            pipelines: Mutex::new(HashMap::new()),
            stats: Mutex::new(HashMap::new()),
            policy,
        }
    }

    pub fn policy(&self) -> StatsPolicy {
        self.policy
    }

    /// Register a pipeline or adapter under its id
    ///
    /// An entry already registered under the same id is replaced.
    pub fn register(&self, pipeline: impl Into<Registered>) -> NexusResult<()> {
        let entry = pipeline.into();
        let id = entry.id().to_string();

        let previous = self
            .pipelines
            .lock()?
            .insert(id.clone(), Arc::new(Mutex::new(entry)));

        if previous.is_some() {
            nexus_log!(LogLevel::Warn, "manager", "Replaced pipeline '{}'", id);
        } else {
            nexus_log!(LogLevel::Info, "manager", "Registered pipeline '{}'", id);
        }
        Ok(())
    }

    pub fn contains(&self, id: &str) -> NexusResult<bool> {
        Ok(self.pipelines.lock()?.contains_key(id))
    }

    /// Registered ids in sorted order
    pub fn pipeline_ids(&self) -> NexusResult<Vec<String>> {
        let mut ids: Vec<String> = self.pipelines.lock()?.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    fn entry(&self, id: &str) -> NexusResult<Arc<Mutex<Registered>>> {
        self.pipelines
            .lock()?
            .get(id)
            .cloned()
            .ok_or_else(|| NexusError::NotFound(id.to_string()))
    }

    /// Run the pipeline registered under `id`
    ///
    /// Under the default policy the execution count for `id` only moves when
    /// the pipeline returns successfully.
    pub fn execute(&self, id: &str, data: Option<Payload>) -> NexusResult<Payload> {
        let entry = self.entry(id)?;

        if self.policy == StatsPolicy::Attempts {
            self.bump(id)?;
        }

        let result = entry.lock()?.process(data)?;

        if self.policy == StatsPolicy::SuccessOnly {
            self.bump(id)?;
        }

        nexus_log!(LogLevel::Debug, "manager", "Executed pipeline '{}'", id);
        Ok(result)
    }

    fn bump(&self, id: &str) -> NexusResult<()> {
        *self.stats.lock()?.entry(id.to_string()).or_insert(0) += 1;
        Ok(())
    }

    /// Run `ids` in order, feeding each output into the next pipeline
    ///
    /// Stops at the first failure and returns its error; later pipelines are
    /// not run. An empty `ids` returns `data` unchanged.
    pub fn chain<S: AsRef<str>>(&self, ids: &[S], data: Option<Payload>) -> NexusResult<Payload> {
        let mut data = data;

        for (step, id) in ids.iter().enumerate() {
            let id = id.as_ref();
            match self.execute(id, data) {
                Ok(output) => data = Some(output),
                Err(e) => {
                    nexus_log!(
                        LogLevel::Error,
                        "manager",
                        "Chain failed at step {}/{} ('{}'): {}",
                        step + 1,
                        ids.len(),
                        id,
                        e
                    );
                    return Err(e);
                }
            }
        }

        Ok(data.unwrap_or(Payload::Raw(Value::Null)))
    }

    /// Execution count for `id`, zero if it has never been counted
    pub fn stats(&self, id: &str) -> NexusResult<u64> {
        Ok(self.stats.lock()?.get(id).copied().unwrap_or(0))
    }

    pub fn stats_snapshot(&self) -> NexusResult<HashMap<String, u64>> {
        Ok(self.stats.lock()?.clone())
    }

    /// Run/error counters of the pipeline currently registered under `id`
    pub fn pipeline_metrics(&self, id: &str) -> NexusResult<PipelineMetrics> {
        let entry = self.entry(id)?;
        let metrics = entry.lock()?.metrics();
        Ok(metrics)
    }
}

impl Default for Manager {
    fn default() -> Self {
        Self::new()
    }
}
