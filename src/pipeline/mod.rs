//! Processing pipelines built from ordered stages
//!
//! A [`Stage`] turns one [`Payload`] into another. A [`Pipeline`] folds its
//! input through its stages in order and counts runs and errors. An
//! [`Adapter`] is a pipeline with a fixed stage sequence and its own data
//! source, and the [`Manager`] runs registered pipelines by id or chains
//! them.
//!
//! # Example
//! ```
//! use nexus_lib::pipeline::{Adapter, Manager};
//!
//! let manager = Manager::new();
//! manager.register(Adapter::csv("transaction")).unwrap();
//!
//! let output = manager.execute("transaction", None).unwrap();
//! assert_eq!(output.as_text(), Some("Output: processed(user,action,timestamp)"));
//! ```

pub mod adapter;
pub mod core;
pub mod executor;
pub mod manager;
pub mod payload;
pub mod stages;

// Re-export main types
pub use adapter::{Adapter, CsvSource, DataSource, JsonSource, StreamSource};
pub use core::{PipelineMetrics, PipelineResult, Stage, StageResult};
pub use executor::{Pipeline, PipelineBuilder};
pub use manager::{Manager, Registered};
pub use payload::{Envelope, Payload};
