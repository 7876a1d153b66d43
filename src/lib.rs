//! Composable processing pipelines
//!
//! Stages are chained into named [`pipeline::Pipeline`]s, adapters add a
//! built-in data source, and a [`pipeline::Manager`] runs pipelines by id or
//! chains several of them together.

pub mod config;
pub mod error;
pub mod logger;
pub mod pipeline;

// Used by `nexus_log!` at call sites outside this crate
#[doc(hidden)]
pub use log;

pub use config::{NexusConfig, StatsPolicy};
pub use error::{NexusError, NexusResult};
