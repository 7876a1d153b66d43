use nexus_lib::logger::LOGGER;
use nexus_lib::pipeline::stages::{EventAnalyzer, SensorAnalyzer, TransactionAnalyzer, TransformStage};
use nexus_lib::pipeline::{Adapter, Manager, Payload, Pipeline, Stage};
use nexus_lib::{NexusConfig, NexusResult};
use serde_json::json;
use tracing_subscriber::EnvFilter;

fn main() -> NexusResult<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => NexusConfig::load(path)?,
        None => NexusConfig::default(),
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_filter.as_str()));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    LOGGER.set_min_level(config.log_level);

    println!("=== CODE NEXUS - POLYMORPHIC PIPELINE SYSTEM ===\n");

    let manager = Manager::with_policy(config.stats_policy);
    manager.register(Adapter::json("sensor"))?;
    manager.register(Adapter::csv("transaction"))?;
    manager.register(Adapter::stream("event"))?;

    for (id, label) in [("sensor", "Sensor"), ("transaction", "Transaction"), ("event", "Event")] {
        println!("Initializing {} Stream...", label);
        match manager.execute(id, None) {
            Ok(output) => println!("{}\n", output),
            Err(e) => println!("Error: {}\n", e),
        }
    }

    println!("=== Batch Analysis ===");
    let analyses: [(Box<dyn Stage>, Payload); 3] = [
        (
            Box::new(SensorAnalyzer::with_calibration(config.sensor_calibration)),
            Payload::Raw(json!([{"temp": 22.5}, {"temp": 21.0}, {"temp": 24.0}])),
        ),
        (
            Box::new(TransactionAnalyzer::new()),
            Payload::Raw(json!([
                {"type": "buy", "amount": 100},
                {"type": "sell", "amount": 150},
                {"type": "buy", "amount": 25}
            ])),
        ),
        (
            Box::new(EventAnalyzer::new()),
            Payload::Raw(json!(["login", "error", "logout"])),
        ),
    ];
    for (analyzer, batch) in analyses {
        match analyzer.process(batch) {
            Ok(summary) => println!("- {}", summary),
            Err(e) => println!("- Error: {}", e),
        }
    }

    println!("\n=== Pipeline Chaining Demo ===");
    for id in ["A", "B", "C"] {
        let mut pipeline = Pipeline::new(id);
        pipeline.add_stage(TransformStage::new());
        manager.register(pipeline)?;
    }
    match manager.chain(&["A", "B", "C"], Some(Payload::from("raw_data"))) {
        Ok(result) => println!("Chain result: {}", result),
        Err(e) => println!("Chain failed: {}", e),
    }

    println!("\n=== Execution Stats ===");
    for id in manager.pipeline_ids()? {
        let metrics = manager.pipeline_metrics(&id)?;
        println!(
            "{}: {} executions ({} runs, {} errors)",
            id,
            manager.stats(&id)?,
            metrics.runs,
            metrics.errors
        );
    }

    tracing::debug!(entries = LOGGER.recent().len(), "buffered log entries");
    Ok(())
}
