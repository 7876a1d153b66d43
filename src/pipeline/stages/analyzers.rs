use crate::error::{NexusError, NexusResult};
use crate::pipeline::{Payload, Stage};
use serde_json::Value;

/// Pull the record batch out of a raw array or an envelope whose data is an array
fn records(input: &Payload, stage: &str) -> NexusResult<Vec<Value>> {
    let value = match input {
        Payload::Raw(Value::Array(items)) => return Ok(items.clone()),
        Payload::Raw(value) => Some(value.clone()),
        Payload::Envelope(envelope) => Some(envelope.data.clone()),
        Payload::Text(_) => None,
    };

    let value = match value {
        Some(Value::Object(map)) => map.get("data").cloned(),
        other => other,
    };

    match value {
        Some(Value::Array(items)) => Ok(items),
        _ => Err(NexusError::MalformedInput(format!(
            "{} expects a list of records",
            stage
        ))),
    }
}

/// Whole numbers print without a fractional part
fn format_units(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{:.2}", value)
    }
}

/// Averages the `temp` field of sensor readings
///
/// Records without a numeric `temp` are ignored. A fixed calibration offset
/// is added to each reading.
pub struct SensorAnalyzer {
    calibration: f64,
}

impl SensorAnalyzer {
    pub fn new() -> Self {
        Self { calibration: 0.0 }
    }

    pub fn with_calibration(calibration: f64) -> Self {
        Self { calibration }
    }
}

impl Default for SensorAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Stage for SensorAnalyzer {
    fn process(&self, input: Payload) -> NexusResult<Payload> {
        let temps: Vec<f64> = records(&input, self.name())?
            .iter()
            .filter_map(|r| r.get("temp").and_then(Value::as_f64))
            .map(|t| t + self.calibration)
            .collect();

        let avg = if temps.is_empty() {
            0.0
        } else {
            temps.iter().sum::<f64>() / temps.len() as f64
        };

        Ok(Payload::Text(format!(
            "Sensor analysis: {} readings processed, avg temp: {:.1}°C",
            temps.len(),
            avg
        )))
    }

    fn name(&self) -> &str {
        "Sensor Analyzer"
    }
}

/// Computes net flow over buy/sell transactions
///
/// Sells add their `amount`, buys subtract it; other types count as
/// operations but do not move the balance.
pub struct TransactionAnalyzer;

impl TransactionAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TransactionAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Stage for TransactionAnalyzer {
    fn process(&self, input: Payload) -> NexusResult<Payload> {
        let batch = records(&input, self.name())?;

        let net: f64 = batch
            .iter()
            .map(|tx| {
                let amount = tx.get("amount").and_then(Value::as_f64).unwrap_or(0.0);
                match tx.get("type").and_then(Value::as_str) {
                    Some("sell") => amount,
                    Some("buy") => -amount,
                    _ => 0.0,
                }
            })
            .sum();

        let sign = if net > 0.0 { "+" } else { "" };
        Ok(Payload::Text(format!(
            "Transaction analysis: {} operations, net flow: {}{} units",
            batch.len(),
            sign,
            format_units(net)
        )))
    }

    fn name(&self) -> &str {
        "Transaction Analyzer"
    }
}

/// Counts `"error"` entries in a batch of system events
pub struct EventAnalyzer;

impl EventAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for EventAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Stage for EventAnalyzer {
    fn process(&self, input: Payload) -> NexusResult<Payload> {
        let batch = records(&input, self.name())?;
        let errors = batch
            .iter()
            .filter(|e| e.as_str() == Some("error"))
            .count();

        let noun = if errors == 1 { "error" } else { "errors" };
        Ok(Payload::Text(format!(
            "Event analysis: {} events, {} {} detected",
            batch.len(),
            errors,
            noun
        )))
    }

    fn name(&self) -> &str {
        "Event Analyzer"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Envelope;
    use serde_json::json;

    #[test]
    fn test_sensor_average() {
        let batch = json!([{"temp": 22.5}, {"temp": 21.0}, {"temp": 24.0}]);
        let output = SensorAnalyzer::new().process(Payload::from(batch)).unwrap();

        assert_eq!(
            output.as_text(),
            Some("Sensor analysis: 3 readings processed, avg temp: 22.5°C")
        );
    }

    #[test]
    fn test_sensor_calibration_and_skipped_records() {
        let batch = json!([{"temp": 20.0}, {"humidity": 40}, {"temp": "hot"}]);
        let output = SensorAnalyzer::with_calibration(1.0)
            .process(Payload::from(batch))
            .unwrap();

        assert_eq!(
            output.as_text(),
            Some("Sensor analysis: 1 readings processed, avg temp: 21.0°C")
        );
    }

    #[test]
    fn test_sensor_empty_batch() {
        let output = SensorAnalyzer::new().process(Payload::from(json!([]))).unwrap();
        assert_eq!(
            output.as_text(),
            Some("Sensor analysis: 0 readings processed, avg temp: 0.0°C")
        );
    }

    #[test]
    fn test_transaction_net_flow() {
        let batch = json!([
            {"type": "buy", "amount": 100},
            {"type": "sell", "amount": 150},
            {"type": "buy", "amount": 25}
        ]);
        let output = TransactionAnalyzer::new().process(Payload::from(batch)).unwrap();

        assert_eq!(
            output.as_text(),
            Some("Transaction analysis: 3 operations, net flow: +25 units")
        );
    }

    #[test]
    fn test_transaction_negative_fractional_flow() {
        let batch = json!([{"type": "buy", "amount": 10.5}, {"type": "refund", "amount": 99}]);
        let output = TransactionAnalyzer::new().process(Payload::from(batch)).unwrap();

        assert_eq!(
            output.as_text(),
            Some("Transaction analysis: 2 operations, net flow: -10.50 units")
        );
    }

    #[test]
    fn test_event_error_count() {
        let batch = json!(["login", "error", "logout"]);
        let output = EventAnalyzer::new().process(Payload::from(batch)).unwrap();
        assert_eq!(
            output.as_text(),
            Some("Event analysis: 3 events, 1 error detected")
        );

        let batch = json!(["error", "error", 7]);
        let output = EventAnalyzer::new().process(Payload::from(batch)).unwrap();
        assert_eq!(
            output.as_text(),
            Some("Event analysis: 3 events, 2 errors detected")
        );
    }

    #[test]
    fn test_analyzers_accept_envelopes() {
        let input = Payload::from(Envelope::new(json!(["error"])).with_status("input_ok"));
        let output = EventAnalyzer::new().process(input).unwrap();
        assert_eq!(
            output.as_text(),
            Some("Event analysis: 1 events, 1 error detected")
        );
    }

    #[test]
    fn test_non_list_is_malformed() {
        let result = SensorAnalyzer::new().process(Payload::from("22.5"));
        assert!(matches!(result, Err(NexusError::MalformedInput(_))));

        let result = EventAnalyzer::new().process(Payload::Text("error".to_string()));
        assert!(matches!(result, Err(NexusError::MalformedInput(_))));
    }
}
