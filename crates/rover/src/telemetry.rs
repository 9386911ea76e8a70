//! Logging and metrics setup

use std::str::FromStr;

use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use crate::config::{LogConfig, MetricsConfig};
use crate::RoverError;

/// Frames that went through the whole pipeline
pub const FRAMES_PROCESSED: &str = "rover_frames_processed_total";

/// Perception to actuation time per frame (seconds)
pub const FRAME_PROCESSING_SECONDS: &str = "rover_frame_processing_seconds";

/// Frames that took longer than the frame period
pub const LOOP_OVERRUNS: &str = "rover_loop_overruns_total";

/// Override maneuvers started
pub const OVERRIDE_ACTIVATIONS: &str = "rover_override_activations_total";

/// Initialize logging
pub fn init_logging(config: &LogConfig) -> Result<(), RoverError> {
    let level = Level::from_str(&config.level)
        .map_err(|_| RoverError::Config(format!("unknown log level '{}'", config.level)))?;

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true);

    let result = if config.json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };
    result.map_err(|e| RoverError::Logging(e.to_string()))
}

/// Start the Prometheus exporter when an address is configured
pub fn init_metrics(config: &MetricsConfig) -> Result<(), RoverError> {
    let Some(addr) = config.listen else {
        return Ok(());
    };

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| RoverError::Metrics(e.to_string()))?;

    metrics::describe_counter!(FRAMES_PROCESSED, "Frames processed end to end");
    metrics::describe_histogram!(
        FRAME_PROCESSING_SECONDS,
        metrics::Unit::Seconds,
        "Per-frame processing time"
    );
    metrics::describe_counter!(LOOP_OVERRUNS, "Frames that exceeded the frame period");
    metrics::describe_counter!(OVERRIDE_ACTIVATIONS, "Wall override maneuvers started");
    metrics::describe_counter!("rover_actuator_failures_total", "Failed actuator commands");

    info!("Prometheus metrics on http://{}/metrics", addr);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_level_rejected() {
        let config = LogConfig {
            level: "loud".to_string(),
            json: false,
        };
        assert!(matches!(init_logging(&config), Err(RoverError::Config(_))));
    }

    #[test]
    fn test_metrics_disabled_by_default() {
        assert!(init_metrics(&MetricsConfig::default()).is_ok());
    }
}
