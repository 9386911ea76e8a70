//! Course rover - main entry point

use std::time::Duration;

use actuation::select_actuator;
use anyhow::Context;
use camera_capture::ImageDirSource;
use rover::{init_logging, init_metrics, FrameLoop, RoverConfig};
use tracing::info;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let config = RoverConfig::load().context("loading configuration")?;
    init_logging(&config.log).context("initializing logging")?;

    info!("=== Course Rover v{} ===", env!("CARGO_PKG_VERSION"));
    init_metrics(&config.metrics).context("starting metrics exporter")?;

    let actuator = select_actuator(&config.actuator).context("initializing actuator")?;
    let source = ImageDirSource::open(&config.camera).with_context(|| {
        format!("opening frame source {}", config.camera.source_dir.display())
    })?;

    if config.camera.warmup_ms > 0 {
        info!("Camera warm-up {} ms", config.camera.warmup_ms);
        tokio::time::sleep(Duration::from_millis(config.camera.warmup_ms)).await;
    }

    let mut frame_loop = FrameLoop::new(&config, source, actuator)?;
    let summary = frame_loop.run().await.context("frame loop")?;

    info!(
        "Stopped ({:?}) after {} frames, {} overruns",
        summary.reason, summary.frames, summary.overruns
    );
    Ok(())
}
