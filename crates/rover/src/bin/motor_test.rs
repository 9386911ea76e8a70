//! Motor bench test: forward, backward, left, right for two seconds each,
//! repeating until Ctrl-C

use std::time::{Duration, Instant};

use actuation::{select_actuator, MotorTestSequence};
use anyhow::Context;
use rover::{init_logging, RoverConfig};
use tracing::{info, warn};

const STEP: Duration = Duration::from_secs(2);
const SPEED_PERCENT: f64 = 50.0;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let config = RoverConfig::load().context("loading configuration")?;
    init_logging(&config.log).context("initializing logging")?;

    let mut actuator = select_actuator(&config.actuator).context("initializing actuator")?;
    info!("Motor test on {} actuator. Press Ctrl+C to quit.", actuator.name());

    let mut sequence = MotorTestSequence::new(STEP, SPEED_PERCENT);
    let mut ticker = tokio::time::interval(config.camera.frame_period());
    let started = Instant::now();

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => {
                info!("Test interrupted by user");
                break;
            }
            _ = ticker.tick() => {
                sequence.tick(started.elapsed(), actuator.as_mut());
            }
        }
    }

    if let Err(e) = actuator.stop_drive().and_then(|_| actuator.center_steering()) {
        warn!("Failed to stop motors: {}", e);
    }
    actuator.cleanup().context("releasing actuator")?;
    Ok(())
}
