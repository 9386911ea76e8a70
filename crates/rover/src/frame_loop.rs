//! Lock-step frame loop
//!
//! One frame at a time: capture, perceive, steer, actuate, then wait out
//! the rest of the frame period. A slow frame is not made up for. Shutdown
//! and end of input are only noticed between frames.

use std::future::Future;
use std::time::{Duration, Instant};

use actuation::{Actuator, DriveCommand};
use camera_capture::{CameraError, FrameSource, VideoFrame};
use serde::Serialize;
use steering::{OverrideState, OverrideTransition, SteeringCommand, SteeringModule};
use tracing::{debug, error, info, warn, Level};
use vision::{FeatureBundle, VisionModule};

use crate::telemetry::{FRAMES_PROCESSED, FRAME_PROCESSING_SECONDS, LOOP_OVERRUNS, OVERRIDE_ACTIVATIONS};
use crate::{RoverConfig, RoverError};

/// Everything decided for one frame
#[derive(Debug, Clone, Serialize)]
pub struct FrameReport {
    pub sequence: u32,
    pub features: FeatureBundle,
    pub steering: SteeringCommand,
    pub override_state: OverrideState,
    pub override_transition: Option<OverrideTransition>,
    pub drive: DriveCommand,
    pub actuator_failures: usize,
}

/// Why and after how much work the loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopSummary {
    pub frames: u64,
    pub overruns: u64,
    pub reason: StopReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Frame source has no more frames
    EndOfInput,
    /// Shutdown requested
    Shutdown,
}

/// Frame loop owning the source, the actuator and the override state
pub struct FrameLoop<S: FrameSource, A: Actuator> {
    source: S,
    actuator: A,
    vision: VisionModule,
    steering: SteeringModule,
    state: OverrideState,
    period: Duration,
    dt: f64,
}

impl<S: FrameSource, A: Actuator> FrameLoop<S, A> {
    pub fn new(config: &RoverConfig, source: S, actuator: A) -> Result<Self, RoverError> {
        config.validate()?;
        info!(
            "Frame loop: {} fps, override rule {:?}, actuator {}",
            config.camera.fps,
            config.control.override_rule,
            actuator.name()
        );
        Ok(Self {
            source,
            actuator,
            vision: VisionModule::new(config.vision.clone())?,
            steering: SteeringModule::new(config.control.clone())?,
            state: OverrideState::default(),
            period: config.camera.frame_period(),
            dt: config.camera.frame_period_s(),
        })
    }

    pub fn override_state(&self) -> &OverrideState {
        &self.state
    }

    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    pub fn into_parts(self) -> (S, A) {
        (self.source, self.actuator)
    }

    /// Run one frame through perception, steering and actuation
    pub fn process_frame(&mut self, frame: &VideoFrame) -> Result<FrameReport, RoverError> {
        let started = Instant::now();

        let features = self.vision.analyze(frame)?;
        let (steering, outcome) = self.steering.steer(&features, &mut self.state, self.dt);
        if outcome.transition == Some(OverrideTransition::Triggered) {
            metrics::counter!(OVERRIDE_ACTIVATIONS).increment(1);
        }

        if let SteeringCommand::Policy { decision } = &steering {
            debug!("Steer {:+.2}: {}", decision.value, decision.reason);
        }

        let drive = DriveCommand::plan(
            &steering,
            features.wall.vertical_position,
            features.frame_height,
        );
        let actuator_failures = drive.apply(&mut self.actuator);

        metrics::counter!(FRAMES_PROCESSED).increment(1);
        metrics::histogram!(FRAME_PROCESSING_SECONDS).record(started.elapsed().as_secs_f64());

        let report = FrameReport {
            sequence: frame.sequence,
            features,
            steering,
            override_state: self.state,
            override_transition: outcome.transition,
            drive,
            actuator_failures,
        };

        if tracing::enabled!(Level::DEBUG) {
            match serde_json::to_string(&report) {
                Ok(json) => debug!(target: "rover::report", "{}", json),
                Err(e) => warn!("Failed to serialize frame report: {}", e),
            }
        }

        Ok(report)
    }

    /// Run until Ctrl-C or the end of input
    pub async fn run(&mut self) -> Result<LoopSummary, RoverError> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Run until `shutdown` resolves or the end of input.
    ///
    /// The actuator is stopped and cleaned up on every exit path.
    pub async fn run_until<F>(&mut self, shutdown: F) -> Result<LoopSummary, RoverError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut frames = 0u64;
        let mut overruns = 0u64;

        info!("Main loop running. Press Ctrl+C to quit.");
        let result = loop {
            let started = Instant::now();

            let frame = match self.source.capture() {
                Ok(frame) => frame,
                Err(CameraError::Exhausted) => {
                    info!("Frame source exhausted after {} frames", frames);
                    break Ok(StopReason::EndOfInput);
                }
                Err(e) => {
                    error!("Frame capture failed: {}", e);
                    break Err(RoverError::from(e));
                }
            };

            if let Err(e) = self.process_frame(&frame) {
                error!("Frame {} failed: {}", frame.sequence, e);
                break Err(e);
            }
            frames += 1;

            let elapsed = started.elapsed();
            if elapsed > self.period {
                overruns += 1;
                metrics::counter!(LOOP_OVERRUNS).increment(1);
                debug!("Frame {} overran: {:?} > {:?}", frame.sequence, elapsed, self.period);
            }

            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("Shutdown requested");
                    break Ok(StopReason::Shutdown);
                }
                _ = tokio::time::sleep(self.period.saturating_sub(elapsed)) => {}
            }
        };

        self.stop_motors();
        result.map(|reason| LoopSummary {
            frames,
            overruns,
            reason,
        })
    }

    fn stop_motors(&mut self) {
        if let Err(e) = self.actuator.stop_drive() {
            warn!("Failed to stop drive motor: {}", e);
        }
        if let Err(e) = self.actuator.center_steering() {
            warn!("Failed to center steering: {}", e);
        }
        if let Err(e) = self.actuator.cleanup() {
            warn!("Actuator cleanup failed: {}", e);
        }
        info!("Motors stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actuation::{ActuatorCall, DriveAction, SimulatedActuator, SteerAction};
    use camera_capture::FrameQueue;

    const WHITE: [u8; 3] = [220, 220, 220];

    fn config() -> RoverConfig {
        let mut config = RoverConfig::default();
        config.camera.warmup_ms = 0;
        config
    }

    fn empty_loop(config: &RoverConfig) -> FrameLoop<FrameQueue, SimulatedActuator> {
        FrameLoop::new(config, FrameQueue::new(), SimulatedActuator::new()).unwrap()
    }

    #[test]
    fn test_open_floor_cruises() {
        let mut frame_loop = empty_loop(&config());
        let report = frame_loop
            .process_frame(&VideoFrame::filled(640, 480, WHITE))
            .unwrap();

        assert_eq!(report.drive.steer, SteerAction::Center);
        assert_eq!(report.drive.drive, DriveAction::Forward(50.0));
        assert_eq!(report.actuator_failures, 0);
        assert_eq!(
            frame_loop.actuator().calls(),
            &[ActuatorCall::Center, ActuatorCall::Forward(50.0)]
        );
    }

    #[test]
    fn test_wall_filling_view_stops() {
        let mut frame_loop = empty_loop(&config());
        let mut frame = VideoFrame::filled(640, 480, WHITE);
        // Only the bottom rows are floor; envelope sits at y = 450
        frame.fill_rect(0, 450, 640, 30, [10, 10, 10]);

        let report = frame_loop.process_frame(&frame).unwrap();
        assert_eq!(report.features.wall.vertical_position, Some(450));
        assert_eq!(report.drive.drive, DriveAction::Stop);
    }

    #[test]
    fn test_report_serializes() {
        let mut frame_loop = empty_loop(&config());
        let report = frame_loop
            .process_frame(&VideoFrame::filled(64, 48, WHITE))
            .unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["steering"]["source"], "policy");
        assert_eq!(json["steering"]["decision"]["reason"]["rule"], "straight");
    }
}
