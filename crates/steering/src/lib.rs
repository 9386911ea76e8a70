//! Steering decisions
//!
//! - Priority control policy over the frame's features
//! - Parabola corner gate
//! - Wall-angle override maneuvers that preempt the policy

pub mod config;
pub mod overrides;
pub mod parabola;
pub mod policy;

pub use config::{ControlConfig, ParabolaConfig};
pub use overrides::{
    OverrideController, OverrideOutcome, OverridePhase, OverrideRule, OverrideState,
    OverrideTransition,
};
pub use parabola::{Parabola, ParabolaGate};
pub use policy::{decide, ControlPolicy, CourseLine, PolicyInput, SteerReason, SteeringDecision};

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Steering error types
#[derive(Error, Debug)]
pub enum SteeringError {
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Full-lock turn direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Turn {
    Left,
    Right,
}

impl Turn {
    /// -1 left, +1 right, anything else none
    pub fn from_sign(sign: i8) -> Option<Self> {
        match sign {
            -1 => Some(Turn::Left),
            1 => Some(Turn::Right),
            _ => None,
        }
    }

    /// Turn toward an angle's sign; zero and NaN give none
    pub fn from_angle(angle: f64) -> Option<Self> {
        if angle < 0.0 {
            Some(Turn::Left)
        } else if angle > 0.0 {
            Some(Turn::Right)
        } else {
            None
        }
    }

    pub fn sign(self) -> i8 {
        match self {
            Turn::Left => -1,
            Turn::Right => 1,
        }
    }

    /// Steering value for a full-lock turn
    pub fn value(self) -> f64 {
        self.sign() as f64
    }
}

impl fmt::Display for Turn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Turn::Left => write!(f, "left"),
            Turn::Right => write!(f, "right"),
        }
    }
}

/// Policy plus override machine for one frame size
pub struct SteeringModule {
    policy: ControlPolicy,
    overrides: OverrideController,
    config: ControlConfig,
}

/// What steers this frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum SteeringCommand {
    /// Override maneuver in progress; the policy did not run
    Override { turn: Turn },

    Policy { decision: SteeringDecision },
}

impl SteeringCommand {
    pub fn value(&self) -> f64 {
        match self {
            SteeringCommand::Override { turn } => turn.value(),
            SteeringCommand::Policy { decision } => decision.value,
        }
    }
}

impl SteeringModule {
    pub fn new(config: ControlConfig) -> Result<Self, SteeringError> {
        config.validate()?;
        Ok(Self {
            policy: ControlPolicy::new(&config),
            overrides: OverrideController::new(&config),
            config,
        })
    }

    pub fn config(&self) -> &ControlConfig {
        &self.config
    }

    /// Run the override machine, then the policy if nothing preempted it
    pub fn steer(
        &self,
        features: &vision::FeatureBundle,
        state: &mut OverrideState,
        dt: f64,
    ) -> (SteeringCommand, OverrideOutcome) {
        let outcome = self.overrides.step(state, features.wall.angle_degrees, dt);
        if let Some(turn) = outcome.preempt {
            return (SteeringCommand::Override { turn }, outcome);
        }

        let gate = ParabolaGate::for_frame(
            features.frame_width,
            features.frame_height,
            &self.config.parabola,
        );
        let input = PolicyInput::from_features(features, Some(gate));
        let decision = self.policy.decide(&input);
        (SteeringCommand::Policy { decision }, outcome)
    }
}
