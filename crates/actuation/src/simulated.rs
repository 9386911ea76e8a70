//! Simulated actuator
//!
//! Records recent commands and keeps the last drive speed and steering
//! position so callers can read back what the hardware would be doing.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{ActuationError, Actuator};

/// Default number of calls kept in the log
pub const CALL_LOG_CAPACITY: usize = 1024;

/// Steering motor position as last commanded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SteeringPosition {
    Left,
    Right,
    #[default]
    Center,
}

/// Last commanded motor state
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MotorState {
    /// Last forward speed (percent); backward and stop do not change it
    pub drive_speed: f64,
    pub steering: SteeringPosition,
}

/// One actuator call
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ActuatorCall {
    Forward(f64),
    Backward(f64),
    Stop,
    SteerLeft,
    SteerRight,
    Center,
    Cleanup,
}

/// No-hardware actuator
#[derive(Debug)]
pub struct SimulatedActuator {
    state: MotorState,
    calls: Vec<ActuatorCall>,
    capacity: usize,
}

impl Default for SimulatedActuator {
    fn default() -> Self {
        Self::with_call_log(CALL_LOG_CAPACITY)
    }
}

impl SimulatedActuator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep at most `capacity` of the most recent calls
    pub fn with_call_log(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            state: MotorState::default(),
            calls: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn motor_state(&self) -> MotorState {
        self.state
    }

    /// Most recent calls, oldest first
    pub fn calls(&self) -> &[ActuatorCall] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    fn record(&mut self, call: ActuatorCall) {
        debug!("Simulated actuator: {:?}", call);
        if self.calls.len() == self.capacity {
            // Drop the older half so trimming stays amortized
            self.calls.drain(..self.capacity.div_ceil(2));
        }
        self.calls.push(call);
    }
}

impl Actuator for SimulatedActuator {
    fn name(&self) -> &'static str {
        "simulated"
    }

    fn move_forward(&mut self, percent: f64) -> Result<(), ActuationError> {
        self.state.drive_speed = percent;
        self.record(ActuatorCall::Forward(percent));
        Ok(())
    }

    fn move_backward(&mut self, percent: f64) -> Result<(), ActuationError> {
        self.record(ActuatorCall::Backward(percent));
        Ok(())
    }

    fn stop_drive(&mut self) -> Result<(), ActuationError> {
        self.record(ActuatorCall::Stop);
        Ok(())
    }

    fn steer_left(&mut self) -> Result<(), ActuationError> {
        self.state.steering = SteeringPosition::Left;
        self.record(ActuatorCall::SteerLeft);
        Ok(())
    }

    fn steer_right(&mut self) -> Result<(), ActuationError> {
        self.state.steering = SteeringPosition::Right;
        self.record(ActuatorCall::SteerRight);
        Ok(())
    }

    fn center_steering(&mut self) -> Result<(), ActuationError> {
        self.state.steering = SteeringPosition::Center;
        self.record(ActuatorCall::Center);
        Ok(())
    }

    fn cleanup(&mut self) -> Result<(), ActuationError> {
        self.record(ActuatorCall::Cleanup);
        Ok(())
    }
}
