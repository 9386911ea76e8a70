//! Motor actuation
//!
//! A drive motor and a steering motor behind an L298N dual H-bridge. The
//! hardware backend talks to sysfs GPIO and PWM; when that is unavailable
//! a simulated backend records the commands instead.

mod adapter;
mod config;
mod error;
mod simulated;
mod sysfs;

pub use adapter::{DriveAction, DriveCommand, SteerAction};
pub use config::{ActuatorBackend, ActuatorConfig};
pub use error::ActuationError;
pub use motor_test::{MotorTestAction, MotorTestSequence};
pub use simulated::{
    ActuatorCall, MotorState, SimulatedActuator, SteeringPosition, CALL_LOG_CAPACITY,
};
pub use sysfs::SysfsActuator;

use tracing::{info, warn};

/// Motor capability used by the frame loop
pub trait Actuator: Send {
    /// Backend name for logs
    fn name(&self) -> &'static str;

    /// Drive forward at `percent` duty (clamped to 0-100)
    fn move_forward(&mut self, percent: f64) -> Result<(), ActuationError>;

    /// Drive backward at `percent` duty (clamped to 0-100)
    fn move_backward(&mut self, percent: f64) -> Result<(), ActuationError>;

    fn stop_drive(&mut self) -> Result<(), ActuationError>;

    fn steer_left(&mut self) -> Result<(), ActuationError>;

    fn steer_right(&mut self) -> Result<(), ActuationError>;

    /// De-energize the steering motor
    fn center_steering(&mut self) -> Result<(), ActuationError>;

    /// Stop everything and release the hardware
    fn cleanup(&mut self) -> Result<(), ActuationError>;
}

impl<A: Actuator + ?Sized> Actuator for Box<A> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn move_forward(&mut self, percent: f64) -> Result<(), ActuationError> {
        (**self).move_forward(percent)
    }

    fn move_backward(&mut self, percent: f64) -> Result<(), ActuationError> {
        (**self).move_backward(percent)
    }

    fn stop_drive(&mut self) -> Result<(), ActuationError> {
        (**self).stop_drive()
    }

    fn steer_left(&mut self) -> Result<(), ActuationError> {
        (**self).steer_left()
    }

    fn steer_right(&mut self) -> Result<(), ActuationError> {
        (**self).steer_right()
    }

    fn center_steering(&mut self) -> Result<(), ActuationError> {
        (**self).center_steering()
    }

    fn cleanup(&mut self) -> Result<(), ActuationError> {
        (**self).cleanup()
    }
}

/// Pick the actuator for a configuration.
///
/// `Auto` tries the hardware first and falls back to simulation.
pub fn select_actuator(config: &ActuatorConfig) -> Result<Box<dyn Actuator>, ActuationError> {
    match config.backend {
        ActuatorBackend::Simulated => {
            info!("Using simulated actuator");
            Ok(Box::new(SimulatedActuator::new()))
        }
        ActuatorBackend::Sysfs => Ok(Box::new(SysfsActuator::setup(config)?)),
        ActuatorBackend::Auto => match SysfsActuator::setup(config) {
            Ok(actuator) => Ok(Box::new(actuator)),
            Err(e) => {
                warn!("Failed to initialize GPIO: {}", e);
                warn!("Running in simulation mode (no motor output)");
                Ok(Box::new(SimulatedActuator::new()))
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_falls_back_to_simulation() {
        let config = ActuatorConfig {
            sysfs_root: std::env::temp_dir().join(format!("rover-no-sysfs-{}", std::process::id())),
            ..Default::default()
        };
        let actuator = select_actuator(&config).unwrap();
        assert_eq!(actuator.name(), "simulated");
    }

    #[test]
    fn test_explicit_sysfs_propagates_failure() {
        let config = ActuatorConfig {
            backend: ActuatorBackend::Sysfs,
            sysfs_root: std::env::temp_dir().join(format!("rover-no-sysfs-b-{}", std::process::id())),
            ..Default::default()
        };
        assert!(select_actuator(&config).is_err());
    }

    #[test]
    fn test_explicit_simulation() {
        let config = ActuatorConfig {
            backend: ActuatorBackend::Simulated,
            ..Default::default()
        };
        assert_eq!(select_actuator(&config).unwrap().name(), "simulated");
    }
}
