//! Steering value to motor commands

use serde::{Deserialize, Serialize};
use steering::{SteeringCommand, Turn};
use tracing::{info, warn};

use crate::Actuator;

/// Throttle while turning (percent)
pub const TURN_THROTTLE: f64 = 40.0;

/// Throttle while going straight (percent)
pub const CRUISE_THROTTLE: f64 = 50.0;

/// Policy values within this band drive straight
pub const STEER_DEADBAND: f64 = 0.2;

/// Wall envelope below this fraction of frame height stops the rover
pub const STOP_RATIO: f64 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SteerAction {
    Left,
    Right,
    Center,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriveAction {
    Forward(f64),
    Stop,
}

/// Motor commands for one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DriveCommand {
    pub steer: SteerAction,
    pub drive: DriveAction,
}

impl DriveCommand {
    /// Map a frame's steering command onto the motors.
    ///
    /// Override turns always move at turning throttle. Otherwise a wall
    /// low in the frame stops the rover, and the policy value picks a
    /// side outside the dead band.
    pub fn plan(command: &SteeringCommand, wall_y: Option<i32>, frame_height: u32) -> Self {
        let value = match command {
            SteeringCommand::Override { turn } => {
                return Self {
                    steer: match turn {
                        Turn::Left => SteerAction::Left,
                        Turn::Right => SteerAction::Right,
                    },
                    drive: DriveAction::Forward(TURN_THROTTLE),
                };
            }
            SteeringCommand::Policy { decision } => decision.value,
        };

        if wall_y.is_some_and(|y| y as f64 > frame_height as f64 * STOP_RATIO) {
            return Self {
                steer: SteerAction::Center,
                drive: DriveAction::Stop,
            };
        }

        if value < -STEER_DEADBAND {
            Self {
                steer: SteerAction::Left,
                drive: DriveAction::Forward(TURN_THROTTLE),
            }
        } else if value > STEER_DEADBAND {
            Self {
                steer: SteerAction::Right,
                drive: DriveAction::Forward(TURN_THROTTLE),
            }
        } else {
            Self {
                steer: SteerAction::Center,
                drive: DriveAction::Forward(CRUISE_THROTTLE),
            }
        }
    }

    /// Issue the commands. Failures are logged and counted, never returned.
    pub fn apply(&self, actuator: &mut dyn Actuator) -> usize {
        let mut failures = 0;
        let mut check = |what: &str, result: Result<(), crate::ActuationError>| {
            if let Err(e) = result {
                warn!("Actuator {} failed: {}", what, e);
                metrics::counter!("rover_actuator_failures_total").increment(1);
                failures += 1;
            }
        };

        match self.drive {
            DriveAction::Stop => {
                check("stop", actuator.stop_drive());
                check("center", actuator.center_steering());
                info!("STOP: wall too close");
            }
            DriveAction::Forward(percent) => {
                let (label, result) = match self.steer {
                    SteerAction::Left => ("LEFT", actuator.steer_left()),
                    SteerAction::Right => ("RIGHT", actuator.steer_right()),
                    SteerAction::Center => ("FORWARD", actuator.center_steering()),
                };
                check("steering", result);
                check("forward", actuator.move_forward(percent));
                info!("{} at {}%", label, percent);
            }
        }
        failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ActuationError, ActuatorCall, SimulatedActuator};
    use proptest::prelude::*;
    use steering::{SteerReason, SteeringDecision};

    fn policy(value: f64) -> SteeringCommand {
        SteeringCommand::Policy {
            decision: SteeringDecision {
                value,
                reason: SteerReason::Straight,
            },
        }
    }

    #[test]
    fn test_policy_bands() {
        let left = DriveCommand::plan(&policy(-0.25), None, 480);
        assert_eq!(left.steer, SteerAction::Left);
        assert_eq!(left.drive, DriveAction::Forward(40.0));

        let right = DriveCommand::plan(&policy(1.0), Some(300), 480);
        assert_eq!(right.steer, SteerAction::Right);

        for v in [-0.2, 0.0, 0.2] {
            let cruise = DriveCommand::plan(&policy(v), None, 480);
            assert_eq!(cruise.steer, SteerAction::Center, "value {v}");
            assert_eq!(cruise.drive, DriveAction::Forward(50.0));
        }
    }

    #[test]
    fn test_wall_low_in_frame_stops() {
        let cmd = DriveCommand::plan(&policy(-1.0), Some(433), 480);
        assert_eq!(cmd.drive, DriveAction::Stop);
        assert_eq!(cmd.steer, SteerAction::Center);

        // Exactly 0.9 H keeps moving
        let cmd = DriveCommand::plan(&policy(0.0), Some(432), 480);
        assert_eq!(cmd.drive, DriveAction::Forward(50.0));
    }

    #[test]
    fn test_override_ignores_stop_rule() {
        let cmd = DriveCommand::plan(&SteeringCommand::Override { turn: Turn::Right }, Some(470), 480);
        assert_eq!(cmd.steer, SteerAction::Right);
        assert_eq!(cmd.drive, DriveAction::Forward(40.0));
    }

    #[test]
    fn test_apply_call_order() {
        let mut sim = SimulatedActuator::new();
        DriveCommand::plan(&policy(-0.5), None, 480).apply(&mut sim);
        DriveCommand::plan(&policy(0.0), Some(470), 480).apply(&mut sim);
        assert_eq!(
            sim.calls(),
            &[
                ActuatorCall::SteerLeft,
                ActuatorCall::Forward(40.0),
                ActuatorCall::Stop,
                ActuatorCall::Center
            ]
        );
    }

    struct Broken;

    impl Actuator for Broken {
        fn name(&self) -> &'static str {
            "broken"
        }
        fn move_forward(&mut self, _: f64) -> Result<(), ActuationError> {
            Err(ActuationError::NotInitialized)
        }
        fn move_backward(&mut self, _: f64) -> Result<(), ActuationError> {
            Err(ActuationError::NotInitialized)
        }
        fn stop_drive(&mut self) -> Result<(), ActuationError> {
            Err(ActuationError::NotInitialized)
        }
        fn steer_left(&mut self) -> Result<(), ActuationError> {
            Ok(())
        }
        fn steer_right(&mut self) -> Result<(), ActuationError> {
            Ok(())
        }
        fn center_steering(&mut self) -> Result<(), ActuationError> {
            Ok(())
        }
        fn cleanup(&mut self) -> Result<(), ActuationError> {
            Ok(())
        }
    }

    #[test]
    fn test_failures_are_counted_not_raised() {
        let mut broken = Broken;
        assert_eq!(DriveCommand::plan(&policy(0.0), None, 480).apply(&mut broken), 1);
        assert_eq!(DriveCommand::plan(&policy(0.0), Some(479), 480).apply(&mut broken), 1);
    }

    proptest! {
        #[test]
        fn prop_throttle_matches_steer(value in -1.0f64..=1.0, wall_y in proptest::option::of(0i32..480)) {
            let cmd = DriveCommand::plan(&policy(value), wall_y, 480);
            match (cmd.steer, cmd.drive) {
                (SteerAction::Center, DriveAction::Forward(p)) => prop_assert_eq!(p, CRUISE_THROTTLE),
                (SteerAction::Center, DriveAction::Stop) => prop_assert!(wall_y.unwrap_or(0) > 432),
                (_, DriveAction::Forward(p)) => {
                    prop_assert_eq!(p, TURN_THROTTLE);
                    prop_assert!(value.abs() > STEER_DEADBAND);
                }
                (_, DriveAction::Stop) => prop_assert!(false, "turning while stopped"),
            }
        }
    }
}
