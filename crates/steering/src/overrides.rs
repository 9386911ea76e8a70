//! Wall-angle override maneuvers
//!
//! Once the wall angle turns nonzero the rover commits to a scripted turn
//! instead of reacting to every noisy angle reading. The state lives in
//! [`OverrideState`], owned by the frame loop and passed in each frame.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::ControlConfig;
use crate::Turn;

/// Slack on timer expiry so accumulated frame periods land on the boundary
const TIMER_EPSILON: f64 = 1e-9;

/// Which override maneuver is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OverrideRule {
    /// Steer with the wall angle's sign until it swings past the exit angle
    #[serde(rename = "wall")]
    Angle,

    /// Steer one way for a fixed time, then counter-steer
    #[serde(rename = "time")]
    Time,

    #[default]
    #[serde(rename = "none")]
    None,
}

/// Override phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OverridePhase {
    #[default]
    Neutral,

    /// Angle rule holding a direction
    Steering,

    /// Time rule, first leg
    First,

    /// Time rule, counter-steer leg
    Second,
}

/// Cross-frame override state
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct OverrideState {
    /// -1 left, +1 right, 0 neutral
    pub direction: i8,

    /// Seconds left in the current leg (time rule only)
    pub timer: f64,

    pub phase: OverridePhase,
}

impl OverrideState {
    pub fn is_active(&self) -> bool {
        self.direction != 0
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// State change made during a step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverrideTransition {
    Triggered,
    CounterSteer,
    Released,
}

/// Result of one override step
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct OverrideOutcome {
    /// When set, this turn replaces the control policy for the frame
    pub preempt: Option<Turn>,

    pub transition: Option<OverrideTransition>,
}

/// Override state machine
#[derive(Debug, Clone)]
pub struct OverrideController {
    rule: OverrideRule,
    exit_angle: f64,
    first_s: f64,
    second_s: f64,
}

impl OverrideController {
    pub fn new(config: &ControlConfig) -> Self {
        Self {
            rule: config.override_rule,
            exit_angle: config.override_exit_angle_deg,
            first_s: config.override_first_s,
            second_s: config.override_second_s,
        }
    }

    pub fn rule(&self) -> OverrideRule {
        self.rule
    }

    /// Advance the machine by one frame.
    ///
    /// `wall_angle` is `None` when no wall was found; an unknown angle
    /// neither triggers nor ends a maneuver. `dt` is the frame period.
    pub fn step(&self, state: &mut OverrideState, wall_angle: Option<f64>, dt: f64) -> OverrideOutcome {
        match self.rule {
            OverrideRule::Angle => self.step_angle(state, wall_angle),
            OverrideRule::Time => self.step_time(state, wall_angle, dt),
            OverrideRule::None => OverrideOutcome::default(),
        }
    }

    fn step_angle(&self, state: &mut OverrideState, wall_angle: Option<f64>) -> OverrideOutcome {
        if state.is_active() {
            if let Some(angle) = wall_angle {
                let released = (state.direction < 0 && angle >= self.exit_angle)
                    || (state.direction > 0 && angle <= -self.exit_angle);
                if released {
                    info!("Wall override released: wall_angle={:.2}", angle);
                    state.reset();
                    return OverrideOutcome {
                        preempt: None,
                        transition: Some(OverrideTransition::Released),
                    };
                }
            }
            return OverrideOutcome {
                preempt: Turn::from_sign(state.direction),
                transition: None,
            };
        }

        let Some(turn) = wall_angle.and_then(Turn::from_angle) else {
            return OverrideOutcome::default();
        };
        state.direction = turn.sign();
        state.phase = OverridePhase::Steering;
        info!(
            "Wall override triggered: wall_angle={:.2}, steering {} until the angle reaches {}{}",
            wall_angle.unwrap_or_default(),
            turn,
            if turn == Turn::Left { "+" } else { "-" },
            self.exit_angle
        );
        OverrideOutcome {
            preempt: Some(turn),
            transition: Some(OverrideTransition::Triggered),
        }
    }

    fn step_time(&self, state: &mut OverrideState, wall_angle: Option<f64>, dt: f64) -> OverrideOutcome {
        match state.phase {
            OverridePhase::First | OverridePhase::Second => {
                let turn = Turn::from_sign(state.direction);
                state.timer -= dt;

                let mut transition = None;
                if state.timer <= TIMER_EPSILON {
                    if state.phase == OverridePhase::First {
                        state.direction = -state.direction;
                        state.timer = self.second_s;
                        state.phase = OverridePhase::Second;
                        transition = Some(OverrideTransition::CounterSteer);
                        info!("Timed override counter-steer for {:.1}s", self.second_s);
                    } else {
                        state.reset();
                        transition = Some(OverrideTransition::Released);
                        info!("Timed override finished");
                    }
                }
                OverrideOutcome {
                    preempt: turn,
                    transition,
                }
            }
            // The trigger frame itself is left to the control policy
            OverridePhase::Neutral | OverridePhase::Steering => {
                let Some(turn) = wall_angle.and_then(Turn::from_angle) else {
                    return OverrideOutcome::default();
                };
                state.direction = turn.sign();
                state.timer = self.first_s;
                state.phase = OverridePhase::First;
                info!(
                    "Timed override triggered: wall_angle={:.2}, steering {} for {:.1}s then back for {:.1}s",
                    wall_angle.unwrap_or_default(),
                    turn,
                    self.first_s,
                    self.second_s
                );
                OverrideOutcome {
                    preempt: None,
                    transition: Some(OverrideTransition::Triggered),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f64 = 1.0 / 30.0;

    fn controller(rule: OverrideRule) -> OverrideController {
        OverrideController::new(&ControlConfig {
            override_rule: rule,
            ..Default::default()
        })
    }

    #[test]
    fn test_angle_rule_holds_until_exit_angle() {
        let ctl = controller(OverrideRule::Angle);
        let mut state = OverrideState::default();

        let out = ctl.step(&mut state, Some(-3.0), DT);
        assert_eq!(state.direction, -1);
        assert_eq!(state.phase, OverridePhase::Steering);
        assert_eq!(out.preempt, Some(Turn::Left));
        assert_eq!(out.transition, Some(OverrideTransition::Triggered));

        for angle in [-1.0, 0.0, 2.0, 4.0] {
            let out = ctl.step(&mut state, Some(angle), DT);
            assert_eq!(state.direction, -1, "angle {angle}");
            assert_eq!(out.preempt, Some(Turn::Left));
            assert!(out.transition.is_none());
        }

        let out = ctl.step(&mut state, Some(5.0), DT);
        assert_eq!(state, OverrideState::default());
        assert_eq!(out.preempt, None);
        assert_eq!(out.transition, Some(OverrideTransition::Released));

        // Re-entry happens on the following frame
        let out = ctl.step(&mut state, Some(5.0), DT);
        assert_eq!(state.direction, 1);
        assert_eq!(out.preempt, Some(Turn::Right));
    }

    #[test]
    fn test_angle_rule_right_exit() {
        let ctl = controller(OverrideRule::Angle);
        let mut state = OverrideState::default();
        ctl.step(&mut state, Some(7.0), DT);
        assert_eq!(state.direction, 1);
        ctl.step(&mut state, Some(-4.9), DT);
        assert_eq!(state.direction, 1);
        ctl.step(&mut state, Some(-5.0), DT);
        assert_eq!(state.direction, 0);
    }

    #[test]
    fn test_angle_rule_zero_does_not_trigger() {
        let ctl = controller(OverrideRule::Angle);
        let mut state = OverrideState::default();
        let out = ctl.step(&mut state, Some(0.0), DT);
        assert_eq!(out, OverrideOutcome::default());
        assert!(!state.is_active());
    }

    #[test]
    fn test_unknown_angle_neither_triggers_nor_exits() {
        for rule in [OverrideRule::Angle, OverrideRule::Time] {
            let ctl = controller(rule);
            let mut state = OverrideState::default();
            ctl.step(&mut state, None, DT);
            assert!(!state.is_active());
        }

        let ctl = controller(OverrideRule::Angle);
        let mut state = OverrideState::default();
        ctl.step(&mut state, Some(-2.0), DT);
        let out = ctl.step(&mut state, None, DT);
        assert_eq!(state.direction, -1);
        assert_eq!(out.preempt, Some(Turn::Left));
    }

    #[test]
    fn test_time_rule_full_sequence() {
        let ctl = controller(OverrideRule::Time);
        let mut state = OverrideState::default();

        let out = ctl.step(&mut state, Some(2.0), DT);
        assert_eq!(state.phase, OverridePhase::First);
        assert_eq!(state.direction, 1);
        assert_eq!(state.timer, 2.0);
        // Trigger frame does not preempt
        assert_eq!(out.preempt, None);

        for frame in 1..=60 {
            // Sensor noise must not shorten the maneuver
            let out = ctl.step(&mut state, Some(-30.0), DT);
            assert_eq!(out.preempt, Some(Turn::Right), "frame {frame}");
            if frame < 60 {
                assert_eq!(state.phase, OverridePhase::First, "frame {frame}");
            }
        }
        assert_eq!(state.phase, OverridePhase::Second);
        assert_eq!(state.direction, -1);
        assert_eq!(state.timer, 1.0);

        for frame in 1..=30 {
            let out = ctl.step(&mut state, Some(12.0), DT);
            assert_eq!(out.preempt, Some(Turn::Left), "frame {frame}");
            if frame < 30 {
                assert_eq!(state.phase, OverridePhase::Second, "frame {frame}");
            } else {
                assert_eq!(out.transition, Some(OverrideTransition::Released));
            }
        }
        assert_eq!(state, OverrideState::default());
    }

    #[test]
    fn test_none_rule_is_inert() {
        let ctl = controller(OverrideRule::None);
        let mut state = OverrideState::default();
        for angle in [-10.0, 3.0, 45.0] {
            assert_eq!(ctl.step(&mut state, Some(angle), DT), OverrideOutcome::default());
        }
        assert_eq!(state, OverrideState::default());
    }

    #[test]
    fn test_rule_names() {
        #[derive(Deserialize)]
        struct Wrapper {
            rule: OverrideRule,
        }
        for (text, rule) in [
            ("wall", OverrideRule::Angle),
            ("time", OverrideRule::Time),
            ("none", OverrideRule::None),
        ] {
            let json = format!(r#"{{"rule":"{text}"}}"#);
            let parsed: Wrapper = serde_json::from_str(&json).unwrap();
            assert_eq!(parsed.rule, rule);
        }
    }
}
