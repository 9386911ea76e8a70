//! Priority control policy
//!
//! First matching rule wins:
//! 1. Wall too close: full steer by wall-angle sign
//! 2. Green block near: gentle left, capped
//! 3. Red block near: gentle right, capped
//! 4. Corner: a course line inside the parabola gate, full steer by its angle sign
//! 5. Straight

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;
use vision::{ColorClass, FeatureBundle, LineSegment, Point};

use crate::config::ControlConfig;
use crate::parabola::ParabolaGate;

/// Course line named by a corner decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CourseLine {
    Orange,
    Blue,
}

impl fmt::Display for CourseLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CourseLine::Orange => write!(f, "orange"),
            CourseLine::Blue => write!(f, "blue"),
        }
    }
}

/// Why the policy chose its value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum SteerReason {
    WallClose { angle: Option<f64> },
    AvoidGreen { y: i32 },
    AvoidRed { y: i32 },
    Corner { line: CourseLine, angle: f64 },
    Straight,
}

impl fmt::Display for SteerReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SteerReason::WallClose { angle: Some(a) } if *a > 0.0 => {
                write!(f, "wall close, angle {a:.2} > 0: steer right to open the angle")
            }
            SteerReason::WallClose { angle: Some(a) } if *a < 0.0 => {
                write!(f, "wall close, angle {a:.2} < 0: steer left to close the angle")
            }
            SteerReason::WallClose { angle: Some(_) } => {
                write!(f, "wall close, angle 0: steer left")
            }
            SteerReason::WallClose { angle: None } => {
                write!(f, "wall close, angle unknown: steer left")
            }
            SteerReason::AvoidGreen { y } => write!(f, "green block at y={y}: gentle left"),
            SteerReason::AvoidRed { y } => write!(f, "red block at y={y}: gentle right"),
            SteerReason::Corner { line, angle } => write!(
                f,
                "corner: {line} line inside parabola, angle {angle:.2}: turn {}",
                if *angle < 0.0 { "left" } else { "right" }
            ),
            SteerReason::Straight => write!(f, "go straight"),
        }
    }
}

/// Steering value in `[-1, 1]` (negative is left) and its reason
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SteeringDecision {
    pub value: f64,
    pub reason: SteerReason,
}

impl SteeringDecision {
    fn new(value: f64, reason: SteerReason) -> Self {
        Self {
            value: value.clamp(-1.0, 1.0),
            reason,
        }
    }
}

/// Everything the policy looks at
#[derive(Debug, Clone, Default)]
pub struct PolicyInput {
    pub wall_y: Option<i32>,
    pub wall_angle: Option<f64>,

    /// Centers of green and red blocks, in detection order
    pub green_blocks: Vec<Point>,
    pub red_blocks: Vec<Point>,

    pub orange_angle: Option<f64>,
    pub blue_angle: Option<f64>,
    pub orange_segment: Option<LineSegment>,
    pub blue_segment: Option<LineSegment>,

    pub frame_width: u32,
    pub frame_height: u32,

    /// Corner gate; the corner rule is skipped without one
    pub gate: Option<ParabolaGate>,
}

impl PolicyInput {
    /// Policy view of a frame's features
    pub fn from_features(features: &FeatureBundle, gate: Option<ParabolaGate>) -> Self {
        let centers = |color| features.blocks_of(color).map(|b| b.center).collect();
        Self {
            wall_y: features.wall.vertical_position,
            wall_angle: features.wall.angle_degrees,
            green_blocks: centers(ColorClass::Green),
            red_blocks: centers(ColorClass::Red),
            orange_angle: features.lines.orange_angle,
            blue_angle: features.lines.blue_angle,
            orange_segment: features.lines.orange,
            blue_segment: features.lines.blue,
            frame_width: features.frame_width,
            frame_height: features.frame_height,
            gate,
        }
    }
}

/// Control policy with its thresholds
#[derive(Debug, Clone)]
pub struct ControlPolicy {
    wall_close_ratio: f64,
    green_trigger_ratio: f64,
    red_trigger_ratio: f64,
    gain: f64,
    cap: f64,
}

impl Default for ControlPolicy {
    fn default() -> Self {
        Self::new(&ControlConfig::default())
    }
}

impl ControlPolicy {
    pub fn new(config: &ControlConfig) -> Self {
        Self {
            wall_close_ratio: config.wall_close_ratio,
            green_trigger_ratio: config.green_trigger_ratio,
            red_trigger_ratio: config.red_trigger_ratio,
            gain: config.obstacle_gain,
            cap: config.obstacle_cap,
        }
    }

    pub fn decide(&self, input: &PolicyInput) -> SteeringDecision {
        let decision = self.first_match(input);
        debug!("Steer {:+.3}: {}", decision.value, decision.reason);
        decision
    }

    fn first_match(&self, input: &PolicyInput) -> SteeringDecision {
        let height = input.frame_height as f64;

        if let Some(wall_y) = input.wall_y {
            if (wall_y as f64) < height * self.wall_close_ratio {
                let value = match input.wall_angle {
                    Some(a) if a > 0.0 => 1.0,
                    _ => -1.0,
                };
                return SteeringDecision::new(value, SteerReason::WallClose { angle: input.wall_angle });
            }
        }

        if let Some(y) = lowest(&input.green_blocks) {
            if let Some(depth) = self.depth_past(y, height, self.green_trigger_ratio) {
                let value = (-self.gain * depth).max(-self.cap);
                return SteeringDecision::new(value, SteerReason::AvoidGreen { y });
            }
        }

        if let Some(y) = lowest(&input.red_blocks) {
            if let Some(depth) = self.depth_past(y, height, self.red_trigger_ratio) {
                let value = (self.gain * depth).min(self.cap);
                return SteeringDecision::new(value, SteerReason::AvoidRed { y });
            }
        }

        if let Some(decision) = corner(input) {
            return decision;
        }

        SteeringDecision::new(0.0, SteerReason::Straight)
    }

    /// How far `y` sits past the trigger line, as a fraction of the rows below it
    fn depth_past(&self, y: i32, height: f64, ratio: f64) -> Option<f64> {
        let trigger = height * ratio;
        let y = y as f64;
        (y > trigger).then(|| (y - trigger) / (height * (1.0 - ratio)))
    }
}

/// Decide with the default thresholds
pub fn decide(input: &PolicyInput) -> SteeringDecision {
    ControlPolicy::default().decide(input)
}

/// Largest y among block centers; the first one found wins ties
fn lowest(centers: &[Point]) -> Option<i32> {
    centers.iter().map(|p| p.y).fold(None, |best, y| match best {
        Some(b) if b >= y => Some(b),
        _ => Some(y),
    })
}

fn corner(input: &PolicyInput) -> Option<SteeringDecision> {
    let gate = input.gate.as_ref()?;
    let orange_angle = input.orange_angle?;
    let blue_angle = input.blue_angle?;
    let orange = input.orange_segment?;
    let blue = input.blue_segment?;

    // Orange takes precedence; when it is inside, blue is never consulted
    let (line, angle) = if gate.segment_inside(&orange) {
        (CourseLine::Orange, orange_angle)
    } else if gate.segment_inside(&blue) {
        (CourseLine::Blue, blue_angle)
    } else {
        return None;
    };

    let value = if angle < 0.0 {
        -1.0
    } else if angle > 0.0 {
        1.0
    } else {
        return None;
    };
    Some(SteeringDecision::new(value, SteerReason::Corner { line, angle }))
}
