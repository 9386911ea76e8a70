//! Steering configuration

use serde::{Deserialize, Serialize};

use crate::overrides::OverrideRule;
use crate::SteeringError;

/// Corner-gate geometry and sampling
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParabolaConfig {
    /// Vertex height as a fraction of frame height (floored to a pixel row)
    pub vertex_y_ratio: f64,

    /// Curvature; positive opens toward the top of the image
    pub curvature: f64,

    /// A point must clear the curve by more than this (pixels)
    pub tolerance_px: f64,

    /// Sample intervals along a segment (intervals + 1 points are tested)
    pub samples: u32,

    /// Width of the band tested across a segment (pixels)
    pub thickness_px: f64,
}

impl Default for ParabolaConfig {
    fn default() -> Self {
        Self {
            vertex_y_ratio: 0.55,
            curvature: 0.0011,
            tolerance_px: 2.0,
            samples: 20,
            thickness_px: 8.0,
        }
    }
}

/// Steering configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    /// Wall-angle override maneuver, if any
    pub override_rule: OverrideRule,

    /// Wall envelope above this fraction of frame height is too close
    pub wall_close_ratio: f64,

    /// Green blocks below this fraction of frame height are avoided
    pub green_trigger_ratio: f64,

    /// Red blocks below this fraction of frame height are avoided
    pub red_trigger_ratio: f64,

    /// Steer per unit of normalized depth past the trigger line
    pub obstacle_gain: f64,

    /// Largest steer magnitude obstacle avoidance may command
    pub obstacle_cap: f64,

    pub parabola: ParabolaConfig,

    /// Angle override: exit once the wall angle swings this far the other way (degrees)
    pub override_exit_angle_deg: f64,

    /// Time override: length of the first leg (seconds)
    pub override_first_s: f64,

    /// Time override: length of the counter-steer leg (seconds)
    pub override_second_s: f64,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            override_rule: OverrideRule::None,
            wall_close_ratio: 0.4,
            green_trigger_ratio: 0.5,
            red_trigger_ratio: 0.6,
            obstacle_gain: 0.5,
            obstacle_cap: 0.4,
            parabola: ParabolaConfig::default(),
            override_exit_angle_deg: 5.0,
            override_first_s: 2.0,
            override_second_s: 1.0,
        }
    }
}

impl ControlConfig {
    pub fn validate(&self) -> Result<(), SteeringError> {
        let ratios = [
            ("wall_close_ratio", self.wall_close_ratio),
            ("green_trigger_ratio", self.green_trigger_ratio),
            ("red_trigger_ratio", self.red_trigger_ratio),
            ("parabola.vertex_y_ratio", self.parabola.vertex_y_ratio),
        ];
        for (name, value) in ratios {
            if !(0.0..=1.0).contains(&value) {
                return Err(SteeringError::Config(format!("{name} must be in [0, 1], got {value}")));
            }
        }
        // Trigger lines at the very bottom would divide by zero
        for (name, value) in [
            ("green_trigger_ratio", self.green_trigger_ratio),
            ("red_trigger_ratio", self.red_trigger_ratio),
        ] {
            if value >= 1.0 {
                return Err(SteeringError::Config(format!("{name} must be below 1")));
            }
        }
        if !(0.0..=1.0).contains(&self.obstacle_cap) {
            return Err(SteeringError::Config(format!(
                "obstacle_cap must be in [0, 1], got {}",
                self.obstacle_cap
            )));
        }
        if self.parabola.samples == 0 {
            return Err(SteeringError::Config("parabola.samples must be at least 1".into()));
        }
        if self.override_first_s <= 0.0 || self.override_second_s <= 0.0 {
            return Err(SteeringError::Config("override durations must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = ControlConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.override_rule, OverrideRule::None);
    }

    #[test]
    fn test_bad_ratio_rejected() {
        let config = ControlConfig {
            red_trigger_ratio: 1.0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(SteeringError::Config(_))));

        let config = ControlConfig {
            obstacle_cap: 1.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
