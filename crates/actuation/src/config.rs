//! Actuator configuration

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Which actuator to drive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActuatorBackend {
    /// Hardware when it initializes, simulated otherwise
    #[default]
    Auto,
    Sysfs,
    Simulated,
}

/// L298N wiring (BCM GPIO numbers) and PWM channel for the drive enable
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ActuatorConfig {
    pub backend: ActuatorBackend,

    /// Root of the sysfs class tree
    pub sysfs_root: PathBuf,

    pub drive_in1: u32,
    pub drive_in2: u32,
    pub steer_in1: u32,
    pub steer_in2: u32,

    /// PWM chip and channel wired to the drive enable input
    pub pwm_chip: u32,
    pub pwm_channel: u32,
    pub pwm_frequency_hz: u32,
}

impl Default for ActuatorConfig {
    fn default() -> Self {
        Self {
            backend: ActuatorBackend::Auto,
            sysfs_root: PathBuf::from("/sys/class"),
            drive_in1: 17,
            drive_in2: 27,
            steer_in1: 5,
            steer_in2: 6,
            pwm_chip: 0,
            pwm_channel: 0,
            pwm_frequency_hz: 100,
        }
    }
}

impl ActuatorConfig {
    /// PWM period in nanoseconds
    pub fn pwm_period_ns(&self) -> u64 {
        1_000_000_000 / self.pwm_frequency_hz.max(1) as u64
    }
}
