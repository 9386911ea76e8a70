//! L298N driver over sysfs GPIO and PWM
//!
//! Drive motor: IN1/IN2 set direction, a PWM channel on the enable input
//! sets speed. Steering motor: IN1 high turns left, IN2 high turns right,
//! both low lets it return to center.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::{ActuationError, Actuator, ActuatorConfig};

/// Hardware actuator
pub struct SysfsActuator {
    gpio_root: PathBuf,
    pwm_chip: PathBuf,
    pwm_channel: u32,
    drive_in1: u32,
    drive_in2: u32,
    steer_in1: u32,
    steer_in2: u32,
    period_ns: u64,
    active: bool,
}

impl SysfsActuator {
    /// Export and configure all pins, drive stopped and steering centered
    pub fn setup(config: &ActuatorConfig) -> Result<Self, ActuationError> {
        let gpio_root = config.sysfs_root.join("gpio");
        let pwm_chip = config
            .sysfs_root
            .join("pwm")
            .join(format!("pwmchip{}", config.pwm_chip));

        info!(
            "Initializing L298N on {} (drive {}/{}, steer {}/{}, pwmchip{}/pwm{})",
            config.sysfs_root.display(),
            config.drive_in1,
            config.drive_in2,
            config.steer_in1,
            config.steer_in2,
            config.pwm_chip,
            config.pwm_channel
        );

        let mut actuator = Self {
            gpio_root,
            pwm_chip,
            pwm_channel: config.pwm_channel,
            drive_in1: config.drive_in1,
            drive_in2: config.drive_in2,
            steer_in1: config.steer_in1,
            steer_in2: config.steer_in2,
            period_ns: config.pwm_period_ns(),
            active: false,
        };

        for pin in actuator.pins() {
            actuator.export_pin(pin)?;
            write_attr(&actuator.pin_dir(pin).join("direction"), "out")?;
            actuator.set_pin(pin, false)?;
        }

        let channel = actuator.pwm_dir();
        if !channel.exists() {
            write_attr(&actuator.pwm_chip.join("export"), &actuator.pwm_channel.to_string()).map_err(
                |e| ActuationError::InvalidPin(format!("pwm{}: {}", actuator.pwm_channel, e)),
            )?;
        }
        // Duty must not exceed the period, so zero it first
        write_attr(&channel.join("duty_cycle"), "0")?;
        write_attr(&channel.join("period"), &actuator.period_ns.to_string())?;
        write_attr(&channel.join("enable"), "1")?;

        actuator.active = true;
        info!("GPIO setup complete");
        Ok(actuator)
    }

    fn pins(&self) -> [u32; 4] {
        [self.drive_in1, self.drive_in2, self.steer_in1, self.steer_in2]
    }

    fn pin_dir(&self, pin: u32) -> PathBuf {
        self.gpio_root.join(format!("gpio{pin}"))
    }

    fn pwm_dir(&self) -> PathBuf {
        self.pwm_chip.join(format!("pwm{}", self.pwm_channel))
    }

    fn export_pin(&self, pin: u32) -> Result<(), ActuationError> {
        if self.pin_dir(pin).exists() {
            debug!("GPIO {} already exported", pin);
            return Ok(());
        }
        write_attr(&self.gpio_root.join("export"), &pin.to_string())
            .map_err(|e| ActuationError::InvalidPin(format!("GPIO {pin}: {e}")))
    }

    fn set_pin(&self, pin: u32, high: bool) -> Result<(), ActuationError> {
        write_attr(&self.pin_dir(pin).join("value"), if high { "1" } else { "0" })
    }

    fn set_duty(&self, percent: f64) -> Result<(), ActuationError> {
        let duty = (self.period_ns as f64 * percent.clamp(0.0, 100.0) / 100.0).round() as u64;
        write_attr(&self.pwm_dir().join("duty_cycle"), &duty.to_string())
    }

    fn ensure_active(&self) -> Result<(), ActuationError> {
        if self.active {
            Ok(())
        } else {
            Err(ActuationError::NotInitialized)
        }
    }

    fn drive(&mut self, in1: bool, in2: bool, percent: f64) -> Result<(), ActuationError> {
        self.ensure_active()?;
        self.set_pin(self.drive_in1, in1)?;
        self.set_pin(self.drive_in2, in2)?;
        self.set_duty(percent)
    }

    fn steer(&mut self, in1: bool, in2: bool) -> Result<(), ActuationError> {
        self.ensure_active()?;
        self.set_pin(self.steer_in1, in1)?;
        self.set_pin(self.steer_in2, in2)
    }
}

impl Actuator for SysfsActuator {
    fn name(&self) -> &'static str {
        "sysfs"
    }

    fn move_forward(&mut self, percent: f64) -> Result<(), ActuationError> {
        self.drive(true, false, percent)
    }

    fn move_backward(&mut self, percent: f64) -> Result<(), ActuationError> {
        self.drive(false, true, percent)
    }

    fn stop_drive(&mut self) -> Result<(), ActuationError> {
        self.drive(false, false, 0.0)
    }

    fn steer_left(&mut self) -> Result<(), ActuationError> {
        self.steer(true, false)
    }

    fn steer_right(&mut self) -> Result<(), ActuationError> {
        self.steer(false, true)
    }

    fn center_steering(&mut self) -> Result<(), ActuationError> {
        self.steer(false, false)
    }

    fn cleanup(&mut self) -> Result<(), ActuationError> {
        if !self.active {
            return Ok(());
        }
        info!("Cleaning up GPIO");
        self.stop_drive()?;
        self.center_steering()?;
        self.active = false;

        let channel = self.pwm_dir();
        write_attr(&channel.join("enable"), "0")?;
        write_attr(&self.pwm_chip.join("unexport"), &self.pwm_channel.to_string())?;
        for pin in self.pins() {
            write_attr(&self.gpio_root.join("unexport"), &pin.to_string())?;
        }
        Ok(())
    }
}

impl Drop for SysfsActuator {
    fn drop(&mut self) {
        if let Err(e) = self.cleanup() {
            warn!("GPIO cleanup on drop failed: {}", e);
        }
    }
}

fn write_attr(path: &Path, value: &str) -> Result<(), ActuationError> {
    fs::write(path, value).map_err(|e| ActuationError::io(path, e))
}
