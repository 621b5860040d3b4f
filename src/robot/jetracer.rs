// Steering base: steering servo and throttle ESC on two PWM channels

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use tracing::{info, warn};

use super::RobotError;
use crate::actuator::Servo;
use crate::bus::I2cBus;
use crate::calibration::{self, SteeringConfig};
use crate::pwm::Pca9685;

pub const JETRACER_CONF_FILE: &str = "jetracer_conf.json";

/// RC servo/ESC signal frequency
const SIGNAL_FREQ_HZ: u32 = 50;

const STEERING_CHANNEL: u8 = 0;
const THROTTLE_CHANNEL: u8 = 1;

/// Standard RC pulse timing in microseconds
const MIN_PULSE_US: f32 = 1000.0;
const CENTER_PULSE_US: f32 = 1500.0;
const MAX_PULSE_US: f32 = 2000.0;

pub struct JetRacer<B: I2cBus> {
    steering: Servo<B>,
    throttle: Servo<B>,
    conf_path: PathBuf,
}

impl<B: I2cBus> JetRacer<B> {
    pub fn new(bus: B) -> Result<Self, RobotError> {
        Self::with_config_path(bus, calibration::default_config_path(JETRACER_CONF_FILE))
    }

    /// On first run (no config file) the derived RC-timing calibration is
    /// saved as the default; otherwise the file is loaded.
    pub fn with_config_path(bus: B, conf_path: PathBuf) -> Result<Self, RobotError> {
        let mut pca = Pca9685::new(bus)?;
        pca.set_frequency(SIGNAL_FREQ_HZ)?;
        let pca = Rc::new(RefCell::new(pca));

        let steering = Servo::new(
            Rc::clone(&pca),
            STEERING_CHANNEL,
            MIN_PULSE_US,
            CENTER_PULSE_US,
            MAX_PULSE_US,
        )?;
        let throttle = Servo::new(
            Rc::clone(&pca),
            THROTTLE_CHANNEL,
            MIN_PULSE_US,
            CENTER_PULSE_US,
            MAX_PULSE_US,
        )?;

        let mut racer = Self {
            steering,
            throttle,
            conf_path,
        };

        if racer.conf_path.is_file() {
            racer.load_conf()?;
        } else {
            info!(
                "No calibration at {}, writing defaults",
                racer.conf_path.display()
            );
            racer.save_conf()?;
        }
        Ok(racer)
    }

    /// Steering position in [-1, 1], negative = left
    pub fn set_steering(&mut self, pos: f32) -> Result<(), RobotError> {
        self.steering.set_value(pos)?;
        Ok(())
    }

    /// Throttle in [-1, 1]; 0 is the ESC neutral point
    pub fn set_throttle(&mut self, value: f32) -> Result<(), RobotError> {
        self.throttle.set_value(value)?;
        Ok(())
    }

    /// Neutral throttle and centered steering
    pub fn stop(&mut self) -> Result<(), RobotError> {
        self.set_throttle(0.0)?;
        self.set_steering(0.0)
    }

    pub fn steering(&mut self) -> &mut Servo<B> {
        &mut self.steering
    }

    pub fn throttle(&mut self) -> &mut Servo<B> {
        &mut self.throttle
    }

    pub fn load_conf(&mut self) -> Result<(), RobotError> {
        let conf: SteeringConfig = calibration::load(&self.conf_path)?;
        self.steering.set_calibration(conf.servo);
        self.throttle.set_calibration(conf.motor);
        Ok(())
    }

    pub fn save_conf(&self) -> Result<(), RobotError> {
        let conf = SteeringConfig {
            servo: self.steering.calibration(),
            motor: self.throttle.calibration(),
        };
        calibration::save(&self.conf_path, &conf)?;
        Ok(())
    }
}

impl<B: I2cBus> Drop for JetRacer<B> {
    fn drop(&mut self) {
        // Safety measure: ESC back to neutral
        if let Err(e) = self.set_throttle(0.0) {
            warn!("Failed to neutralize throttle on drop: {}", e);
        }
    }
}
