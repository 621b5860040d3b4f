// Differential-drive base: two motor pairs on four PWM channels

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use tracing::{info, warn};

use super::RobotError;
use crate::actuator::Motor;
use crate::bus::I2cBus;
use crate::calibration::{self, DifferentialConfig};
use crate::pwm::Pca9685;

pub const JETBOT_CONF_FILE: &str = "jetbot_conf.json";

/// PWM frequency for the motor H-bridges
const MOTOR_FREQ_HZ: u32 = 1600;

pub struct JetBot<B: I2cBus> {
    pca: Rc<RefCell<Pca9685<B>>>,
    left_motor: Motor<B>,
    right_motor: Motor<B>,
    lrab_contiguous: bool,
    conf_path: PathBuf,
}

impl<B: I2cBus> JetBot<B> {
    /// Default wiring: left motor on channels (0, 1), right on (2, 3),
    /// calibration under $HOME.
    pub fn new(bus: B) -> Result<Self, RobotError> {
        Self::with_channels(
            bus,
            [0, 1, 2, 3],
            calibration::default_config_path(JETBOT_CONF_FILE),
        )
    }

    /// Custom wiring `[left_a, left_b, right_a, right_b]` and config path.
    ///
    /// On first run (no config file) the right motor's alpha defaults to
    /// -1 to compensate for mirrored wiring, and the defaults are saved;
    /// otherwise the file is loaded.
    pub fn with_channels(
        bus: B,
        channels: [u8; 4],
        conf_path: PathBuf,
    ) -> Result<Self, RobotError> {
        let [left_a, left_b, right_a, right_b] = channels;
        let mut pca = Pca9685::new(bus)?;
        pca.set_frequency(MOTOR_FREQ_HZ)?;
        let pca = Rc::new(RefCell::new(pca));

        let left_motor = Motor::new(Rc::clone(&pca), left_a, left_b);
        let right_motor = Motor::new(Rc::clone(&pca), right_a, right_b);
        let lrab_contiguous =
            left_a + 1 == left_b && left_b + 1 == right_a && right_a + 1 == right_b;

        let mut bot = Self {
            pca,
            left_motor,
            right_motor,
            lrab_contiguous,
            conf_path,
        };

        if bot.conf_path.is_file() {
            bot.load_conf()?;
        } else {
            info!(
                "No calibration at {}, writing defaults",
                bot.conf_path.display()
            );
            // Mirrored wiring: the right motor spins opposite by default
            let mut cal = bot.right_motor.calibration();
            cal.alpha = -1.0;
            bot.right_motor.set_calibration(cal);
            bot.save_conf()?;
        }
        Ok(bot)
    }

    /// Command both motors.
    ///
    /// When all four channels are register-consecutive the two leg pairs
    /// go out as one four-channel burst; otherwise each motor writes its
    /// own legs.
    pub fn set_motors(&mut self, left_speed: f32, right_speed: f32) -> Result<(), RobotError> {
        if self.lrab_contiguous {
            let left = self.left_motor.compute_legs(left_speed);
            let right = self.right_motor.compute_legs(right_speed);
            let duties = [left[0], left[1], right[0], right[1]];
            let (first, _) = self.left_motor.channels();
            self.pca.borrow_mut().set_range(first, &duties)?;
        } else {
            self.left_motor.set_value(left_speed)?;
            self.right_motor.set_value(right_speed)?;
        }
        Ok(())
    }

    pub fn forward(&mut self, speed: f32) -> Result<(), RobotError> {
        self.set_motors(speed, speed)
    }

    pub fn backward(&mut self, speed: f32) -> Result<(), RobotError> {
        self.set_motors(-speed, -speed)
    }

    pub fn left(&mut self, speed: f32) -> Result<(), RobotError> {
        self.set_motors(-speed, speed)
    }

    pub fn right(&mut self, speed: f32) -> Result<(), RobotError> {
        self.set_motors(speed, -speed)
    }

    pub fn stop(&mut self) -> Result<(), RobotError> {
        self.set_motors(0.0, 0.0)
    }

    pub fn left_motor(&mut self) -> &mut Motor<B> {
        &mut self.left_motor
    }

    pub fn right_motor(&mut self) -> &mut Motor<B> {
        &mut self.right_motor
    }

    pub fn load_conf(&mut self) -> Result<(), RobotError> {
        let conf: DifferentialConfig = calibration::load(&self.conf_path)?;
        self.left_motor.set_calibration(conf.left_motor);
        self.right_motor.set_calibration(conf.right_motor);
        Ok(())
    }

    pub fn save_conf(&self) -> Result<(), RobotError> {
        let conf = DifferentialConfig {
            left_motor: self.left_motor.calibration(),
            right_motor: self.right_motor.calibration(),
        };
        calibration::save(&self.conf_path, &conf)?;
        Ok(())
    }
}

impl<B: I2cBus> Drop for JetBot<B> {
    fn drop(&mut self) {
        // Safety measure: leave the base stopped
        if let Err(e) = self.stop() {
            warn!("Failed to stop motors on drop: {}", e);
        }
    }
}
