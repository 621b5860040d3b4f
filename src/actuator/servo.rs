// Continuous-position servo on one PWM channel
//
// Position commands in [-1, 1] map to a pulse width between the
// configured bounds, piecewise-linear around the center so the physical
// center need not be the midpoint of the range.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;

use crate::bus::I2cBus;
use crate::calibration::ServoCalibration;
use crate::pwm::{Pca9685, Pca9685Error};

pub struct Servo<B: I2cBus> {
    pca: Rc<RefCell<Pca9685<B>>>,
    channel: u8,
    cal: ServoCalibration,
    value: f32,
}

impl<B: I2cBus> Servo<B> {
    /// Bind a servo to a channel, deriving duty-cycle calibration from
    /// pulse-width bounds in microseconds and the driver's configured
    /// output frequency.
    ///
    /// The derived values are fixed at construction; a later frequency
    /// change does not update them. Fails if `set_frequency` has not run.
    pub fn new(
        pca: Rc<RefCell<Pca9685<B>>>,
        channel: u8,
        min_width_us: f32,
        center_width_us: f32,
        max_width_us: f32,
    ) -> Result<Self, Pca9685Error> {
        let freq = pca.borrow().frequency();
        if freq == 0 {
            return Err(Pca9685Error::FrequencyNotSet);
        }
        let period_us = 1e6 / freq as f32;
        let min_duty = min_width_us / period_us;
        let center_duty = center_width_us / period_us;
        let max_duty = max_width_us / period_us;
        let cal = ServoCalibration {
            alpha0: max_duty - center_duty,
            alpha1: center_duty - min_duty,
            beta: center_duty,
            min_duty,
            max_duty,
        };
        Ok(Self {
            pca,
            channel,
            cal,
            value: 0.0,
        })
    }

    pub fn channel(&self) -> u8 {
        self.channel
    }

    pub fn calibration(&self) -> ServoCalibration {
        self.cal
    }

    /// Takes effect on the next `set_value`
    pub fn set_calibration(&mut self, cal: ServoCalibration) {
        self.cal = cal;
    }

    /// Last commanded position
    pub fn value(&self) -> f32 {
        self.value
    }

    /// Duty cycle for a position in [-1, 1], clamped to the duty bounds.
    /// Pure function.
    pub fn compute_duty_cycle(&self, pos: f32) -> f32 {
        let duty = if pos > 0.0 {
            pos * self.cal.alpha0 + self.cal.beta
        } else {
            pos * self.cal.alpha1 + self.cal.beta
        };
        duty.clamp(self.cal.min_duty, self.cal.max_duty)
    }

    /// Command a position; the channel is written before returning
    pub fn set_value(&mut self, pos: f32) -> Result<(), Pca9685Error> {
        let duty = self.compute_duty_cycle(pos);
        debug!("Servo channel {} pos {} -> duty {}", self.channel, pos, duty);
        self.pca.borrow_mut().set_duty_cycle(self.channel, duty)?;
        self.value = pos;
        Ok(())
    }

    /// Invert the direction sense without moving the center point or the
    /// duty bounds. Applying it twice restores the original slopes.
    pub fn reverse_output(&mut self) {
        let (alpha0, alpha1) = (self.cal.alpha0, self.cal.alpha1);
        self.cal.alpha0 = -alpha1;
        self.cal.alpha1 = -alpha0;
    }
}
