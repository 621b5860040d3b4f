// Differential-drive motor leg pair
//
// A motor is two PWM channels feeding an H-bridge. Direction is encoded
// by which leg carries the magnitude: the other leg is always zero.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;

use crate::bus::I2cBus;
use crate::calibration::MotorCalibration;
use crate::pwm::{Pca9685, Pca9685Error};

pub struct Motor<B: I2cBus> {
    pca: Rc<RefCell<Pca9685<B>>>,
    a: u8,
    b: u8,
    ab_contiguous: bool,
    cal: MotorCalibration,
    value: f32,
}

impl<B: I2cBus> Motor<B> {
    /// Bind a motor to its two channels. Calibration starts at the
    /// defaults (alpha 1, beta 0) until loaded from a config document.
    pub fn new(pca: Rc<RefCell<Pca9685<B>>>, a: u8, b: u8) -> Self {
        Self {
            pca,
            a,
            b,
            ab_contiguous: b == a + 1,
            cal: MotorCalibration::default(),
            value: 0.0,
        }
    }

    pub fn channels(&self) -> (u8, u8) {
        (self.a, self.b)
    }

    pub fn calibration(&self) -> MotorCalibration {
        self.cal
    }

    /// Takes effect on the next `set_value`; the last commanded value is
    /// not resent.
    pub fn set_calibration(&mut self, cal: MotorCalibration) {
        self.cal = cal;
    }

    /// Last commanded speed
    pub fn value(&self) -> f32 {
        self.value
    }

    /// Calibrated per-leg duty cycles `[a, b]` for a speed command.
    ///
    /// Pure: facades use this to compose bulk writes without touching the
    /// bus. Exactly one leg is nonzero, and `b - a` recovers the clamped
    /// effective speed.
    pub fn compute_legs(&self, speed: f32) -> [f32; 2] {
        let v = (speed * self.cal.alpha + self.cal.beta).clamp(-1.0, 1.0);
        if v > 0.0 { [0.0, v] } else { [-v, 0.0] }
    }

    /// Command a speed in [-1, 1]; both legs are written before returning.
    ///
    /// Register-contiguous legs go out as one burst, otherwise as two
    /// independent channel writes.
    pub fn set_value(&mut self, speed: f32) -> Result<(), Pca9685Error> {
        let legs = self.compute_legs(speed);
        debug!(
            "Motor ({}, {}) speed {} -> legs {:?}",
            self.a, self.b, speed, legs
        );
        {
            let mut pca = self.pca.borrow_mut();
            if self.ab_contiguous {
                pca.set_range(self.a, &legs)?;
            } else {
                pca.set_channels(&[(self.a, legs[0]), (self.b, legs[1])])?;
            }
        }
        self.value = speed;
        Ok(())
    }
}
