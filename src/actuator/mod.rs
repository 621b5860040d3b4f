// Calibration transform layer
//
// Provides:
// - Motor: two-channel magnitude+direction drive with linear calibration
// - Servo: one-channel pulse-width position with piecewise calibration

mod motor;
mod servo;

pub use motor::Motor;
pub use servo::Servo;
