// Calibrated PWM actuator runtime for PCA9685-based robot bases
//
// Provides:
// - PCA9685 register protocol over a pluggable two-wire bus
// - Motor/Servo calibration transforms with persisted coefficients
// - JetBot (differential drive) and JetRacer (steering) facades

pub mod actuator;
pub mod bus;
pub mod calibration;
pub mod pwm;
pub mod robot;
