// PWM controller module
//
// Provides:
// - PCA9685 register protocol (addressing, on/off-count encoding)
// - scalar, contiguous-range, and channel-list duty-cycle access

pub mod pca9685;

pub use pca9685::{Pca9685, Pca9685Error, decode_on_off, encode_on_off};
