// Calibration documents persisted as JSON
//
// Each actuator's coefficients live under a logical name in a flat
// document. Documents are always written and read in full; a missing
// file or missing key is a load error the caller decides how to handle.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::info;

/// Error types for calibration persistence
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("calibration file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("calibration document error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Linear calibration for a two-leg DC motor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotorCalibration {
    /// Scale applied to the commanded speed
    pub alpha: f32,
    /// Offset added after scaling
    pub beta: f32,
}

impl Default for MotorCalibration {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            beta: 0.0,
        }
    }
}

/// Piecewise-linear calibration for a pulse-width servo.
///
/// `alpha0` is the slope above center, `alpha1` below; `beta` is the
/// center duty cycle. The physical center need not be the midpoint of
/// the duty range, which is why the two slopes are independent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ServoCalibration {
    pub alpha0: f32,
    pub alpha1: f32,
    pub beta: f32,
    pub min_duty: f32,
    pub max_duty: f32,
}

/// Differential-drive profile: one motor pair
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DifferentialConfig {
    pub left_motor: MotorCalibration,
    pub right_motor: MotorCalibration,
}

/// Steering profile: steering servo plus throttle ESC
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SteeringConfig {
    pub servo: ServoCalibration,
    pub motor: ServoCalibration,
}

/// Read a full calibration document from `path`
pub fn load<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

/// Write a full calibration document to `path`
pub fn save<T: Serialize>(path: &Path, document: &T) -> Result<(), ConfigError> {
    let text = serde_json::to_string_pretty(document)?;
    fs::write(path, text)?;
    info!("Saved calibration to {}", path.display());
    Ok(())
}

/// Resolve `file_name` under $HOME, falling back to the working directory
pub fn default_config_path(file_name: &str) -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(file_name)
}
