// Robot facades composing the transform layer into named driving
// operations.
//
// Provides:
// - JetBot: differential drive (two motor pairs)
// - JetRacer: steering servo plus throttle ESC

mod jetbot;
mod jetracer;

use crate::calibration::ConfigError;
use crate::pwm::Pca9685Error;

pub use jetbot::{JETBOT_CONF_FILE, JetBot};
pub use jetracer::{JETRACER_CONF_FILE, JetRacer};

/// Error types for the facades
#[derive(Debug, thiserror::Error)]
pub enum RobotError {
    #[error(transparent)]
    Pwm(#[from] Pca9685Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
