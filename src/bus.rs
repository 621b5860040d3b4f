// Two-wire bus transport for the PWM controller
//
// The driver only needs block register access against a fixed device
// address, so the transport is a small trait with one Linux i2cdev
// implementation. Tests substitute a mock that models the chip's
// register image.

use std::path::Path;

use i2cdev::core::I2CDevice;
use i2cdev::linux::LinuxI2CDevice;
use tracing::debug;

/// Default 7-bit address of the PCA9685 on the carrier board
pub const DEFAULT_I2C_ADDR: u16 = 0x40;

/// Opaque bus failure, propagated to the caller and never retried
#[derive(Debug, thiserror::Error)]
#[error("bus transport error: {0}")]
pub struct TransportError(Box<dyn std::error::Error + Send + Sync>);

impl TransportError {
    pub fn new<E: std::error::Error + Send + Sync + 'static>(err: E) -> Self {
        Self(Box::new(err))
    }

    pub fn msg(msg: impl Into<String>) -> Self {
        Self(msg.into().into())
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;

/// Block register access against a fixed device address
pub trait I2cBus {
    fn write_block(&mut self, register: u8, data: &[u8]) -> Result<()>;
    fn read_block(&mut self, register: u8, len: u8) -> Result<Vec<u8>>;
}

/// Userspace I2C via /dev/i2c-N
pub struct LinuxI2cBus {
    dev: LinuxI2CDevice,
}

impl LinuxI2cBus {
    /// Open bus number `bus` (/dev/i2c-`bus`) at 7-bit address `addr`
    pub fn open(bus: u8, addr: u16) -> Result<Self> {
        let path = format!("/dev/i2c-{bus}");
        let dev = LinuxI2CDevice::new(Path::new(&path), addr).map_err(TransportError::new)?;
        debug!("Opened {} at address 0x{:02X}", path, addr);
        Ok(Self { dev })
    }
}

impl I2cBus for LinuxI2cBus {
    fn write_block(&mut self, register: u8, data: &[u8]) -> Result<()> {
        self.dev
            .smbus_write_i2c_block_data(register, data)
            .map_err(TransportError::new)
    }

    fn read_block(&mut self, register: u8, len: u8) -> Result<Vec<u8>> {
        self.dev
            .smbus_read_i2c_block_data(register, len)
            .map_err(TransportError::new)
    }
}
