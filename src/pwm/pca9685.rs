// PCA9685 16-channel PWM controller register protocol
//
// Duty cycles are 12-bit on/off counter pairs per channel, with reserved
// encodings for full-off and full-on. Channel N's 4-byte block sits at
// LED0_ON_L + 4*N and the chip auto-increments the register pointer, so
// a contiguous run of channels can be written in one burst.

use tracing::debug;

use crate::bus::{I2cBus, TransportError};

/// Register addresses
pub const MODE1: u8 = 0x00;
pub const MODE2: u8 = 0x01;
pub const SUBADR1: u8 = 0x02;
pub const SUBADR2: u8 = 0x03;
pub const SUBADR3: u8 = 0x04;
pub const ALLCALLADR: u8 = 0x05;
pub const LED0_ON_L: u8 = 0x06;
pub const ALL_LED_ON_L: u8 = 0xFA;
pub const PRESCALE: u8 = 0xFE;

/// MODE1 bit masks
pub const MODE1_RESTART: u8 = 0x80;
pub const MODE1_EXTCLK: u8 = 0x40;
pub const MODE1_AUTO_INCREMENT: u8 = 0x20;
pub const MODE1_SLEEP: u8 = 0x10;
pub const MODE1_SUB1: u8 = 0x08;
pub const MODE1_SUB2: u8 = 0x04;
pub const MODE1_SUB3: u8 = 0x02;
pub const MODE1_ALLCALL: u8 = 0x01;

/// LEDn_ON_H / LEDn_OFF_H bit masks
pub const LEDN_FULL_MASK: u8 = 0x10;
pub const LEDN_COUNT_MASK: u8 = 0x0F;

/// Internal oscillator frequency in Hz
pub const REF_CLOCK_HZ: u32 = 25_000_000;

/// Number of PWM output channels
pub const CHANNEL_COUNT: u8 = 16;

/// Error types for the PWM controller
#[derive(Debug, thiserror::Error)]
pub enum Pca9685Error {
    #[error("PCA9685 has only 16 channels, can't access channel {channel}")]
    Channel { channel: u8 },

    #[error("duty cycle {value} out of range, should be within 0.0 to 1.0")]
    DutyCycle { value: f32 },

    #[error("output frequency not configured")]
    FrequencyNotSet,

    #[error(transparent)]
    Transport(#[from] TransportError),
}

pub type Result<T> = std::result::Result<T, Pca9685Error>;

/// Encode a duty cycle into a channel's 4-byte on/off register block.
///
/// 0.0 uses the full-off flag. 1.0 saturates the off-count instead of the
/// chip's native full-on flag, which some clone firmwares mishandle.
pub fn encode_on_off(duty_cycle: f32) -> Result<[u8; 4]> {
    if !(0.0..=1.0).contains(&duty_cycle) {
        return Err(Pca9685Error::DutyCycle { value: duty_cycle });
    }
    let int_cycle = (duty_cycle * 4096.0).round() as u16;
    if int_cycle == 0 {
        Ok([0x00, 0x00, 0x00, LEDN_FULL_MASK]) // full off
    } else if int_cycle == 4096 {
        Ok([0x00, 0x00, 0xFF, 0x0F]) // full on
    } else {
        Ok([
            0x00,
            0x00,
            (int_cycle & 0xFF) as u8,
            ((int_cycle >> 8) as u8) & LEDN_COUNT_MASK,
        ])
    }
}

/// Decode a channel's 4-byte register block back to a duty cycle
pub fn decode_on_off(block: [u8; 4]) -> f32 {
    if block[1] & LEDN_FULL_MASK != 0 {
        1.0
    } else if block[3] & LEDN_FULL_MASK != 0 {
        0.0
    } else {
        let on = block[0] as i32 | ((block[1] as i32) << 8);
        let off = block[2] as i32 | ((block[3] as i32) << 8);
        (off - on) as f32 / 4096.0
    }
}

/// PCA9685 driver over a two-wire bus
pub struct Pca9685<B: I2cBus> {
    bus: B,
    ref_clock: u32,
    frequency: u32,
}

impl<B: I2cBus> Pca9685<B> {
    /// Take ownership of the bus and reset the chip (MODE1 cleared)
    pub fn new(bus: B) -> Result<Self> {
        let mut pca = Self::attach(bus);
        pca.reset()?;
        Ok(pca)
    }

    /// Take ownership of the bus without touching the chip.
    ///
    /// Used by read-only tooling; the chip keeps whatever mode and
    /// frequency it was already running with.
    pub fn attach(bus: B) -> Self {
        Self {
            bus,
            ref_clock: REF_CLOCK_HZ,
            frequency: 0,
        }
    }

    pub fn reset(&mut self) -> Result<()> {
        self.bus.write_block(MODE1, &[0x00])?;
        Ok(())
    }

    /// Set the PWM output frequency for all 16 channels.
    ///
    /// The chip must sleep while the prescale register is written, so this
    /// must not run concurrently with duty-cycle writes from elsewhere.
    pub fn set_frequency(&mut self, hz: u32) -> Result<()> {
        let prescale = (self.ref_clock as f64 / 4096.0 / hz as f64 + 0.5) as u8;
        let old_mode = self.read_register(MODE1)?;
        self.bus
            .write_block(MODE1, &[(old_mode & !MODE1_RESTART) | MODE1_SLEEP])?;
        self.bus.write_block(PRESCALE, &[prescale])?;
        self.bus.write_block(MODE1, &[old_mode])?;
        self.bus
            .write_block(MODE1, &[old_mode | MODE1_AUTO_INCREMENT])?;
        self.frequency = hz;
        debug!("Frequency set to {} Hz (prescale {})", hz, prescale);
        Ok(())
    }

    /// Last applied output frequency in Hz; 0 until `set_frequency` runs
    pub fn frequency(&self) -> u32 {
        self.frequency
    }

    /// Read a single register
    pub fn read_register(&mut self, register: u8) -> Result<u8> {
        let raw = self.bus.read_block(register, 1)?;
        raw.first().copied().ok_or_else(|| {
            TransportError::msg(format!("short read from register 0x{register:02X}")).into()
        })
    }

    /// Set one channel's duty cycle
    pub fn set_duty_cycle(&mut self, channel: u8, duty_cycle: f32) -> Result<()> {
        let reg = channel_reg(channel)?;
        let block = encode_on_off(duty_cycle)?;
        debug!("Channel {} duty {} -> {:02X?}", channel, duty_cycle, block);
        self.bus.write_block(reg, &block)?;
        Ok(())
    }

    /// Read one channel's duty cycle back from the chip
    pub fn get_duty_cycle(&mut self, channel: u8) -> Result<f32> {
        let reg = channel_reg(channel)?;
        let raw = self.bus.read_block(reg, 4)?;
        let block: [u8; 4] = raw.as_slice().try_into().map_err(|_| {
            TransportError::msg(format!("short read from register 0x{reg:02X}"))
        })?;
        Ok(decode_on_off(block))
    }

    /// Set a contiguous run of channels starting at `first` in one burst.
    ///
    /// Relies on register auto-increment, so the whole run goes out in a
    /// single block write. A failure partway leaves the run undefined.
    pub fn set_range(&mut self, first: u8, duty_cycles: &[f32]) -> Result<()> {
        if duty_cycles.is_empty() {
            return Ok(());
        }
        let reg = channel_reg(first)?;
        channel_reg(first + duty_cycles.len() as u8 - 1)?;

        let mut block = Vec::with_capacity(duty_cycles.len() * 4);
        for &duty in duty_cycles {
            block.extend_from_slice(&encode_on_off(duty)?);
        }
        debug!(
            "Burst write of {} channels starting at {}",
            duty_cycles.len(),
            first
        );
        self.bus.write_block(reg, &block)?;
        Ok(())
    }

    /// Read `count` consecutive channels starting at `first`
    pub fn get_range(&mut self, first: u8, count: u8) -> Result<Vec<f32>> {
        let mut duties = Vec::with_capacity(count as usize);
        for channel in first..first + count {
            duties.push(self.get_duty_cycle(channel)?);
        }
        Ok(duties)
    }

    /// Set an explicit list of channels as independent writes.
    ///
    /// No atomicity across channels; a failure leaves earlier entries
    /// already applied.
    pub fn set_channels(&mut self, entries: &[(u8, f32)]) -> Result<()> {
        for &(channel, duty) in entries {
            self.set_duty_cycle(channel, duty)?;
        }
        Ok(())
    }

    /// Read an explicit list of channels
    pub fn get_channels(&mut self, channels: &[u8]) -> Result<Vec<f32>> {
        let mut duties = Vec::with_capacity(channels.len());
        for &channel in channels {
            duties.push(self.get_duty_cycle(channel)?);
        }
        Ok(duties)
    }

    /// Direct access to the underlying bus, for tooling and tests
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }
}

/// LEDx_ON_L register address for a channel
fn channel_reg(channel: u8) -> Result<u8> {
    if channel >= CHANNEL_COUNT {
        return Err(Pca9685Error::Channel { channel });
    }
    Ok(LED0_ON_L + channel * 4)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::mock::MockBus;

    #[test]
    fn test_encode_reserved_patterns() {
        assert_eq!(encode_on_off(0.0).unwrap(), [0x00, 0x00, 0x00, 0x10]);
        // Saturated off-count, not the native full-on flag
        assert_eq!(encode_on_off(1.0).unwrap(), [0x00, 0x00, 0xFF, 0x0F]);
    }

    #[test]
    fn test_encode_linear() {
        // 0.5 * 4096 = 2048 = 0x800
        assert_eq!(encode_on_off(0.5).unwrap(), [0x00, 0x00, 0x00, 0x08]);
        // 0.25 * 4096 = 1024 = 0x400
        assert_eq!(encode_on_off(0.25).unwrap(), [0x00, 0x00, 0x00, 0x04]);
    }

    #[test]
    fn test_encode_out_of_range() {
        assert!(matches!(
            encode_on_off(1.5),
            Err(Pca9685Error::DutyCycle { .. })
        ));
        assert!(matches!(
            encode_on_off(-0.1),
            Err(Pca9685Error::DutyCycle { .. })
        ));
    }

    #[test]
    fn test_round_trip_within_resolution() {
        for duty in [0.1, 0.25, 0.333, 0.5, 0.75, 0.9, 0.999] {
            let decoded = decode_on_off(encode_on_off(duty).unwrap());
            assert!(
                (decoded - duty).abs() <= 1.0 / 4096.0,
                "duty {} decoded to {}",
                duty,
                decoded
            );
        }
    }

    #[test]
    fn test_decode_reserved_patterns() {
        // Native full-on flag in the ON high byte
        assert_eq!(decode_on_off([0x00, 0x10, 0x00, 0x00]), 1.0);
        // Full-off flag in the OFF high byte
        assert_eq!(decode_on_off([0x00, 0x00, 0x00, 0x10]), 0.0);
    }

    #[test]
    fn test_channel_out_of_range() {
        let mut pca = Pca9685::new(MockBus::new()).unwrap();
        assert!(matches!(
            pca.set_duty_cycle(16, 0.5),
            Err(Pca9685Error::Channel { channel: 16 })
        ));
        assert!(matches!(
            pca.get_duty_cycle(255),
            Err(Pca9685Error::Channel { channel: 255 })
        ));
    }

    #[test]
    fn test_set_frequency_sequence() {
        let mut pca = Pca9685::new(MockBus::new()).unwrap();
        pca.bus_mut().writes.clear();
        pca.set_frequency(1600).unwrap();

        // round(25_000_000 / 4096 / 1600) = 4
        let writes = &pca.bus_mut().writes;
        assert_eq!(
            writes.as_slice(),
            &[
                (MODE1, vec![MODE1_SLEEP]),
                (PRESCALE, vec![4]),
                (MODE1, vec![0x00]),
                (MODE1, vec![MODE1_AUTO_INCREMENT]),
            ]
        );
        assert_eq!(pca.frequency(), 1600);
    }

    #[test]
    fn test_set_and_get_duty_cycle() {
        let mut pca = Pca9685::new(MockBus::new()).unwrap();
        pca.set_duty_cycle(3, 0.5).unwrap();

        // Channel 3 block lives at 0x06 + 12
        let (reg, block) = pca.bus_mut().writes.last().unwrap().clone();
        assert_eq!(reg, 0x12);
        assert_eq!(block, vec![0x00, 0x00, 0x00, 0x08]);
        assert_eq!(pca.get_duty_cycle(3).unwrap(), 0.5);
    }

    #[test]
    fn test_range_burst_write() {
        let mut pca = Pca9685::new(MockBus::new()).unwrap();
        pca.bus_mut().writes.clear();
        pca.set_range(0, &[0.0, 0.5]).unwrap();

        let writes = &pca.bus_mut().writes;
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].0, LED0_ON_L);
        assert_eq!(
            writes[0].1,
            vec![0x00, 0x00, 0x00, 0x10, 0x00, 0x00, 0x00, 0x08]
        );
        assert_eq!(pca.get_range(0, 2).unwrap(), vec![0.0, 0.5]);
    }

    #[test]
    fn test_range_must_fit_channel_space() {
        let mut pca = Pca9685::new(MockBus::new()).unwrap();
        assert!(matches!(
            pca.set_range(15, &[0.0, 0.0]),
            Err(Pca9685Error::Channel { channel: 16 })
        ));
    }

    #[test]
    fn test_channel_list_independent_writes() {
        let mut pca = Pca9685::new(MockBus::new()).unwrap();
        pca.bus_mut().writes.clear();
        pca.set_channels(&[(0, 0.25), (5, 0.75)]).unwrap();

        assert_eq!(pca.bus_mut().writes.len(), 2);
        assert_eq!(pca.get_channels(&[0, 5]).unwrap(), vec![0.25, 0.75]);
    }
}
