use bitfield_struct::bitfield;
use embedded_hal::i2c::{I2c, SevenBitAddress};

use crate::Error;

/// Full scale of the 20-bit humidity and temperature fields.
const FULL_SCALE: f32 = 0x100000 as f32;

/// Commands are written as a register byte, optionally followed by a 16-bit
/// payload sent low byte first.
pub(crate) trait Aht10Command {
    const ADDRESS: u8;
    const DATA: Option<u16>;

    fn write<T: I2c<SevenBitAddress>>(i2c: &mut T, address: u8) -> Result<(), Error<T::Error>> {
        match Self::DATA {
            None => i2c.write(address, &[Self::ADDRESS])?,
            Some(data) => {
                let [lo, hi] = data.to_le_bytes();
                i2c.write(address, &[Self::ADDRESS, lo, hi])?
            }
        }
        Ok(())
    }
}

/// Soft reset, restores the power-on state.
pub(crate) struct SoftReset;

impl Aht10Command for SoftReset {
    const ADDRESS: u8 = 0xBA;
    const DATA: Option<u16> = None;
}

/// Loads the factory calibration coefficients.
pub(crate) struct Calibrate;

impl Aht10Command for Calibrate {
    const ADDRESS: u8 = 0xE1;
    const DATA: Option<u16> = Some(0x0008);
}

/// Starts a measurement cycle. The result frame is read back from the same register.
pub(crate) struct Trigger;

impl Aht10Command for Trigger {
    const ADDRESS: u8 = 0xAC;
    const DATA: Option<u16> = Some(0x0033);
}

#[bitfield(u8)]
#[derive(PartialEq, Eq)]
/// The status byte returned by the AHT10 on a plain read.
pub struct Status {
    #[bits(3)]
    _rsvd: u8,
    /// The calibration coefficients are loaded.
    #[bits(1, access = RO)]
    pub calibrated: bool,
    #[bits(3)]
    _rsvd2: u8,
    /// A command or measurement is still in progress.
    #[bits(1, access = RO)]
    pub busy: bool,
}

impl Status {
    /// Receive a single status byte from the sensor.
    pub(crate) fn read<T: I2c<SevenBitAddress>>(
        i2c: &mut T,
        address: u8,
    ) -> Result<Self, Error<T::Error>> {
        let mut buffer = [0u8; 1];
        i2c.read(address, &mut buffer)?;
        Ok(Self::from_bits(buffer[0]))
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
/// Represents a temperature measurement from the AHT10 sensor.
pub struct Temperature {
    pub(crate) value: u32,
}

impl Temperature {
    /// Returns the raw 20-bit temperature value.
    pub fn raw(&self) -> u32 {
        self.value
    }

    /// Converts the raw temperature value to Celsius.
    pub fn celsius(&self) -> f32 {
        (self.value as f32 * 200.0 / FULL_SCALE) - 50.0
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
/// Represents a relative humidity measurement from the AHT10 sensor.
pub struct Humidity {
    pub(crate) value: u32,
}

impl Humidity {
    /// Returns the raw 20-bit humidity value.
    pub fn raw(&self) -> u32 {
        self.value
    }

    /// Converts the raw humidity value to percentage (0-100).
    pub fn percentage(&self) -> f32 {
        self.value as f32 * 100.0 / FULL_SCALE
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
/// Temperature and humidity decoded from one measurement frame.
pub struct Measurement {
    /// The decoded temperature.
    pub temperature: Temperature,
    /// The decoded relative humidity.
    pub humidity: Humidity,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
/// The 5-byte block read back after a trigger command.
///
/// Byte 0 is the status byte, the remaining bytes carry the packed 20-bit humidity
/// and temperature fields.
pub struct MeasurementFrame {
    data: [u8; Self::FRAME_LEN],
}

impl MeasurementFrame {
    /// Length of the frame in bytes.
    pub const FRAME_LEN: usize = 5;

    /// Read the frame from the trigger register.
    pub(crate) fn read<T: I2c<SevenBitAddress>>(
        i2c: &mut T,
        address: u8,
    ) -> Result<Self, Error<T::Error>> {
        let mut data = [0u8; Self::FRAME_LEN];
        i2c.write_read(address, &[Trigger::ADDRESS], &mut data)?;
        Ok(Self { data })
    }

    /// Returns the raw frame bytes.
    pub fn bytes(&self) -> &[u8; Self::FRAME_LEN] {
        &self.data
    }

    /// Returns the status byte captured with the frame.
    pub fn status(&self) -> Status {
        Status::from_bits(self.data[0])
    }

    // Offset 5 is past the end of the frame and reads as zero.
    fn byte(&self, offset: usize) -> u32 {
        self.data.get(offset).copied().unwrap_or(0) as u32
    }

    /// Decode the humidity field from bytes 1, 2 and the high nibble of byte 3.
    pub fn humidity(&self) -> Humidity {
        Humidity {
            value: self.byte(1) << 12 | self.byte(2) << 4 | self.byte(3) >> 4,
        }
    }

    /// Decode the temperature field from the low nibble of byte 3 and bytes 4 and 5.
    pub fn temperature(&self) -> Temperature {
        Temperature {
            value: (self.byte(3) & 0xF) << 16 | self.byte(4) << 8 | self.byte(5),
        }
    }

    /// Decode both fields.
    pub fn measurement(&self) -> Measurement {
        Measurement {
            temperature: self.temperature(),
            humidity: self.humidity(),
        }
    }
}

impl From<[u8; MeasurementFrame::FRAME_LEN]> for MeasurementFrame {
    fn from(data: [u8; MeasurementFrame::FRAME_LEN]) -> Self {
        Self { data }
    }
}
