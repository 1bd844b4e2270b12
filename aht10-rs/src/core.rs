use embedded_hal::{
    delay::DelayNs,
    i2c::{ErrorType, I2c, SevenBitAddress},
};

use crate::{
    Error, Humidity, Measurement, Temperature,
    address::SlaveAddress,
    register::{Aht10Command, Calibrate, MeasurementFrame, SoftReset, Status, Trigger},
};

/// Settle time after a soft reset, in milliseconds.
const RESET_DELAY_MS: u32 = 20;
/// Wait between two busy polls, in milliseconds.
const POLL_DELAY_MS: u32 = 10;
/// Number of busy polls before giving up.
const POLL_LIMIT: usize = 100;

/// Opens an I2C bus by its number.
///
/// Dropping the returned bus closes it, so a bus is released on every exit path.
pub trait BusOpener {
    /// The bus handle type.
    type Bus: I2c<SevenBitAddress>;

    /// Open the bus with the given number, e.g. `1` for `/dev/i2c-1`.
    fn open(&mut self, bus: u8) -> Result<Self::Bus, <Self::Bus as ErrorType>::Error>;
}

type BusError<B> = <<B as BusOpener>::Bus as ErrorType>::Error;

/// Represents the AHT10 sensor.
///
/// The sensor does not hold the bus between reads. Call [`Aht10::open`] to get an
/// [`Aht10Session`] for a read cycle.
pub struct Aht10<B, D> {
    pub(crate) opener: B,
    pub(crate) delay: D,
    pub(crate) bus: u8,
    pub(crate) address: u8,
}

/// An open bus session with a reset and calibrated AHT10.
///
/// The bus is released when the session is closed or dropped.
pub struct Aht10Session<'a, I, D> {
    i2c: I,
    address: u8,
    delay: &'a mut D,
}

impl<B: BusOpener, D: DelayNs> Aht10<B, D> {
    /// Probe for an AHT10 at `address` on bus number `bus`.
    ///
    /// The bus is opened for the probe only and closed again before returning.
    /// Returns [`Error::DeviceNotFound`] if the address does not acknowledge.
    pub fn new(
        mut opener: B,
        delay: D,
        bus: u8,
        address: SlaveAddress,
    ) -> Result<Self, Error<BusError<B>>> {
        let address = address.into_bits();
        let mut i2c = opener.open(bus)?;
        let mut probe = [0u8; 1];
        if let Err(e) = i2c.read(address, &mut probe) {
            log::warn!("[AHT] Bus {bus}: no device at 0x{address:02x}: {e:?}");
            return Err(Error::DeviceNotFound);
        }
        drop(i2c);
        log::debug!("[AHT] Bus {bus}: device found at 0x{address:02x}");
        Ok(Self {
            opener,
            delay,
            bus,
            address,
        })
    }

    /// Get the address of the device.
    pub fn get_address(&self) -> u8 {
        self.address
    }

    /// Get the bus number the device lives on.
    pub fn get_bus(&self) -> u8 {
        self.bus
    }

    /// Open the bus, soft reset the sensor and run the calibration handshake.
    ///
    /// Returns [`Error::Calibration`] if the calibrated bit is clear afterwards.
    pub fn open(&mut self) -> Result<Aht10Session<'_, B::Bus, D>, Error<BusError<B>>> {
        let i2c = self.opener.open(self.bus)?;
        let mut session = Aht10Session {
            i2c,
            address: self.address,
            delay: &mut self.delay,
        };
        session.reset()?;
        if !session.calibrate()? {
            log::error!("[AHT] Sensor 0x{:02x}: Could not calibrate.", session.address);
            return Err(Error::Calibration);
        }
        Ok(session)
    }

    /// Give back the bus opener and delay.
    pub fn release(self) -> (B, D) {
        (self.opener, self.delay)
    }
}

impl<I: I2c<SevenBitAddress>, D: DelayNs> Aht10Session<'_, I, D> {
    fn reset(&mut self) -> Result<(), Error<I::Error>> {
        SoftReset::write(&mut self.i2c, self.address)?;
        self.delay.delay_ms(RESET_DELAY_MS);
        Ok(())
    }

    fn calibrate(&mut self) -> Result<bool, Error<I::Error>> {
        Calibrate::write(&mut self.i2c, self.address)?;
        Ok(self.wait_ready()?.calibrated())
    }

    fn wait_ready(&mut self) -> Result<Status, Error<I::Error>> {
        for _ in 0..POLL_LIMIT {
            let status = Status::read(&mut self.i2c, self.address)?;
            if !status.busy() {
                return Ok(status);
            }
            self.delay.delay_ms(POLL_DELAY_MS);
        }
        Err(Error::Timeout)
    }

    /// Read the status byte.
    pub fn read_status(&mut self) -> Result<Status, Error<I::Error>> {
        Status::read(&mut self.i2c, self.address)
    }

    /// Run one measurement cycle and return the raw frame.
    pub fn read_frame(&mut self) -> Result<MeasurementFrame, Error<I::Error>> {
        Trigger::write(&mut self.i2c, self.address)?;
        self.wait_ready()?;
        let frame = MeasurementFrame::read(&mut self.i2c, self.address)?;
        log::debug!("[AHT] Sensor 0x{:02x}: frame {:02x?}", self.address, frame.bytes());
        Ok(frame)
    }

    /// Run one measurement cycle and decode both values.
    pub fn measure(&mut self) -> Result<Measurement, Error<I::Error>> {
        Ok(self.read_frame()?.measurement())
    }

    /// Run one measurement cycle and decode the temperature.
    pub fn read_temperature(&mut self) -> Result<Temperature, Error<I::Error>> {
        Ok(self.read_frame()?.temperature())
    }

    /// Run one measurement cycle and decode the relative humidity.
    pub fn read_humidity(&mut self) -> Result<Humidity, Error<I::Error>> {
        Ok(self.read_frame()?.humidity())
    }

    /// Release the bus.
    pub fn close(self) {
        log::debug!("[AHT] Sensor 0x{:02x}: closing bus", self.address);
    }
}
