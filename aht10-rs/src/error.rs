use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Represents errors that can occur while interacting with the AHT10 sensor.
pub enum Error<E> {
    /// An error occurred while communicating with the I2C bus.
    I2c(E),
    /// The presence probe at construction was not acknowledged.
    DeviceNotFound,
    /// The calibrated status bit is clear after the calibration command.
    Calibration,
    /// The busy status bit did not clear in time.
    Timeout,
}

impl<E> From<E> for Error<E> {
    fn from(e: E) -> Self {
        Error::I2c(e)
    }
}

impl<E: fmt::Debug> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::I2c(e) => write!(f, "I2C bus error: {e:?}"),
            Error::DeviceNotFound => f.write_str("I2C device not found"),
            Error::Calibration => f.write_str("could not calibrate AHT10 device"),
            Error::Timeout => f.write_str("AHT10 device stayed busy"),
        }
    }
}
