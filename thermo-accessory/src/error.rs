use core::fmt::Debug;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
/// Errors reported to the hub through a characteristic callback.
pub enum AccessoryError {
    /// The sensor did not answer the presence probe.
    #[error("I2C device not found")]
    DeviceNotFound,
    /// The calibrated bit stayed clear after calibration.
    #[error("could not calibrate AHT10 device")]
    Calibration,
    /// The sensor stayed busy.
    #[error("sensor did not become ready")]
    Timeout,
    /// The bus reported an error.
    #[error("I2C bus error: {0}")]
    Bus(String),
    /// Another request holds the sensor.
    #[error("sensor is in use by another request")]
    Busy,
}

impl<E: Debug> From<aht10::Error<E>> for AccessoryError {
    fn from(e: aht10::Error<E>) -> Self {
        match e {
            aht10::Error::I2c(e) => AccessoryError::Bus(format!("{e:?}")),
            aht10::Error::DeviceNotFound => AccessoryError::DeviceNotFound,
            aht10::Error::Calibration => AccessoryError::Calibration,
            aht10::Error::Timeout => AccessoryError::Timeout,
        }
    }
}
