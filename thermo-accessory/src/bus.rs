use aht10::BusOpener;
use linux_embedded_hal::{I2CError, I2cdev};

#[derive(Debug, Clone, Copy, Default)]
/// Opens `/dev/i2c-N` character devices.
pub struct LinuxBus;

impl BusOpener for LinuxBus {
    type Bus = I2cdev;

    fn open(&mut self, bus: u8) -> Result<I2cdev, I2CError> {
        let path = format!("/dev/i2c-{bus}");
        log::debug!("[BUS] Opening bus: {path}");
        I2cdev::new(&path).map_err(I2CError::from)
    }
}
