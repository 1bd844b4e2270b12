use bitfield_struct::bitfield;

#[bitfield(u8)]
/// Represents the slave address for the AHT10 sensor.
/// The default address is 0x38. Pulling the ADR pin high moves the sensor to 0x39,
/// which is selected by setting the `adr` bit.
pub struct SlaveAddress {
    /// State of the ADR pin.
    #[bits(1, default = false)]
    pub adr: bool,
    #[bits(7, default = 0x38 >> 1)]
    _base: u8,
}
