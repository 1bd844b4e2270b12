/// Manufacturer reported when none is configured.
pub const DEFAULT_MANUFACTURER: &str = "ASAIR";
/// Model reported when none is configured.
pub const DEFAULT_MODEL: &str = "AHT10";
/// Serial number reported when none is configured.
pub const DEFAULT_SERIAL: &str = "18981898";
/// I2C bus used when none is configured.
pub const DEFAULT_BUS: u8 = 1;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Accessory configuration as supplied by the hub.
pub struct AccessoryConfig {
    /// Display name, also used for the sensor services.
    pub name: String,
    /// Manufacturer shown in the information service.
    pub manufacturer: Option<String>,
    /// Model shown in the information service.
    pub model: Option<String>,
    /// Serial number shown in the information service.
    pub serial: Option<String>,
    /// I2C bus number, e.g. `1` for `/dev/i2c-1`.
    pub bus: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// The resolved identification block of the accessory.
pub struct AccessoryIdentity {
    /// Display name.
    pub name: String,
    /// Manufacturer.
    pub manufacturer: String,
    /// Model.
    pub model: String,
    /// Serial number.
    pub serial: String,
}

impl AccessoryConfig {
    /// Create a configuration with only a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the manufacturer.
    pub fn with_manufacturer(mut self, manufacturer: impl Into<String>) -> Self {
        self.manufacturer = Some(manufacturer.into());
        self
    }

    /// Set the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the serial number.
    pub fn with_serial(mut self, serial: impl Into<String>) -> Self {
        self.serial = Some(serial.into());
        self
    }

    /// Set the I2C bus number.
    pub fn with_bus(mut self, bus: u8) -> Self {
        self.bus = Some(bus);
        self
    }

    /// The bus number, falling back to [`DEFAULT_BUS`].
    pub fn bus(&self) -> u8 {
        self.bus.unwrap_or(DEFAULT_BUS)
    }

    /// Resolve the identification block, filling in defaults.
    pub fn identity(&self) -> AccessoryIdentity {
        AccessoryIdentity {
            name: self.name.clone(),
            manufacturer: self
                .manufacturer
                .clone()
                .unwrap_or_else(|| DEFAULT_MANUFACTURER.to_owned()),
            model: self
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_MODEL.to_owned()),
            serial: self
                .serial
                .clone()
                .unwrap_or_else(|| DEFAULT_SERIAL.to_owned()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = AccessoryConfig::new("Den");
        assert_eq!(config.bus(), 1);
        let id = config.identity();
        assert_eq!(id.name, "Den");
        assert_eq!(id.manufacturer, "ASAIR");
        assert_eq!(id.model, "AHT10");
        assert_eq!(id.serial, "18981898");
    }

    #[test]
    fn overrides() {
        let config = AccessoryConfig::new("Attic")
            .with_manufacturer("Acme")
            .with_model("AHT10-B")
            .with_serial("42")
            .with_bus(3);
        assert_eq!(config.bus(), 3);
        let id = config.identity();
        assert_eq!(id.manufacturer, "Acme");
        assert_eq!(id.model, "AHT10-B");
        assert_eq!(id.serial, "42");
    }
}
