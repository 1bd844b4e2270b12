//! # thermo-accessory
//! Bridges an AHT10 sensor to a home-automation hub. The hub asks for the current
//! temperature or relative humidity, and every request runs one full
//! open/read/close cycle on the sensor before the value is handed back.
mod accessory;
mod bus;
mod config;
mod error;
pub mod hap;

pub use accessory::{PLUGIN_IDENTIFIER, TemperatureHumidityAccessory, register};
pub use bus::LinuxBus;
pub use config::{AccessoryConfig, AccessoryIdentity};
pub use error::AccessoryError;
