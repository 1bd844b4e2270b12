#![cfg_attr(not(test), no_std)]
#![deny(missing_docs)]
//!# AHT10 - Driver for the ASAIR AHT10 Humidity and Temperature Sensor
//! This crate provides a minimal register-level driver for the AHT10 sensor.
//! Every read cycle opens the bus, resets and calibrates the sensor, triggers a
//! measurement and decodes the returned frame before the bus is released again.
mod address;
mod core;
mod error;
mod register;

pub use address::SlaveAddress;
pub use crate::core::{Aht10, Aht10Session, BusOpener};
pub use error::Error;
pub use register::{Humidity, Measurement, MeasurementFrame, Status, Temperature};
