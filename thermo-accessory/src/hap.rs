//! The slice of the hub's service and characteristic model the accessory uses.
//!
//! The hub hands its implementation in through [`Api`] and [`Hap`], so the accessory
//! never reaches for a global hub handle.
use crate::{AccessoryConfig, AccessoryError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Services the accessory exposes.
pub enum ServiceKind {
    /// Manufacturer, model and serial number.
    AccessoryInformation,
    /// Current temperature in Celsius.
    TemperatureSensor,
    /// Current relative humidity in percent.
    HumiditySensor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Characteristics the accessory sets or serves.
pub enum CharacteristicKind {
    /// Manufacturer name.
    Manufacturer,
    /// Model name.
    Model,
    /// Serial number.
    SerialNumber,
    /// Current temperature in Celsius.
    CurrentTemperature,
    /// Current relative humidity in percent.
    CurrentRelativeHumidity,
}

/// Completion callback of a get request. Called exactly once, with either a value or an error.
pub type GetCallback = Box<dyn FnOnce(Result<f32, AccessoryError>)>;

/// Handler the hub invokes for every get request on a characteristic.
pub type GetHandler = Box<dyn FnMut(GetCallback)>;

/// A service object owned by the hub.
pub trait Service: Clone {
    /// Set a fixed characteristic value.
    fn set_characteristic(&mut self, kind: CharacteristicKind, value: &str);

    /// Attach the get handler of a characteristic.
    fn on_get(&mut self, kind: CharacteristicKind, handler: GetHandler);
}

/// Service constructors of the hub.
pub trait Hap {
    /// The hub's service type.
    type Service: Service + 'static;

    /// Create a service, optionally with a display name.
    fn service(&self, kind: ServiceKind, name: Option<&str>) -> Self::Service;
}

/// An accessory as seen by the hub.
pub trait Accessory<S> {
    /// Called by the hub during pairing.
    fn identify(&self);

    /// All services to publish for this accessory.
    fn services(&self) -> Vec<S>;
}

/// Builds an accessory from its configuration.
pub type AccessoryConstructor<H> = Box<
    dyn Fn(&AccessoryConfig, &H) -> Result<Box<dyn Accessory<<H as Hap>::Service>>, AccessoryError>,
>;

/// The hub entry points a plugin is given.
pub trait Api {
    /// The hub's service constructors.
    type Hap: Hap;

    /// Access the service constructors.
    fn hap(&self) -> &Self::Hap;

    /// Register an accessory constructor under a plugin identifier.
    fn register_accessory(
        &mut self,
        plugin: &'static str,
        constructor: AccessoryConstructor<Self::Hap>,
    );
}
