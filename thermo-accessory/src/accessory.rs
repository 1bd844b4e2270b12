use std::{cell::RefCell, fmt, rc::Rc};

use aht10::{Aht10, BusOpener, SlaveAddress};
use embedded_hal::delay::DelayNs;

use crate::{
    AccessoryConfig, AccessoryError,
    hap::{
        Accessory, Api, CharacteristicKind, GetCallback, GetHandler, Hap, Service, ServiceKind,
    },
};

/// Identifier the accessory is registered under.
pub const PLUGIN_IDENTIFIER: &str = "homebridge-rpi-i2c-temp-hum";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Quantity {
    Temperature,
    RelativeHumidity,
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quantity::Temperature => f.write_str("temperature"),
            Quantity::RelativeHumidity => f.write_str("relative humidity"),
        }
    }
}

/// An AHT10 published as a temperature sensor and a humidity sensor.
pub struct TemperatureHumidityAccessory<S> {
    name: String,
    information: S,
    temperature: S,
    humidity: S,
}

impl<S: Service> TemperatureHumidityAccessory<S> {
    /// Probe the sensor and build the information, temperature and humidity services.
    pub fn new<H, B, D>(
        config: &AccessoryConfig,
        hap: &H,
        opener: B,
        delay: D,
    ) -> Result<Self, AccessoryError>
    where
        H: Hap<Service = S>,
        B: BusOpener + 'static,
        D: DelayNs + 'static,
    {
        let identity = config.identity();
        let sensor = Aht10::new(opener, delay, config.bus(), SlaveAddress::default())?;
        let sensor = Rc::new(RefCell::new(sensor));

        let mut information = hap.service(ServiceKind::AccessoryInformation, None);
        information.set_characteristic(CharacteristicKind::Manufacturer, &identity.manufacturer);
        information.set_characteristic(CharacteristicKind::Model, &identity.model);
        information.set_characteristic(CharacteristicKind::SerialNumber, &identity.serial);

        let mut temperature = hap.service(ServiceKind::TemperatureSensor, Some(&identity.name));
        temperature.on_get(
            CharacteristicKind::CurrentTemperature,
            getter(sensor.clone(), Quantity::Temperature),
        );

        let mut humidity = hap.service(ServiceKind::HumiditySensor, Some(&identity.name));
        humidity.on_get(
            CharacteristicKind::CurrentRelativeHumidity,
            getter(sensor, Quantity::RelativeHumidity),
        );

        log::info!("[ACC] {} finished initializing!", identity.name);
        Ok(Self {
            name: identity.name,
            information,
            temperature,
            humidity,
        })
    }

    /// Get the configured name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<S: Service> Accessory<S> for TemperatureHumidityAccessory<S> {
    fn identify(&self) {
        log::info!("[ACC] {}: Identify!", self.name);
    }

    fn services(&self) -> Vec<S> {
        vec![
            self.information.clone(),
            self.temperature.clone(),
            self.humidity.clone(),
        ]
    }
}

fn getter<B, D>(sensor: Rc<RefCell<Aht10<B, D>>>, quantity: Quantity) -> GetHandler
where
    B: BusOpener + 'static,
    D: DelayNs + 'static,
{
    Box::new(move |callback: GetCallback| {
        let result = read_once(&sensor, quantity);
        match &result {
            Ok(value) => log::info!("[ACC] Current {quantity} returned: {value}"),
            Err(e) => log::error!("[ACC] Could not read {quantity}: {e}"),
        }
        callback(result);
    })
}

/// One open, read, close bracket. The session drops on every error path, which
/// releases the bus.
fn read_once<B: BusOpener, D: DelayNs>(
    sensor: &RefCell<Aht10<B, D>>,
    quantity: Quantity,
) -> Result<f32, AccessoryError> {
    let mut sensor = sensor.try_borrow_mut().map_err(|_| AccessoryError::Busy)?;
    let mut session = sensor.open()?;
    let value = match quantity {
        Quantity::Temperature => session.read_temperature()?.celsius(),
        Quantity::RelativeHumidity => session.read_humidity()?.percentage(),
    };
    session.close();
    Ok(value)
}

/// Register the accessory constructor with the hub.
///
/// Every constructed accessory gets a clone of `opener` and a fresh delay from `delay`.
pub fn register<A, B, D, F>(api: &mut A, opener: B, delay: F)
where
    A: Api,
    B: BusOpener + Clone + 'static,
    D: DelayNs + 'static,
    F: Fn() -> D + 'static,
{
    api.register_accessory(
        PLUGIN_IDENTIFIER,
        Box::new(
            move |config: &AccessoryConfig,
                  hap: &A::Hap|
                  -> Result<Box<dyn Accessory<<A::Hap as Hap>::Service>>, AccessoryError> {
                let accessory =
                    TemperatureHumidityAccessory::new(config, hap, opener.clone(), delay())?;
                Ok(Box::new(accessory))
            },
        ),
    );
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction};

    use super::*;
    use crate::hap::AccessoryConstructor;

    const ADDR: u8 = 0x38;
    const GOLDEN: [u8; 5] = [0x1C, 0x19, 0x99, 0x9A, 0x00];

    #[derive(Clone)]
    struct MockOpener {
        i2c: I2cMock,
        opened: Rc<Cell<usize>>,
    }

    impl MockOpener {
        fn new(expectations: &[Transaction]) -> Self {
            Self {
                i2c: I2cMock::new(expectations),
                opened: Rc::new(Cell::new(0)),
            }
        }
    }

    impl BusOpener for MockOpener {
        type Bus = I2cMock;

        fn open(&mut self, _bus: u8) -> Result<I2cMock, ErrorKind> {
            self.opened.set(self.opened.get() + 1);
            Ok(self.i2c.clone())
        }
    }

    #[derive(Clone, Copy, Default)]
    struct NoDelay;

    impl DelayNs for NoDelay {
        fn delay_ns(&mut self, _ns: u32) {}
    }

    #[derive(Default)]
    struct ServiceState {
        characteristics: Vec<(CharacteristicKind, String)>,
        handlers: Vec<(CharacteristicKind, GetHandler)>,
    }

    #[derive(Clone)]
    struct RecordingService {
        kind: ServiceKind,
        name: Option<String>,
        state: Rc<RefCell<ServiceState>>,
    }

    impl Service for RecordingService {
        fn set_characteristic(&mut self, kind: CharacteristicKind, value: &str) {
            self.state
                .borrow_mut()
                .characteristics
                .push((kind, value.to_owned()));
        }

        fn on_get(&mut self, kind: CharacteristicKind, handler: GetHandler) {
            self.state.borrow_mut().handlers.push((kind, handler));
        }
    }

    impl RecordingService {
        fn characteristic(&self, kind: CharacteristicKind) -> Option<String> {
            self.state
                .borrow()
                .characteristics
                .iter()
                .find(|(k, _)| *k == kind)
                .map(|(_, v)| v.clone())
        }

        /// Issue one get request and collect every callback invocation.
        fn get(&self, kind: CharacteristicKind) -> Vec<Result<f32, AccessoryError>> {
            let calls = Rc::new(RefCell::new(Vec::new()));
            let mut state = self.state.borrow_mut();
            let (_, handler) = state
                .handlers
                .iter_mut()
                .find(|(k, _)| *k == kind)
                .expect("characteristic has a get handler");
            let sink = calls.clone();
            handler(Box::new(move |res: Result<f32, AccessoryError>| {
                sink.borrow_mut().push(res)
            }));
            drop(state);
            Rc::try_unwrap(calls).unwrap().into_inner()
        }
    }

    struct RecordingHap;

    impl Hap for RecordingHap {
        type Service = RecordingService;

        fn service(&self, kind: ServiceKind, name: Option<&str>) -> RecordingService {
            RecordingService {
                kind,
                name: name.map(str::to_owned),
                state: Rc::default(),
            }
        }
    }

    #[derive(Default)]
    struct RecordingApi {
        registered: Vec<(&'static str, AccessoryConstructor<RecordingHap>)>,
    }

    impl Api for RecordingApi {
        type Hap = RecordingHap;

        fn hap(&self) -> &RecordingHap {
            &RecordingHap
        }

        fn register_accessory(
            &mut self,
            plugin: &'static str,
            constructor: AccessoryConstructor<RecordingHap>,
        ) {
            self.registered.push((plugin, constructor));
        }
    }

    fn probe() -> Transaction {
        Transaction::read(ADDR, vec![0x18])
    }

    fn read_cycle(frame: [u8; 5]) -> Vec<Transaction> {
        vec![
            Transaction::write(ADDR, vec![0xBA]),
            Transaction::write(ADDR, vec![0xE1, 0x08, 0x00]),
            Transaction::read(ADDR, vec![0x18]),
            Transaction::write(ADDR, vec![0xAC, 0x33, 0x00]),
            Transaction::read(ADDR, vec![0x18]),
            Transaction::write_read(ADDR, vec![0xAC], frame.to_vec()),
        ]
    }

    fn build(
        config: &AccessoryConfig,
        expectations: &[Transaction],
    ) -> (TemperatureHumidityAccessory<RecordingService>, MockOpener) {
        let opener = MockOpener::new(expectations);
        let accessory =
            TemperatureHumidityAccessory::new(config, &RecordingHap, opener.clone(), NoDelay)
                .expect("accessory constructed");
        (accessory, opener)
    }

    #[test]
    fn den_end_to_end() {
        let mut expectations = vec![probe()];
        expectations.extend(read_cycle(GOLDEN));
        let (accessory, mut opener) = build(&AccessoryConfig::new("Den"), &expectations);
        let services = accessory.services();
        assert_eq!(accessory.name(), "Den");

        let calls = services[1].get(CharacteristicKind::CurrentTemperature);
        assert_eq!(calls, vec![Ok(75.0)]);
        assert_eq!(opener.opened.get(), 2);
        opener.i2c.done();
    }

    #[test]
    fn services_and_identity() {
        let (accessory, mut opener) = build(
            &AccessoryConfig::new("Den").with_serial("0042"),
            &[probe()],
        );
        let services = accessory.services();
        let kinds = services.iter().map(|s| s.kind).collect::<Vec<_>>();
        assert_eq!(
            kinds,
            vec![
                ServiceKind::AccessoryInformation,
                ServiceKind::TemperatureSensor,
                ServiceKind::HumiditySensor
            ]
        );
        assert_eq!(services[0].name, None);
        assert_eq!(services[1].name.as_deref(), Some("Den"));
        assert_eq!(services[2].name.as_deref(), Some("Den"));
        let info = &services[0];
        assert_eq!(
            info.characteristic(CharacteristicKind::Manufacturer).as_deref(),
            Some("ASAIR")
        );
        assert_eq!(
            info.characteristic(CharacteristicKind::Model).as_deref(),
            Some("AHT10")
        );
        assert_eq!(
            info.characteristic(CharacteristicKind::SerialNumber).as_deref(),
            Some("0042")
        );
        opener.i2c.done();
    }

    #[test]
    fn each_getter_runs_its_own_bracket() {
        let mut expectations = vec![probe()];
        expectations.extend(read_cycle(GOLDEN));
        expectations.extend(read_cycle([0x1C, 0x80, 0x00, 0x05, 0x00]));
        let (accessory, mut opener) = build(&AccessoryConfig::new("Den"), &expectations);
        let services = accessory.services();

        let temp = services[1].get(CharacteristicKind::CurrentTemperature);
        let hum = services[2].get(CharacteristicKind::CurrentRelativeHumidity);
        assert_eq!(temp, vec![Ok(75.0)]);
        assert_eq!(hum, vec![Ok(50.0)]);
        assert_eq!(opener.opened.get(), 3);
        opener.i2c.done();
    }

    #[test]
    fn read_failure_reaches_callback_once() {
        let mut expectations = vec![probe()];
        expectations.extend([
            Transaction::write(ADDR, vec![0xBA]),
            Transaction::write(ADDR, vec![0xE1, 0x08, 0x00]),
            Transaction::read(ADDR, vec![0x18]),
            Transaction::write(ADDR, vec![0xAC, 0x33, 0x00]).with_error(ErrorKind::Bus),
        ]);
        expectations.extend(read_cycle(GOLDEN));
        let (accessory, mut opener) = build(&AccessoryConfig::new("Den"), &expectations);
        let services = accessory.services();

        let calls = services[1].get(CharacteristicKind::CurrentTemperature);
        assert_eq!(calls, vec![Err(AccessoryError::Bus("Bus".to_owned()))]);
        // the failed bracket released the bus, the next request opens a fresh one
        let calls = services[1].get(CharacteristicKind::CurrentTemperature);
        assert_eq!(calls, vec![Ok(75.0)]);
        assert_eq!(opener.opened.get(), 3);
        opener.i2c.done();
    }

    #[test]
    fn calibration_failure_reaches_callback() {
        let expectations = [
            probe(),
            Transaction::write(ADDR, vec![0xBA]),
            Transaction::write(ADDR, vec![0xE1, 0x08, 0x00]),
            Transaction::read(ADDR, vec![0x10]),
        ];
        let (accessory, mut opener) = build(&AccessoryConfig::new("Den"), &expectations);
        let services = accessory.services();
        let calls = services[2].get(CharacteristicKind::CurrentRelativeHumidity);
        assert_eq!(calls, vec![Err(AccessoryError::Calibration)]);
        opener.i2c.done();
    }

    #[test]
    fn missing_sensor_fails_construction() {
        let nack = ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address);
        let mut opener = MockOpener::new(&[Transaction::read(ADDR, vec![0x00]).with_error(nack)]);
        let res = TemperatureHumidityAccessory::new(
            &AccessoryConfig::new("Den"),
            &RecordingHap,
            opener.clone(),
            NoDelay,
        );
        assert!(matches!(res, Err(AccessoryError::DeviceNotFound)));
        assert_eq!(opener.opened.get(), 1);
        opener.i2c.done();
    }

    #[test]
    fn identify_does_not_touch_the_bus() {
        let (accessory, mut opener) = build(&AccessoryConfig::new("Den"), &[probe()]);
        accessory.identify();
        assert_eq!(opener.opened.get(), 1);
        opener.i2c.done();
    }

    #[test]
    fn register_under_plugin_identifier() {
        let mut expectations = vec![probe()];
        expectations.extend(read_cycle(GOLDEN));
        let mut opener = MockOpener::new(&expectations);
        let mut api = RecordingApi::default();
        register(&mut api, opener.clone(), || NoDelay);
        assert_eq!(api.registered.len(), 1);

        let (plugin, constructor) = &api.registered[0];
        assert_eq!(*plugin, PLUGIN_IDENTIFIER);
        let accessory = constructor(&AccessoryConfig::new("Den"), api.hap()).unwrap();
        let services = accessory.services();
        assert_eq!(services.len(), 3);
        let calls = services[1].get(CharacteristicKind::CurrentTemperature);
        assert_eq!(calls, vec![Ok(75.0)]);
        opener.i2c.done();
    }
}
