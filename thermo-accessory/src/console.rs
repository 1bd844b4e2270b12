use std::{cell::RefCell, collections::HashMap, rc::Rc};

use thermo_accessory::{
    AccessoryConfig, AccessoryError,
    hap::{
        Accessory, AccessoryConstructor, Api, CharacteristicKind, GetHandler, Hap, Service,
        ServiceKind,
    },
};

#[derive(Default)]
struct ServiceEntry {
    characteristics: Vec<(CharacteristicKind, String)>,
    handlers: Vec<(CharacteristicKind, GetHandler)>,
}

#[derive(Clone)]
/// A service that logs whatever the hub would publish.
pub struct ConsoleService {
    kind: ServiceKind,
    name: Option<String>,
    entry: Rc<RefCell<ServiceEntry>>,
}

impl Service for ConsoleService {
    fn set_characteristic(&mut self, kind: CharacteristicKind, value: &str) {
        self.entry
            .borrow_mut()
            .characteristics
            .push((kind, value.to_owned()));
    }

    fn on_get(&mut self, kind: CharacteristicKind, handler: GetHandler) {
        self.entry.borrow_mut().handlers.push((kind, handler));
    }
}

impl ConsoleService {
    /// Log the fixed characteristics.
    pub fn describe(&self) {
        let label = self.name.as_deref().unwrap_or("-");
        for (kind, value) in self.entry.borrow().characteristics.iter() {
            log::info!("[HUB] {:?} ({label}): {kind:?} = {value}", self.kind);
        }
    }

    /// Issue a get request on every characteristic with a handler.
    pub fn poll(&self) {
        let label = self.name.clone().unwrap_or_default();
        let service = self.kind;
        for (kind, handler) in self.entry.borrow_mut().handlers.iter_mut() {
            let (kind, label) = (*kind, label.clone());
            handler(Box::new(move |res: Result<f32, AccessoryError>| match res {
                Ok(value) => log::info!("[HUB] {service:?} ({label}): {kind:?} = {value:.2}"),
                Err(e) => log::warn!("[HUB] {service:?} ({label}): {kind:?} failed: {e}"),
            }));
        }
    }
}

/// Service constructors of the console hub.
pub struct ConsoleHap;

impl Hap for ConsoleHap {
    type Service = ConsoleService;

    fn service(&self, kind: ServiceKind, name: Option<&str>) -> ConsoleService {
        ConsoleService {
            kind,
            name: name.map(str::to_owned),
            entry: Rc::default(),
        }
    }
}

/// A minimal in-process hub.
pub struct ConsoleHub {
    hap: ConsoleHap,
    plugins: HashMap<&'static str, AccessoryConstructor<ConsoleHap>>,
}

impl Default for ConsoleHub {
    fn default() -> Self {
        Self {
            hap: ConsoleHap,
            plugins: HashMap::new(),
        }
    }
}

impl Api for ConsoleHub {
    type Hap = ConsoleHap;

    fn hap(&self) -> &ConsoleHap {
        &self.hap
    }

    fn register_accessory(
        &mut self,
        plugin: &'static str,
        constructor: AccessoryConstructor<ConsoleHap>,
    ) {
        log::info!("[HUB] Registered plugin {plugin}");
        self.plugins.insert(plugin, constructor);
    }
}

impl ConsoleHub {
    /// Construct an accessory from a registered plugin.
    pub fn accessory(
        &self,
        plugin: &str,
        config: &AccessoryConfig,
    ) -> Option<Result<Box<dyn Accessory<ConsoleService>>, AccessoryError>> {
        self.plugins
            .get(plugin)
            .map(|constructor| constructor(config, &self.hap))
    }
}
