use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::{Duration, Instant},
};

use clap::Parser;
use linux_embedded_hal::Delay;
use thermo_accessory::{AccessoryConfig, LinuxBus, PLUGIN_IDENTIFIER};

mod console;

use console::ConsoleHub;

/// Host an AHT10 accessory in a console hub and poll its characteristics.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Accessory name
    #[arg(short, long, default_value = "AHT10")]
    name: String,
    /// Manufacturer shown in the information service
    #[arg(long)]
    manufacturer: Option<String>,
    /// Model shown in the information service
    #[arg(long)]
    model: Option<String>,
    /// Serial number shown in the information service
    #[arg(long)]
    serial: Option<String>,
    /// I2C bus number (e.g., 1 for /dev/i2c-1)
    #[arg(short, long, default_value_t = 1)]
    bus: u8,
    /// Seconds between two polls
    #[arg(short, long, default_value_t = 5)]
    interval: u64,
    /// Number of polls, runs until Ctrl+C if not given
    #[arg(short, long)]
    count: Option<u64>,
}

impl From<&Args> for AccessoryConfig {
    fn from(args: &Args) -> Self {
        AccessoryConfig {
            name: args.name.clone(),
            manufacturer: args.manufacturer.clone(),
            model: args.model.clone(),
            serial: args.serial.clone(),
            bus: Some(args.bus),
        }
    }
}

fn main() {
    // Initialize the logger
    env_logger::init();
    // Parse command line arguments
    let args = Args::parse();
    log::info!("Arguments: {args:#?}");
    let running = Arc::new(AtomicBool::new(true));
    {
        let running = running.clone();
        if let Err(e) = ctrlc::set_handler(move || {
            log::info!("Received Ctrl+C, stopping...");
            running.store(false, Ordering::Relaxed);
        }) {
            log::error!("Error setting Ctrl-C handler: {e}");
            std::process::exit(1);
        }
    }

    let mut hub = ConsoleHub::default();
    thermo_accessory::register(&mut hub, LinuxBus, || Delay);
    let config = AccessoryConfig::from(&args);
    let accessory = match hub.accessory(PLUGIN_IDENTIFIER, &config) {
        Some(Ok(accessory)) => accessory,
        Some(Err(e)) => {
            log::error!("[HUB] Could not create accessory on bus {}: {e}", config.bus());
            std::process::exit(1);
        }
        None => {
            log::error!("[HUB] Plugin {PLUGIN_IDENTIFIER} is not registered");
            std::process::exit(1);
        }
    };
    accessory.identify();
    let services = accessory.services();
    for service in services.iter() {
        service.describe();
    }

    let interval = Duration::from_secs(args.interval);
    let mut polls = 0;
    while running.load(Ordering::Relaxed) {
        let start = Instant::now();
        for service in services.iter() {
            service.poll();
        }
        polls += 1;
        if args.count.is_some_and(|count| polls >= count) {
            break;
        }
        while running.load(Ordering::Relaxed) && start.elapsed() < interval {
            let left = interval.saturating_sub(start.elapsed());
            thread::sleep(Duration::from_millis(100).min(left));
        }
    }
    log::info!("[HUB] Exiting after {polls} polls.");
}
