//! adb-usb-host
//!
//! Lists USB devices, picks one exposing an ADB interface and performs the
//! ADB connection handshake with it, authenticating with the host's RSA key.

use anyhow::{Context, Result};
use clap::Parser;
use common::{load_private_key, setup_logging};
use host::usb::{AdbUsbDevice, FilterReport, ProbeStatus, filter_devices};
use host::{HostConfig, SessionOutcome, run_handshake, select_device};
use rusb::{Device, UsbContext};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "adb-usb-host")]
#[command(
    author,
    version,
    about = "Find ADB devices on USB and authenticate with one of them"
)]
#[command(long_about = "
Enumerates USB devices, reports which ones expose an ADB interface and runs
the ADB CNXN/AUTH handshake against one of them using the host's RSA key.

EXAMPLES:
    # Authenticate with the first ADB device
    adb-usb-host

    # Only list devices
    adb-usb-host --list-devices

    # Use the device at enumeration index 3 and a specific key
    adb-usb-host --device 3 --key ~/.android/adbkey

CONFIGURATION:
    The host looks for configuration files in the following order:
    1. Path specified with --config
    2. ~/.config/adb-usb-host/host.toml
    3. /etc/adb-usb-host/host.toml
    4. Built-in defaults
")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Save default configuration to default location and exit
    #[arg(long)]
    save_config: bool,

    /// List USB devices and exit
    #[arg(long)]
    list_devices: bool,

    /// Enumeration index of the device to authenticate with
    #[arg(short, long, value_name = "INDEX")]
    device: Option<usize>,

    /// Private key used to sign the AUTH token
    #[arg(short, long, value_name = "PATH")]
    key: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, value_name = "LEVEL")]
    log_level: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.save_config {
        let config = HostConfig::default();
        let path = HostConfig::default_path();
        config.save(&path).context("Failed to save configuration")?;
        println!("Configuration saved to: {}", path.display());
        return Ok(());
    }

    let config = if let Some(ref path) = args.config {
        HostConfig::load(Some(path.clone())).context("Failed to load configuration")?
    } else {
        HostConfig::load_or_default()
    };

    let log_level = args
        .log_level
        .as_deref()
        .unwrap_or(&config.general.log_level);
    setup_logging(log_level).context("Failed to setup logging")?;

    info!("adb-usb-host v{}", env!("CARGO_PKG_VERSION"));

    let usb = rusb::Context::new().context("Failed to initialize libusb")?;
    let devices: Vec<Device<rusb::Context>> = usb
        .devices()
        .context("Failed to enumerate USB devices")?
        .iter()
        .collect();

    println!("Number of devices: {}", devices.len());
    let report = filter_devices(devices);
    print_report(&report);

    if args.list_devices {
        return Ok(());
    }

    let candidate = select_device(&report, args.device)?;

    let key_path = match args.key.clone() {
        Some(path) => path,
        None => config.key_path()?,
    };
    let signer = load_private_key(&key_path)
        .with_context(|| format!("Failed to load ADB key from {}", key_path.display()))?;

    let timeout = config.transfer_timeout();
    let outcome = config.retry_policy().run(|attempt| {
        info!("Handshake with device {} (attempt {})", candidate.index, attempt);
        let mut device = match AdbUsbDevice::open(&candidate.device, candidate.interface, timeout) {
            Ok(device) => device,
            Err(e) => return SessionOutcome::Failed(e),
        };
        let endpoints = device.endpoints();
        run_handshake(&mut device, endpoints, &signer)
    });

    match outcome {
        SessionOutcome::Authenticated(banner) => {
            println!("Authenticated with device {}: {}", candidate.index, banner);
            Ok(())
        }
        SessionOutcome::Failed(e) => {
            warn!("Handshake with device {} failed", candidate.index);
            Err(anyhow::Error::new(e).context(format!(
                "Handshake with device {} failed",
                candidate.index
            )))
        }
    }
}

/// Device listing followed by the ADB-compliant subset
fn print_report<D>(report: &FilterReport<D>) {
    for entry in &report.entries {
        let product = entry.product_label();
        match &entry.status {
            ProbeStatus::Compliant(_) => println!("{}: {} **ADB-compliant", entry.index, product),
            ProbeStatus::NotCompliant => println!("{}: {}", entry.index, product),
            ProbeStatus::Malformed(rejection) => {
                println!("{}: {} (malformed ADB interface: {})", entry.index, product, rejection)
            }
            ProbeStatus::Skipped(reason) => println!("{}: {}", entry.index, reason),
        }
    }

    println!();
    println!("ADB-compliant devices: {}", report.candidates.len());
    for candidate in &report.candidates {
        println!(
            "{}: {} (interface {}, in {:#04x}, out {:#04x})",
            candidate.index,
            candidate.product.as_deref().unwrap_or("(no product string)"),
            candidate.interface.number,
            candidate.interface.endpoints.in_endpoint,
            candidate.interface.endpoints.out_endpoint
        );
    }
}
