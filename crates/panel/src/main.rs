//! HID Control Panel
//!
//! Interactive terminal panel for HID-class devices: scan and select a
//! device, send raw hex command frames, and watch asynchronously pushed
//! frames arrive in the session log.

mod config;
mod tui;

use anyhow::{Context, Result};
use backend::spawn_worker;
use clap::Parser;
use session::{EventBridge, create_backend_bridge, setup_logging};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "hidpanel")]
#[command(author, version, about = "HID Control Panel - raw command console for HID devices")]
#[command(long_about = "
An interactive terminal control panel for HID-class devices. Scan the
device catalog, select a device, and exchange raw report frames with it.
Commands are whitespace-separated hex bytes (e.g. \"00 C0 0A 00 00\").

EXAMPLES:
    # Run the interactive panel
    hidpanel

    # List matching devices and exit
    hidpanel --list

    # Run with custom config
    hidpanel --config /path/to/config.toml

    # Run with debug logging
    hidpanel --log-level debug

CONFIGURATION:
    The panel looks for configuration files in the following order:
    1. Path specified with --config
    2. ~/.config/hidpanel/config.toml
    3. /etc/hidpanel/config.toml
    4. Built-in defaults
")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, value_name = "PATH")]
    config: Option<std::path::PathBuf>,

    /// Save default configuration to default location and exit
    #[arg(long)]
    save_config: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Scan once, print the device catalog, and exit
    #[arg(long)]
    list: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Handle --save-config flag early (before loading config)
    if args.save_config {
        let config = config::PanelConfig::default();
        let path = config::PanelConfig::default_path();
        config.save(&path).context("Failed to save configuration")?;
        println!("Configuration saved to: {}", path.display());
        return Ok(());
    }

    // Load configuration first (to get log level from config if not specified)
    let config = if let Some(ref path) = args.config {
        config::PanelConfig::load(Some(path.clone())).context("Failed to load configuration")?
    } else {
        config::PanelConfig::load_or_default()
    };

    // Use CLI log level if specified, otherwise use config value
    let log_level = args.log_level.as_deref().unwrap_or(&config.panel.log_level);

    setup_logging(log_level).context("Failed to setup logging")?;

    info!("hidpanel v{}", env!("CARGO_PKG_VERSION"));
    info!("Log level: {}", log_level);

    // Start the backend worker thread behind the channel boundary
    let (mut bridge, worker) = create_backend_bridge();
    let worker_handle = spawn_worker(worker, config.worker_config());

    let events = bridge
        .take_events()
        .context("Push-event receiver already taken")?;
    let bridge = Arc::new(bridge);

    let result = if args.list {
        list_devices(&bridge).await
    } else {
        tui::run(bridge.clone(), EventBridge::new(events)).await
    };

    // Shut the worker down regardless of how the panel exited
    info!("Shutting down backend worker...");
    if let Err(e) = bridge.shutdown().await {
        warn!("Failed to signal worker shutdown: {}", e);
    }
    if worker_handle.join().is_err() {
        warn!("Backend worker thread panicked");
    }

    result
}

/// One-shot scan: print the catalog to stdout and return
async fn list_devices(bridge: &session::BackendBridge) -> Result<()> {
    let devices = bridge
        .scan_devices()
        .await
        .context("Failed to scan devices")?;

    if devices.is_empty() {
        println!("No devices found");
        return Ok(());
    }

    println!("Found {} device(s):", devices.len());
    for device in &devices {
        println!(
            "  {}:{} {} (usage page {:#06x}, interface {})",
            device.vendor_id,
            device.product_id,
            device.label(),
            device.usage_page,
            device.interface_number
        );
        println!("    path: {}", device.path);
    }

    Ok(())
}
