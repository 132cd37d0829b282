//! # GDL90 Bridge
//!
//! Stream flight simulator position and traffic to EFB apps over GDL-90.
//!
//! Sends a Heartbeat, an Ownship Report and Traffic Reports over UDP so that
//! ForeFlight, Garmin Pilot and similar apps show the simulated aircraft as
//! if a portable ADS-B receiver were connected.

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::{info, warn};

use gdl90_bridge::bridge::Bridge;
use gdl90_bridge::capture::CaptureWriter;
use gdl90_bridge::config::Config;
use gdl90_bridge::gdl90::encoder::Gdl90Encoder;
use gdl90_bridge::logging;
use gdl90_bridge::telemetry::SimulatedFlight;
use gdl90_bridge::transport::UdpTransport;

/// Configuration file used when none is given on the command line
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Pick the configuration path from the command line arguments
///
/// The first argument after the program name wins.
fn config_path<I>(mut args: I) -> Option<PathBuf>
where
    I: Iterator<Item = String>,
{
    args.nth(1).map(PathBuf::from)
}

/// Load the explicit configuration, or the default file when present
///
/// Returns the configuration and whether built-in defaults were used.
fn load_config(explicit: Option<PathBuf>) -> Result<(Config, bool)> {
    match explicit {
        Some(path) => {
            let config = Config::load(&path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            Ok((config, false))
        }
        None if std::path::Path::new(DEFAULT_CONFIG_PATH).exists() => {
            let config = Config::load(DEFAULT_CONFIG_PATH)
                .with_context(|| format!("Failed to load configuration from {}", DEFAULT_CONFIG_PATH))?;
            Ok((config, false))
        }
        None => Ok((Config::default(), true)),
    }
}

/// Main entry point for GDL90 Bridge
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Load configuration (first argument, else `config/default.toml`)
///    - Set up logging with tracing subscriber
///    - Open the UDP transport and the simulated flight source
///
/// 2. **Main Loop**
///    - Heartbeat, Ownship and Traffic schedules at the configured rates
///    - Handle Ctrl+C for graceful shutdown
///
/// 3. **Graceful Shutdown**
///    - Log totals and exit
///
/// # Errors
///
/// Returns error if:
/// - The configuration file is unreadable or invalid
/// - The target address is invalid or the socket cannot be opened
/// - The capture file cannot be created
///
/// # Examples
///
/// ```bash
/// cargo run --release -- config/default.toml
/// ```
///
/// Expected output:
/// ```text
/// INFO gdl90_bridge: GDL90 Bridge v0.1.0 starting...
/// INFO gdl90_bridge::transport: UDP transport ready, sending to 192.168.1.100:4000 (broadcast on)
/// INFO gdl90_bridge::bridge: Starting GDL-90 output: heartbeat 1Hz, ownship 2Hz, traffic 2Hz
/// ```
#[tokio::main]
async fn main() -> Result<()> {
    let (config, defaults_used) = load_config(config_path(std::env::args()))?;

    let _log_guard = logging::init(&config.debug)?;

    info!("GDL90 Bridge v{} starting...", env!("CARGO_PKG_VERSION"));
    if defaults_used {
        warn!("{} not found, using built-in defaults", DEFAULT_CONFIG_PATH);
    }

    let transport = UdpTransport::open(&config.network).await?;
    let source = SimulatedFlight::new(&config);

    info!(
        "Ownship {} (ICAO 0x{:06X}, {}), {} traffic targets",
        config.ownship.callsign,
        config.ownship.icao_address,
        config.ownship.emitter().name(),
        source.traffic_count()
    );

    let mut bridge = Bridge::new(Gdl90Encoder::new(), transport, source, &config.rates)
        .with_message_logging(config.debug.log_messages);

    let capture_file = config.debug.capture_file.trim();
    if !capture_file.is_empty() {
        let capture = CaptureWriter::open(capture_file)
            .with_context(|| format!("Failed to open capture file {}", capture_file))?;
        info!("Capturing GDL-90 frames to {}", capture.path().display());
        bridge = bridge.with_capture(capture);
    }

    info!("Press Ctrl+C to exit");

    let stats = bridge
        .run(async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("Received Ctrl+C, shutting down..."),
                Err(e) => warn!("Failed to listen for Ctrl+C: {}", e),
            }
        })
        .await;

    info!(
        "Total sent: {} heartbeats, {} ownship reports, {} traffic reports ({} send errors)",
        stats.heartbeats_sent,
        stats.ownship_reports_sent,
        stats.traffic_reports_sent,
        stats.send_errors
    );
    if stats.frames_captured > 0 {
        info!("Captured {} frames", stats.frames_captured);
    }

    Ok(())
}
