//! # ANTS Driver
//!
//! Telemetry monitor for the ISIS dual-redundant antenna deployment system.
//!
//! Polls deployment status and temperature over I2C and records them as
//! JSONL telemetry. It never arms or deploys the antennas.

use anyhow::Result;
use std::path::Path;
use tokio::time::{interval, Duration};
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

use ants_driver::config::{Config, LoggingConfig};
use ants_driver::controller::AntennaController;
use ants_driver::telemetry::TelemetryWriter;
use ants_driver::transport::EmbeddedHalBus;

/// Configuration file read at startup when present
const CONFIG_PATH: &str = "config/default.toml";

/// File name prefix for daily-rolled log files
const LOG_FILE_PREFIX: &str = "ants-driver.log";

/// Main entry point for the antenna telemetry monitor
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Load configuration (defaults when no file is present)
///    - Set up logging with tracing subscriber
///    - Open the I2C bus and bring up the configured microcontroller
///
/// 2. **Main Loop**
///    - Every `poll_interval_ms`, read status and temperature
///    - Log the snapshot and append it to the telemetry file
///    - Handle Ctrl+C for graceful shutdown
///
/// # Errors
///
/// Returns error if:
/// - The configuration file is invalid
/// - The I2C device cannot be opened
/// - The microcontroller cannot be reset
#[tokio::main]
async fn main() -> Result<()> {
    let config = if Path::new(CONFIG_PATH).exists() {
        Config::load(CONFIG_PATH)?
    } else {
        Config::default()
    };

    let _log_guard = init_logging(&config.logging);

    info!("ANTS driver v{} starting...", env!("CARGO_PKG_VERSION"));

    let bus = EmbeddedHalBus::open(&config.bus.device_path, config.bus.primary_address)?;
    let mut antennas = AntennaController::new(bus, config.addresses());
    antennas
        .select_microcontroller(config.default_microcontroller()?)
        .await?;

    let mut telemetry = if config.telemetry.enabled {
        Some(TelemetryWriter::new(
            &config.telemetry.log_dir,
            config.telemetry.max_records_per_file,
            config.telemetry.max_files_to_keep,
        )?)
    } else {
        None
    };

    let mut poll = interval(Duration::from_millis(config.telemetry.poll_interval_ms));

    info!("Polling antenna system every {} ms", config.telemetry.poll_interval_ms);
    info!("Press Ctrl+C to exit");

    let mut samples: u64 = 0;

    loop {
        tokio::select! {
            _ = poll.tick() => {
                let record = match antennas.snapshot().await {
                    Ok(record) => record,
                    Err(e) => {
                        warn!("Telemetry poll failed: {}", e);
                        continue;
                    }
                };

                info!(
                    "Status 0x{:04X}, armed: {}, temperature: {} DegC",
                    record.status_code, record.status.armed, record.temperature_c
                );
                debug!("{}", record.status);

                if let Some(writer) = telemetry.as_mut() {
                    if let Err(e) = writer.write(&record) {
                        warn!("Failed to write telemetry: {}", e);
                    }
                }
                samples += 1;
            }

            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                info!("Total samples taken: {}", samples);
                break;
            }
        }
    }

    Ok(())
}

/// Install the tracing subscriber
///
/// `RUST_LOG` overrides the configured level. The returned guard flushes
/// the file writer and must be kept alive until exit.
fn init_logging(logging: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));

    match &logging.directory {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (file_writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stdout.and(file_writer))
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_path_constant() {
        assert_eq!(CONFIG_PATH, "config/default.toml");
    }

    #[test]
    fn test_shipped_config_is_valid() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join(CONFIG_PATH);
        let config = Config::load(path).unwrap();
        assert_eq!(config.bus.primary_address, 0x31);
        assert_eq!(config.bus.secondary_address, 0x32);
    }
}
