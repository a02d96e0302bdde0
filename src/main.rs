//! # Trainer Sim
//!
//! Emulate a Bluetooth LE cycling power smart trainer.
//!
//! Advertises as a Tacx FLUX 2, exposes Device Information, Cycling Power and
//! FE-C over BLE services, and pushes a Cycling Power Measurement every period
//! to a subscribed collector.

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::time::Duration;
use tracing::info;

use trainer_sim::config::Config;
use trainer_sim::gatt::server::GattServer;
use trainer_sim::gatt::table::AttributeHandles;
use trainer_sim::host::advertising::AdvertiseParams;
use trainer_sim::host::host_trait::BleHost;
use trainer_sim::host::LoopbackHost;
use trainer_sim::peripheral::context::PeripheralContext;
use trainer_sim::peripheral::lifecycle::ConnectionLifecycle;
use trainer_sim::peripheral::scheduler::NotificationScheduler;
use trainer_sim::telemetry::TelemetryModel;

/// Environment variable naming the configuration file
const CONFIG_ENV_VAR: &str = "TRAINER_SIM_CONFIG";

/// Configuration file used when the environment variable is unset
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Capacity of the GAP event channel between host and lifecycle
const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Main entry point for Trainer Sim
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Set up logging with tracing subscriber
///    - Load configuration
///    - Register the GATT table with the host and resolve value handles
///
/// 2. **Run**
///    - Start advertising and process GAP events
///    - Notify Cycling Power Measurements once per period
///    - Handle Ctrl+C for graceful shutdown
///
/// # Errors
///
/// Returns error if the configuration is invalid or the host rejects
/// service registration.
#[tokio::main]
async fn main() -> Result<()> {
    let (writer, _log_guard) = tracing_appender::non_blocking(std::io::stdout());
    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Trainer Sim v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = load_config()?;

    let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    let mut loopback = LoopbackHost::new();
    if config.host.simulated_peer {
        loopback = loopback.with_simulated_peer(
            events_tx.clone(),
            Duration::from_millis(config.host.peer_connect_delay_ms),
        );
    }
    let host: Arc<dyn BleHost> = Arc::new(loopback);

    let server = Arc::new(GattServer::new(&config.device, &config.cps));
    let registered = host
        .register_services(server)
        .await
        .context("registering GATT services")?;
    let handles = AttributeHandles::from_registered(&registered)?;
    info!(
        "cpsCpmHandle={} cpsPwrVecHandle={} fec2ChrHandle={} fec3ChrHandle={}",
        handles.power_measurement, handles.power_vector, handles.fec_notify, handles.fec_write
    );

    let context = Arc::new(PeripheralContext::new());
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let scheduler = NotificationScheduler::new(
        Arc::clone(&host),
        Arc::clone(&context),
        handles.power_measurement,
        TelemetryModel::new(&config.telemetry),
        &config.notify,
    );
    let scheduler_task = tokio::spawn(scheduler.run(shutdown_rx.clone()));

    let mut lifecycle = ConnectionLifecycle::new(
        Arc::clone(&host),
        Arc::clone(&context),
        handles,
        AdvertiseParams::new(&config.device, &config.advertising),
    );
    lifecycle.start().await;
    let lifecycle_task = tokio::spawn(lifecycle.run(events_rx, shutdown_rx));

    info!("Press Ctrl+C to exit");
    tokio::signal::ctrl_c().await?;
    info!("Received Ctrl+C, shutting down...");

    drop(events_tx);
    // Both loops may already have exited if the event channel closed
    let _ = shutdown_tx.send(true);

    let stats = scheduler_task.await?;
    lifecycle_task.await?;
    info!("Total power measurements sent: {}", stats.sent);

    Ok(())
}

/// Load configuration from `$TRAINER_SIM_CONFIG`, then `config/default.toml`,
/// then built-in defaults
fn load_config() -> Result<Config> {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        info!("Loading configuration from {}", path);
        return Config::load(&path).with_context(|| format!("loading configuration from {}", path));
    }

    if Path::new(DEFAULT_CONFIG_PATH).exists() {
        info!("Loading configuration from {}", DEFAULT_CONFIG_PATH);
        return Config::load(DEFAULT_CONFIG_PATH)
            .with_context(|| format!("loading configuration from {}", DEFAULT_CONFIG_PATH));
    }

    info!("No configuration file found, using defaults");
    Ok(Config::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_locations() {
        assert_eq!(CONFIG_ENV_VAR, "TRAINER_SIM_CONFIG");
        assert_eq!(DEFAULT_CONFIG_PATH, "config/default.toml");
    }

    #[test]
    fn test_shipped_config_is_valid() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join(DEFAULT_CONFIG_PATH);
        let config = Config::load(path).unwrap();
        assert_eq!(config.device.name, "TACX FLUX2 NNNN");
        assert_eq!(config.notify.period_ms, 1000);
    }
}
