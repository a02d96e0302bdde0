//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::cps::protocol::{PEDAL_BALANCE_MAX, SENSOR_LOCATION_MAX, SENSOR_LOCATION_REAR_HUB};
use crate::error::{Result, TrainerSimError};

/// Longest device name that still fits the advertising payload next to
/// the flags, TX power level and 16-bit service UUID list
pub const MAX_DEVICE_NAME_LEN: usize = 19;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
    #[serde(default)]
    pub cps: CpsConfig,
    #[serde(default)]
    pub advertising: AdvertisingConfig,
    #[serde(default)]
    pub host: HostConfig,
}

/// Device identity (advertised name and Device Information strings)
#[derive(Debug, Deserialize, Clone)]
pub struct DeviceConfig {
    #[serde(default = "default_device_name")]
    pub name: String,

    #[serde(default = "default_manufacturer")]
    pub manufacturer: String,

    #[serde(default = "default_model_number")]
    pub model_number: String,

    #[serde(default = "default_serial_number")]
    pub serial_number: String,

    #[serde(default = "default_hardware_revision")]
    pub hardware_revision: String,

    #[serde(default = "default_firmware_revision")]
    pub firmware_revision: String,
}

/// Synthetic telemetry configuration
#[derive(Debug, Deserialize, Clone)]
pub struct TelemetryConfig {
    #[serde(default = "default_instant_power_watts")]
    pub instant_power_watts: i16,

    #[serde(default = "default_pedal_power_balance")]
    pub pedal_power_balance: u8,

    #[serde(default = "default_crank_revolutions_per_tick")]
    pub crank_revolutions_per_tick: u16,

    #[serde(default = "default_crank_event_ticks_per_tick")]
    pub crank_event_ticks_per_tick: u16,
}

/// Notification scheduler configuration
#[derive(Debug, Deserialize, Clone)]
pub struct NotifyConfig {
    #[serde(default = "default_period_ms")]
    pub period_ms: u64,

    #[serde(default = "default_log_frames")]
    pub log_frames: bool,
}

/// Cycling Power Service configuration
#[derive(Debug, Deserialize, Clone)]
pub struct CpsConfig {
    #[serde(default = "default_sensor_location")]
    pub sensor_location: u8,
}

/// Advertising configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AdvertisingConfig {
    #[serde(default = "default_include_tx_power")]
    pub include_tx_power: bool,

    #[serde(default = "default_tx_power_dbm")]
    pub tx_power_dbm: i8,
}

/// Loopback host configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HostConfig {
    #[serde(default = "default_simulated_peer")]
    pub simulated_peer: bool,

    #[serde(default = "default_peer_connect_delay_ms")]
    pub peer_connect_delay_ms: u64,
}

// Default value functions
fn default_device_name() -> String { "TACX FLUX2 NNNN".to_string() }
fn default_manufacturer() -> String { "Garmin/Tacx".to_string() }
fn default_model_number() -> String { "FLUX 2".to_string() }
fn default_serial_number() -> String { "1234567890".to_string() }
fn default_hardware_revision() -> String { "1".to_string() }
fn default_firmware_revision() -> String { "0.0.0".to_string() }

fn default_instant_power_watts() -> i16 { 225 }
fn default_pedal_power_balance() -> u8 { 100 }
fn default_crank_revolutions_per_tick() -> u16 { 2 }
fn default_crank_event_ticks_per_tick() -> u16 { 1024 }

fn default_period_ms() -> u64 { 1000 }
fn default_log_frames() -> bool { true }

fn default_sensor_location() -> u8 { SENSOR_LOCATION_REAR_HUB }

fn default_include_tx_power() -> bool { true }
fn default_tx_power_dbm() -> i8 { 0 }

fn default_simulated_peer() -> bool { true }
fn default_peer_connect_delay_ms() -> u64 { 2000 }

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            name: default_device_name(),
            manufacturer: default_manufacturer(),
            model_number: default_model_number(),
            serial_number: default_serial_number(),
            hardware_revision: default_hardware_revision(),
            firmware_revision: default_firmware_revision(),
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            instant_power_watts: default_instant_power_watts(),
            pedal_power_balance: default_pedal_power_balance(),
            crank_revolutions_per_tick: default_crank_revolutions_per_tick(),
            crank_event_ticks_per_tick: default_crank_event_ticks_per_tick(),
        }
    }
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            period_ms: default_period_ms(),
            log_frames: default_log_frames(),
        }
    }
}

impl Default for CpsConfig {
    fn default() -> Self {
        Self {
            sensor_location: default_sensor_location(),
        }
    }
}

impl Default for AdvertisingConfig {
    fn default() -> Self {
        Self {
            include_tx_power: default_include_tx_power(),
            tx_power_dbm: default_tx_power_dbm(),
        }
    }
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            simulated_peer: default_simulated_peer(),
            peer_connect_delay_ms: default_peer_connect_delay_ms(),
        }
    }
}

fn invalid(message: impl std::fmt::Display) -> TrainerSimError {
    TrainerSimError::Config(toml::de::Error::custom(message))
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use trainer_sim::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        // Validate device identity
        if self.device.name.is_empty() {
            return Err(invalid("device name cannot be empty"));
        }

        if self.device.name.len() > MAX_DEVICE_NAME_LEN {
            return Err(invalid(format!(
                "device name must be at most {} bytes to fit the advertisement",
                MAX_DEVICE_NAME_LEN
            )));
        }

        for (name, value) in [
            ("manufacturer", &self.device.manufacturer),
            ("model_number", &self.device.model_number),
            ("serial_number", &self.device.serial_number),
            ("hardware_revision", &self.device.hardware_revision),
            ("firmware_revision", &self.device.firmware_revision),
        ] {
            if value.is_empty() {
                return Err(invalid(format!("{} cannot be empty", name)));
            }
        }

        // Validate telemetry
        if self.telemetry.pedal_power_balance > PEDAL_BALANCE_MAX {
            return Err(invalid("pedal_power_balance must be between 0 and 200"));
        }

        if self.telemetry.crank_revolutions_per_tick == 0 {
            return Err(invalid("crank_revolutions_per_tick must be greater than 0"));
        }

        if self.telemetry.crank_event_ticks_per_tick == 0 {
            return Err(invalid("crank_event_ticks_per_tick must be greater than 0"));
        }

        // Validate timing fields
        if self.notify.period_ms == 0 || self.notify.period_ms > 60000 {
            return Err(invalid("period_ms must be between 1 and 60000"));
        }

        if self.host.peer_connect_delay_ms > 60000 {
            return Err(invalid("peer_connect_delay_ms must be at most 60000"));
        }

        if self.cps.sensor_location > SENSOR_LOCATION_MAX {
            return Err(invalid("sensor_location must be between 0 and 16"));
        }

        if self.advertising.tx_power_dbm > 20 {
            return Err(invalid("tx_power_dbm must be between -127 and 20"));
        }

        Ok(())
    }
}
