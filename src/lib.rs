//! # Trainer Sim Library
//!
//! Emulate a Bluetooth LE cycling power smart trainer.
//!
//! This library provides the peripheral core of the emulator: the Cycling
//! Power Measurement codec, the synthetic telemetry behind it, subscription
//! tracking and the connection/advertising lifecycle. The BLE host stack is
//! reached through the [`host::host_trait::BleHost`] trait.

pub mod config;
pub mod error;
pub mod cps;
pub mod gatt;
pub mod host;
pub mod peripheral;
pub mod telemetry;
