//! # GATT Module
//!
//! The attribute side of the trainer.
//!
//! This module handles:
//! - Service and characteristic definitions (Device Information, Cycling Power, FE-C over BLE)
//! - Value handle bookkeeping after registration
//! - Read/write dispatch for static values and control endpoints

pub mod control;
pub mod server;
pub mod table;
