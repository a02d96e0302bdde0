//! # Cycling Power Module
//!
//! Wire format of the Cycling Power Service.
//!
//! This module handles:
//! - Little-endian field access at payload offsets
//! - Service, characteristic and feature constants
//! - Cycling Power Measurement frame encoding

pub mod codec;
pub mod measurement;
pub mod protocol;
