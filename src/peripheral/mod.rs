//! # Peripheral Module
//!
//! Subscription tracking, connection lifecycle and the notification loop.
//!
//! This module handles:
//! - Per-characteristic subscription flags shared between event and notify contexts
//! - Advertising restarts on disconnect, failed connect and advertising timeout
//! - Periodic Cycling Power Measurement notifications gated on subscription

pub mod context;
pub mod events;
pub mod lifecycle;
pub mod registry;
pub mod scheduler;
