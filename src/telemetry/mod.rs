//! # Telemetry Module
//!
//! Synthetic rider state behind the power measurement notifications.
//!
//! The model holds a fixed power and pedal balance and advances the crank
//! counters by a fixed step once per notification period. Both counters are
//! 16-bit and roll over silently, which is what collectors expect from the
//! Cycling Power Measurement characteristic.

use crate::config::TelemetryConfig;
use crate::cps::protocol::CRANK_EVENT_TICKS_PER_SECOND;

/// Synthetic power/cadence state, advanced once per notification period
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelemetryModel {
    /// Instantaneous power in watts
    pub instant_power_watts: i16,

    /// Pedal power balance in 1/2 percent (100 = 50%)
    pub pedal_power_balance: u8,

    /// Cumulative crank revolutions (wraps at 2^16)
    pub cumulative_crank_revolutions: u16,

    /// Time of the last crank event in 1/1024 s (wraps at 2^16)
    pub last_crank_event_time: u16,

    revolutions_per_tick: u16,
    event_ticks_per_tick: u16,
}

impl TelemetryModel {
    /// Create a model with zeroed crank counters
    pub fn new(config: &TelemetryConfig) -> Self {
        Self {
            instant_power_watts: config.instant_power_watts,
            pedal_power_balance: config.pedal_power_balance,
            cumulative_crank_revolutions: 0,
            last_crank_event_time: 0,
            revolutions_per_tick: config.crank_revolutions_per_tick,
            event_ticks_per_tick: config.crank_event_ticks_per_tick,
        }
    }

    /// Advance the crank counters by one period
    ///
    /// With the defaults this is 2 revolutions every 1024 ticks (one second),
    /// i.e. 120 RPM.
    pub fn advance(&mut self) {
        self.cumulative_crank_revolutions = self
            .cumulative_crank_revolutions
            .wrapping_add(self.revolutions_per_tick);
        self.last_crank_event_time = self
            .last_crank_event_time
            .wrapping_add(self.event_ticks_per_tick);
    }

    /// Cadence implied by the per-period step, in RPM
    pub fn cadence_rpm(&self) -> u32 {
        if self.event_ticks_per_tick == 0 {
            return 0;
        }
        self.revolutions_per_tick as u32 * 60 * CRANK_EVENT_TICKS_PER_SECOND
            / self.event_ticks_per_tick as u32
    }
}

impl Default for TelemetryModel {
    fn default() -> Self {
        Self::new(&TelemetryConfig::default())
    }
}
