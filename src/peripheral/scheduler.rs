//! # Notification Scheduler
//!
//! Fixed-period loop that advances the telemetry model and pushes a Cycling
//! Power Measurement to the subscribed peer.
//!
//! The period is measured from tick start to tick start: after each tick the
//! loop sleeps for `period - elapsed`, or not at all when the tick overran.
//! A failed notification is logged and dropped; the next tick is the retry.

use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{sleep, Duration, Instant};
use tracing::{debug, info, warn};

use super::context::PeripheralContext;
use super::registry::NotifyCharacteristic;
use crate::config::NotifyConfig;
use crate::cps::codec::format_payload;
use crate::cps::measurement::encode_measurement;
use crate::error::TrainerSimError;
use crate::gatt::table::AttrHandle;
use crate::host::host_trait::BleHost;
use crate::telemetry::TelemetryModel;

/// Result of a single tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The measurement was handed to the host
    Sent,
    /// No subscription or no connection
    Suppressed,
    /// The host rejected the notification
    Failed,
}

/// Tick counters, returned when the loop stops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NotifyStats {
    pub sent: u64,
    pub suppressed: u64,
    pub failed: u64,
}

impl NotifyStats {
    fn record(&mut self, outcome: TickOutcome) {
        match outcome {
            TickOutcome::Sent => self.sent += 1,
            TickOutcome::Suppressed => self.suppressed += 1,
            TickOutcome::Failed => self.failed += 1,
        }
    }
}

/// Delay before the next tick given how long the current one took
pub fn next_delay(period: Duration, elapsed: Duration) -> Duration {
    period.saturating_sub(elapsed)
}

pub struct NotificationScheduler {
    host: Arc<dyn BleHost>,
    context: Arc<PeripheralContext>,
    measurement_handle: AttrHandle,
    model: TelemetryModel,
    period: Duration,
    log_frames: bool,
    started: Instant,
    stats: NotifyStats,
}

impl NotificationScheduler {
    pub fn new(
        host: Arc<dyn BleHost>,
        context: Arc<PeripheralContext>,
        measurement_handle: AttrHandle,
        model: TelemetryModel,
        config: &NotifyConfig,
    ) -> Self {
        Self {
            host,
            context,
            measurement_handle,
            model,
            period: Duration::from_millis(config.period_ms),
            log_frames: config.log_frames,
            started: Instant::now(),
            stats: NotifyStats::default(),
        }
    }

    pub fn model(&self) -> &TelemetryModel {
        &self.model
    }

    pub fn stats(&self) -> NotifyStats {
        self.stats
    }

    /// Run one period: advance the model, encode, and notify if the peer
    /// is connected and subscribed to Power Measurement
    pub async fn tick(&mut self) -> TickOutcome {
        self.model.advance();
        let payload = encode_measurement(&self.model);

        let subscribed = self
            .context
            .subscriptions
            .is_subscribed(NotifyCharacteristic::PowerMeasurement);

        let outcome = match (subscribed, self.context.connection()) {
            (true, Some(conn)) => {
                if self.log_frames {
                    info!(
                        "ts: {} cpsCpmNotify: {{ {} }}",
                        self.started.elapsed().as_millis(),
                        format_payload(&payload)
                    );
                }

                match self
                    .host
                    .send_notification(conn, self.measurement_handle, payload)
                    .await
                {
                    Ok(()) => TickOutcome::Sent,
                    Err(TrainerSimError::BufferExhausted) => {
                        warn!("No buffer for power measurement, skipping tick");
                        TickOutcome::Failed
                    }
                    Err(e) => {
                        warn!("Failed to send power measurement: {}", e);
                        TickOutcome::Failed
                    }
                }
            }
            (subscribed, conn) => {
                debug!(
                    "Power measurement suppressed (subscribed={}, connection={:?})",
                    subscribed, conn
                );
                TickOutcome::Suppressed
            }
        };

        self.stats.record(outcome);
        outcome
    }

    /// Tick every period until `shutdown` changes or its sender is dropped
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> NotifyStats {
        info!(
            "Starting power measurement loop ({} ms period, {} RPM, {} W)",
            self.period.as_millis(),
            self.model.cadence_rpm(),
            self.model.instant_power_watts
        );

        loop {
            let start = Instant::now();
            self.tick().await;
            let delay = next_delay(self.period, start.elapsed());

            tokio::select! {
                _ = sleep(delay) => {}
                _ = shutdown.changed() => {
                    info!("Notification loop stopping");
                    break;
                }
            }
        }

        info!(
            "Power measurements sent: {}, suppressed: {}, failed: {}",
            self.stats.sent, self.stats.suppressed, self.stats.failed
        );
        self.stats
    }
}
