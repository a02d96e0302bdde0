//! Per-characteristic notification subscriptions.
//!
//! Written from the GAP event context, read by the notification scheduler
//! on every tick. Each flag is an atomic so a subscribe event is never
//! observed half-applied.

use std::sync::atomic::{AtomicBool, Ordering};

/// Notify-capable characteristics a collector can subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotifyCharacteristic {
    PowerMeasurement,
    PowerVector,
    FecNotify,
}

impl NotifyCharacteristic {
    pub const ALL: [NotifyCharacteristic; 3] = [
        NotifyCharacteristic::PowerMeasurement,
        NotifyCharacteristic::PowerVector,
        NotifyCharacteristic::FecNotify,
    ];

    fn slot(self) -> usize {
        match self {
            NotifyCharacteristic::PowerMeasurement => 0,
            NotifyCharacteristic::PowerVector => 1,
            NotifyCharacteristic::FecNotify => 2,
        }
    }
}

/// Subscription flags, all cleared at startup
#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    flags: [AtomicBool; 3],
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_subscribed(&self, characteristic: NotifyCharacteristic, enabled: bool) {
        self.flags[characteristic.slot()].store(enabled, Ordering::Release);
    }

    pub fn is_subscribed(&self, characteristic: NotifyCharacteristic) -> bool {
        self.flags[characteristic.slot()].load(Ordering::Acquire)
    }

    /// Current state of every slot, for logging
    pub fn snapshot(&self) -> [(NotifyCharacteristic, bool); 3] {
        NotifyCharacteristic::ALL.map(|chr| (chr, self.is_subscribed(chr)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_defaults_to_unsubscribed() {
        let registry = SubscriptionRegistry::new();
        for chr in NotifyCharacteristic::ALL {
            assert!(!registry.is_subscribed(chr));
        }
    }

    #[test]
    fn test_slots_are_independent() {
        let registry = SubscriptionRegistry::new();
        registry.set_subscribed(NotifyCharacteristic::PowerVector, true);

        assert!(registry.is_subscribed(NotifyCharacteristic::PowerVector));
        assert!(!registry.is_subscribed(NotifyCharacteristic::PowerMeasurement));
        assert!(!registry.is_subscribed(NotifyCharacteristic::FecNotify));

        registry.set_subscribed(NotifyCharacteristic::PowerVector, false);
        assert!(!registry.is_subscribed(NotifyCharacteristic::PowerVector));
    }

    #[test]
    fn test_snapshot() {
        let registry = SubscriptionRegistry::new();
        registry.set_subscribed(NotifyCharacteristic::FecNotify, true);
        assert_eq!(
            registry.snapshot(),
            [
                (NotifyCharacteristic::PowerMeasurement, false),
                (NotifyCharacteristic::PowerVector, false),
                (NotifyCharacteristic::FecNotify, true),
            ]
        );
    }

    #[test]
    fn test_visible_across_threads() {
        let registry = Arc::new(SubscriptionRegistry::new());
        let writer = Arc::clone(&registry);

        std::thread::spawn(move || {
            writer.set_subscribed(NotifyCharacteristic::PowerMeasurement, true);
        })
        .join()
        .unwrap();

        assert!(registry.is_subscribed(NotifyCharacteristic::PowerMeasurement));
    }
}
