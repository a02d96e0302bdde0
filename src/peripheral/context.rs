//! Shared peripheral state.
//!
//! One context is created at startup and handed by `Arc` to both the
//! lifecycle (GAP event context) and the notification scheduler.

use std::sync::atomic::{AtomicU32, Ordering};

use super::registry::SubscriptionRegistry;

/// GAP connection handle
pub type ConnHandle = u16;

/// Sentinel stored while no peer is connected (outside the u16 range)
const NO_CONNECTION: u32 = u32::MAX;

#[derive(Debug)]
pub struct PeripheralContext {
    pub subscriptions: SubscriptionRegistry,
    connection: AtomicU32,
}

impl PeripheralContext {
    pub fn new() -> Self {
        Self {
            subscriptions: SubscriptionRegistry::new(),
            connection: AtomicU32::new(NO_CONNECTION),
        }
    }

    /// Handle of the connected peer, if any
    pub fn connection(&self) -> Option<ConnHandle> {
        match self.connection.load(Ordering::Acquire) {
            NO_CONNECTION => None,
            handle => Some(handle as ConnHandle),
        }
    }

    pub fn set_connection(&self, handle: Option<ConnHandle>) {
        let raw = handle.map_or(NO_CONNECTION, u32::from);
        self.connection.store(raw, Ordering::Release);
    }
}

impl Default for PeripheralContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_disconnected() {
        assert_eq!(PeripheralContext::new().connection(), None);
    }

    #[test]
    fn test_set_and_clear_connection() {
        let context = PeripheralContext::new();
        context.set_connection(Some(1));
        assert_eq!(context.connection(), Some(1));

        // Full u16 range is representable
        context.set_connection(Some(u16::MAX));
        assert_eq!(context.connection(), Some(u16::MAX));

        context.set_connection(None);
        assert_eq!(context.connection(), None);
    }
}
