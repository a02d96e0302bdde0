//! # Connection Lifecycle
//!
//! Reacts to GAP events: keeps the peripheral discoverable whenever no peer
//! is connected, records the connection handle, and applies CCCD writes to
//! the subscription registry.
//!
//! ```text
//!   Advertising --connect ok--> Connected
//!   Advertising --connect failed / adv complete--> Advertising (restart)
//!   Connected   --disconnect--> Advertising (restart)
//! ```
//!
//! Subscriptions survive a disconnect; a reconnecting peer writes its CCCDs
//! again and overwrites them.

use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use super::context::{ConnHandle, PeripheralContext};
use super::events::GapEvent;
use crate::gatt::table::AttributeHandles;
use crate::host::advertising::AdvertiseParams;
use crate::host::host_trait::BleHost;

/// Link state of the peripheral
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Advertising,
    Connected(ConnHandle),
}

pub struct ConnectionLifecycle {
    host: Arc<dyn BleHost>,
    context: Arc<PeripheralContext>,
    handles: AttributeHandles,
    params: AdvertiseParams,
    state: LinkState,
}

impl ConnectionLifecycle {
    pub fn new(
        host: Arc<dyn BleHost>,
        context: Arc<PeripheralContext>,
        handles: AttributeHandles,
        params: AdvertiseParams,
    ) -> Self {
        Self {
            host,
            context,
            handles,
            params,
            state: LinkState::Advertising,
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Enter the initial advertising state
    pub async fn start(&mut self) {
        self.state = LinkState::Advertising;
        self.advertise().await;
    }

    /// Apply one GAP event
    pub async fn handle_event(&mut self, event: GapEvent) {
        match (self.state, event) {
            (LinkState::Advertising, GapEvent::Connect { handle, status: 0 }) => {
                info!("connection established; conn_handle={}", handle);
                self.context.set_connection(Some(handle));
                self.state = LinkState::Connected(handle);
            }
            (LinkState::Advertising, GapEvent::Connect { status, .. }) => {
                info!("connection failed; status={}", status);
                self.advertise().await;
            }
            (LinkState::Connected(current), GapEvent::Connect { handle, status }) => {
                warn!(
                    "ignoring connect event (conn_handle={}, status={}) while connected to {}",
                    handle, status, current
                );
            }
            (LinkState::Connected(current), GapEvent::Disconnect { handle, reason }) => {
                if handle != current {
                    warn!("disconnect for conn_handle={} while connected to {}", handle, current);
                }
                info!("disconnect; reason={}", reason);
                self.context.set_connection(None);
                self.state = LinkState::Advertising;
                self.advertise().await;
            }
            (LinkState::Advertising, GapEvent::Disconnect { handle, reason }) => {
                warn!("disconnect without connection; conn_handle={} reason={}", handle, reason);
            }
            (LinkState::Advertising, GapEvent::AdvertiseComplete { reason }) => {
                info!("adv complete; reason={}", reason);
                self.advertise().await;
            }
            (LinkState::Connected(_), GapEvent::AdvertiseComplete { reason }) => {
                debug!("adv complete while connected; reason={}", reason);
            }
            (
                LinkState::Connected(_),
                GapEvent::Subscribe { attr_handle, notify, indicate, .. },
            ) => {
                info!(
                    "SUBSCRIBE: cur_notify={} cur_indicate={} attr_handle={}",
                    notify, indicate, attr_handle
                );
                match self.handles.notify_slot(attr_handle) {
                    Some(slot) => self.context.subscriptions.set_subscribed(slot, notify),
                    None => debug!("no subscription slot for attr_handle={}", attr_handle),
                }
            }
            (LinkState::Advertising, GapEvent::Subscribe { attr_handle, .. }) => {
                warn!("ignoring subscribe for attr_handle={} without connection", attr_handle);
            }
            (_, GapEvent::MtuExchanged { handle, mtu }) => {
                info!("mtu update event; conn_handle={} mtu={}", handle, mtu);
            }
        }
    }

    /// Process events until the channel closes or `shutdown` changes
    pub async fn run(
        mut self,
        mut events: mpsc::Receiver<GapEvent>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => self.handle_event(event).await,
                    None => {
                        info!("GAP event channel closed");
                        break;
                    }
                },
                _ = shutdown.changed() => {
                    info!("Connection lifecycle stopping");
                    break;
                }
            }
        }
    }

    async fn advertise(&self) {
        match self.host.advertise_start(&self.params).await {
            Ok(()) => info!(
                "advertising as '{}' (service 0x{:04x})",
                self.params.device_name, self.params.service_uuid16
            ),
            Err(e) => error!("error enabling advertisement: {}", e),
        }
    }
}
