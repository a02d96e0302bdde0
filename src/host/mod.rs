//! # BLE Host Module
//!
//! Boundary to the BLE host stack that owns the radio, the attribute
//! database and ATT dispatch.
//!
//! This module handles:
//! - The capability surface consumed by the peripheral (`BleHost`)
//! - Advertising payload construction
//! - An in-process loopback host that logs every call and can play a
//!   collector that connects and subscribes to Power Measurement

pub mod advertising;
pub mod host_trait;

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use tokio::sync::mpsc;
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};

use crate::cps::codec::format_payload;
use crate::cps::measurement::CpmFrame;
use crate::error::{Result, TrainerSimError};
use crate::gatt::server::{AccessOp, AccessRequest, GattServer};
use crate::gatt::table::{AttrHandle, AttributeHandles, Characteristic, Service};
use crate::peripheral::context::ConnHandle;
use crate::peripheral::events::GapEvent;
use advertising::AdvertiseParams;
use host_trait::BleHost;

/// Connection handle used by the simulated collector
pub const SIMULATED_CONN_HANDLE: ConnHandle = 1;

/// ATT MTU negotiated by the simulated collector
pub const SIMULATED_MTU: u16 = 247;

/// Assign attribute handles in registration order
///
/// Each service takes one handle for its declaration; each characteristic
/// takes a declaration and a value handle, plus a CCCD handle when it can
/// notify or indicate. Returns the value handle of every characteristic.
pub fn assign_handles() -> Vec<(Characteristic, AttrHandle)> {
    let mut next: AttrHandle = 1;
    let mut value_handles = Vec::with_capacity(Characteristic::ALL.len());

    for service in Service::ALL {
        info!("registered service {} with handle={}", service.uuid(), next);
        next += 1;

        for chr in service.characteristics() {
            let def_handle = next;
            let val_handle = next + 1;
            next += 2;
            info!(
                "registering characteristic {} with def_handle={} val_handle={}",
                chr, def_handle, val_handle
            );

            if chr.properties().has_cccd() {
                info!("registering descriptor 0x2902 with handle={}", next);
                next += 1;
            }
            value_handles.push((chr, val_handle));
        }
    }

    value_handles
}

struct Registration {
    server: Arc<GattServer>,
    value_handles: Vec<(Characteristic, AttrHandle)>,
}

struct SimulatedPeer {
    events: mpsc::Sender<GapEvent>,
    connect_delay: Duration,
}

/// Host stand-in that runs entirely in process
pub struct LoopbackHost {
    registration: OnceLock<Registration>,
    advertising: Arc<AtomicBool>,
    peer: Option<SimulatedPeer>,
}

impl LoopbackHost {
    pub fn new() -> Self {
        Self {
            registration: OnceLock::new(),
            advertising: Arc::new(AtomicBool::new(false)),
            peer: None,
        }
    }

    /// Attach a simulated collector that connects `connect_delay` after
    /// each advertising start, delivering its GAP events to `events`
    pub fn with_simulated_peer(mut self, events: mpsc::Sender<GapEvent>, connect_delay: Duration) -> Self {
        self.peer = Some(SimulatedPeer {
            events,
            connect_delay,
        });
        self
    }

    pub fn is_advertising(&self) -> bool {
        self.advertising.load(Ordering::Acquire)
    }

    fn spawn_peer(&self, peer: &SimulatedPeer, registration: &Registration) -> Result<()> {
        let handles = AttributeHandles::from_registered(&registration.value_handles)?;
        let server = Arc::clone(&registration.server);
        let events = peer.events.clone();
        let advertising = Arc::clone(&self.advertising);
        let delay = peer.connect_delay;

        tokio::spawn(async move {
            sleep(delay).await;
            advertising.store(false, Ordering::Release);

            let conn = SIMULATED_CONN_HANDLE;
            let script = [
                GapEvent::Connect { handle: conn, status: 0 },
                GapEvent::MtuExchanged { handle: conn, mtu: SIMULATED_MTU },
            ];
            for event in script {
                if events.send(event).await.is_err() {
                    return;
                }
            }

            // A collector reads the static characteristics before subscribing
            for chr in Characteristic::ALL {
                if !chr.properties().read {
                    continue;
                }
                let value = server.access(&AccessRequest {
                    conn,
                    attr_handle: 0,
                    uuid: chr.uuid(),
                    op: AccessOp::ReadChr,
                    payload: Bytes::new(),
                });
                debug!("peer read {}: {{ {} }}", chr, format_payload(&value));
            }

            let subscribe = GapEvent::Subscribe {
                handle: conn,
                attr_handle: handles.power_measurement,
                notify: true,
                indicate: false,
            };
            if events.send(subscribe).await.is_err() {
                warn!("simulated peer could not subscribe: event channel closed");
            }
        });

        Ok(())
    }
}

impl Default for LoopbackHost {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BleHost for LoopbackHost {
    async fn register_services(
        &self,
        server: Arc<GattServer>,
    ) -> Result<Vec<(Characteristic, AttrHandle)>> {
        let value_handles = assign_handles();
        self.registration
            .set(Registration {
                server,
                value_handles: value_handles.clone(),
            })
            .map_err(|_| TrainerSimError::Host("services already registered".to_string()))?;
        Ok(value_handles)
    }

    async fn advertise_start(&self, params: &AdvertiseParams) -> Result<()> {
        let data = params.advertising_data()?;

        if self.advertising.swap(true, Ordering::AcqRel) {
            return Err(TrainerSimError::Host("advertising already in progress".to_string()));
        }
        debug!("advertising data: {{ {} }}", format_payload(&data));

        if let Some(peer) = &self.peer {
            let registration = self.registration.get().ok_or_else(|| {
                TrainerSimError::Host("advertising before services were registered".to_string())
            })?;
            self.spawn_peer(peer, registration)?;
        }

        Ok(())
    }

    async fn send_notification(
        &self,
        conn: ConnHandle,
        attr_handle: AttrHandle,
        payload: Bytes,
    ) -> Result<()> {
        match CpmFrame::decode(&payload) {
            Ok(frame) => debug!(
                "notify conn={} attr_handle={}: {} W, {} revs @ {}",
                conn,
                attr_handle,
                frame.instantaneous_power,
                frame.cumulative_crank_revolutions,
                frame.last_crank_event_time
            ),
            Err(_) => debug!(
                "notify conn={} attr_handle={}: {{ {} }}",
                conn,
                attr_handle,
                format_payload(&payload)
            ),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AdvertisingConfig, CpsConfig, DeviceConfig};

    fn server() -> Arc<GattServer> {
        Arc::new(GattServer::new(&DeviceConfig::default(), &CpsConfig::default()))
    }

    fn params() -> AdvertiseParams {
        AdvertiseParams::new(&DeviceConfig::default(), &AdvertisingConfig::default())
    }

    #[test]
    fn test_assign_handles_layout() {
        let handles = assign_handles();
        assert_eq!(handles.len(), 12);

        // Device Information: service 1, five read characteristics (decl + value)
        assert_eq!(handles[0], (Characteristic::ManufacturerName, 3));
        assert_eq!(handles[4], (Characteristic::FirmwareRevision, 11));

        // Cycling Power: service 12, measurement value 14 with CCCD 15
        assert_eq!(handles[5], (Characteristic::PowerMeasurement, 14));
        assert_eq!(handles[6], (Characteristic::PowerFeature, 17));
        assert_eq!(handles[7], (Characteristic::SensorLocation, 19));
        assert_eq!(handles[8], (Characteristic::PowerVector, 21));
        assert_eq!(handles[9], (Characteristic::ControlPoint, 24));

        // FE-C: service 26
        assert_eq!(handles[10], (Characteristic::FecNotify, 28));
        assert_eq!(handles[11], (Characteristic::FecWrite, 31));
    }

    #[tokio::test]
    async fn test_register_twice_fails() {
        let host = LoopbackHost::new();
        assert!(host.register_services(server()).await.is_ok());
        assert!(matches!(
            host.register_services(server()).await,
            Err(TrainerSimError::Host(_))
        ));
    }

    #[tokio::test]
    async fn test_advertise_while_advertising_fails() {
        let host = LoopbackHost::new();
        tokio_test::assert_ok!(host.advertise_start(&params()).await);
        assert!(host.is_advertising());
        tokio_test::assert_err!(host.advertise_start(&params()).await);
    }

    #[tokio::test]
    async fn test_notification_always_accepted() {
        let host = LoopbackHost::new();
        let payload = Bytes::from_static(&[0x23, 0x00, 0xE1, 0x00, 0x64, 0x02, 0x00, 0x00, 0x04]);
        tokio_test::assert_ok!(host.send_notification(1, 14, payload).await);
        tokio_test::assert_ok!(host.send_notification(1, 21, Bytes::from_static(&[0x01])).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulated_peer_connects_and_subscribes() {
        let (events_tx, mut events_rx) = mpsc::channel(8);
        let host = LoopbackHost::new().with_simulated_peer(events_tx, Duration::from_millis(2000));

        let registered = host.register_services(server()).await.unwrap();
        let handles = AttributeHandles::from_registered(&registered).unwrap();
        host.advertise_start(&params()).await.unwrap();

        assert_eq!(
            events_rx.recv().await,
            Some(GapEvent::Connect { handle: 1, status: 0 })
        );
        assert!(!host.is_advertising());
        assert_eq!(
            events_rx.recv().await,
            Some(GapEvent::MtuExchanged { handle: 1, mtu: 247 })
        );
        assert_eq!(
            events_rx.recv().await,
            Some(GapEvent::Subscribe {
                handle: 1,
                attr_handle: handles.power_measurement,
                notify: true,
                indicate: false,
            })
        );
    }

    #[tokio::test]
    async fn test_simulated_peer_requires_registration() {
        let (events_tx, _events_rx) = mpsc::channel(8);
        let host = LoopbackHost::new().with_simulated_peer(events_tx, Duration::ZERO);
        assert!(host.advertise_start(&params()).await.is_err());
    }
}
