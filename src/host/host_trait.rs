//! Trait abstraction for the BLE host stack capabilities to enable testing

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;

use super::advertising::AdvertiseParams;
use crate::error::Result;
use crate::gatt::server::GattServer;
use crate::gatt::table::{AttrHandle, Characteristic};
use crate::peripheral::context::ConnHandle;

/// Capabilities consumed from the BLE host stack
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BleHost: Send + Sync {
    /// Register the GATT table and route attribute accesses to `server`
    ///
    /// Returns the value handle assigned to every characteristic.
    async fn register_services(
        &self,
        server: Arc<GattServer>,
    ) -> Result<Vec<(Characteristic, AttrHandle)>>;

    /// Start connectable undirected advertising
    async fn advertise_start(&self, params: &AdvertiseParams) -> Result<()>;

    /// Send a notification to the connected peer
    async fn send_notification(
        &self,
        conn: ConnHandle,
        attr_handle: AttrHandle,
        payload: Bytes,
    ) -> Result<()>;
}

#[cfg(test)]
pub mod mocks {
    use super::*;
    use crate::error::TrainerSimError;
    use std::sync::Mutex;

    /// Notification captured by [`RecordingHost`]
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct SentNotification {
        pub conn: ConnHandle,
        pub attr_handle: AttrHandle,
        pub payload: Vec<u8>,
    }

    /// Host that records every call
    #[derive(Clone, Default)]
    pub struct RecordingHost {
        pub advertisements: Arc<Mutex<Vec<AdvertiseParams>>>,
        pub notifications: Arc<Mutex<Vec<SentNotification>>>,
        pub notify_error: Arc<Mutex<Option<fn() -> TrainerSimError>>>,
        pub advertise_error: Arc<Mutex<bool>>,
    }

    impl RecordingHost {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn advertise_count(&self) -> usize {
            self.advertisements.lock().unwrap().len()
        }

        pub fn get_notifications(&self) -> Vec<SentNotification> {
            self.notifications.lock().unwrap().clone()
        }

        pub fn set_notify_error(&self, error: Option<fn() -> TrainerSimError>) {
            *self.notify_error.lock().unwrap() = error;
        }

        pub fn set_advertise_error(&self, fail: bool) {
            *self.advertise_error.lock().unwrap() = fail;
        }
    }

    #[async_trait]
    impl BleHost for RecordingHost {
        async fn register_services(
            &self,
            _server: Arc<GattServer>,
        ) -> Result<Vec<(Characteristic, AttrHandle)>> {
            Ok(Characteristic::ALL
                .into_iter()
                .zip(1..)
                .collect())
        }

        async fn advertise_start(&self, params: &AdvertiseParams) -> Result<()> {
            self.advertisements.lock().unwrap().push(params.clone());
            if *self.advertise_error.lock().unwrap() {
                return Err(TrainerSimError::Host("Mock advertise error".to_string()));
            }
            Ok(())
        }

        async fn send_notification(
            &self,
            conn: ConnHandle,
            attr_handle: AttrHandle,
            payload: Bytes,
        ) -> Result<()> {
            if let Some(error) = *self.notify_error.lock().unwrap() {
                return Err(error());
            }
            self.notifications.lock().unwrap().push(SentNotification {
                conn,
                attr_handle,
                payload: payload.to_vec(),
            });
            Ok(())
        }
    }
}
