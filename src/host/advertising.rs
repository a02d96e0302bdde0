//! # Advertising Payload
//!
//! Builds the legacy advertising data (AD structures) announcing the trainer:
//! flags, optional TX power level, complete local name and the complete list
//! of 16-bit service UUIDs.

use bytes::{BufMut, Bytes, BytesMut};

use crate::config::{AdvertisingConfig, DeviceConfig};
use crate::cps::protocol::CYCLING_POWER_SERVICE;
use crate::error::{Result, TrainerSimError};

/// Legacy advertising payload limit
pub const MAX_ADV_DATA_LEN: usize = 31;

/// AD type: flags
pub const AD_TYPE_FLAGS: u8 = 0x01;

/// AD type: complete list of 16-bit service UUIDs
pub const AD_TYPE_UUID16_COMPLETE: u8 = 0x03;

/// AD type: complete local name
pub const AD_TYPE_NAME_COMPLETE: u8 = 0x09;

/// AD type: TX power level
pub const AD_TYPE_TX_POWER: u8 = 0x0A;

/// LE General Discoverable Mode
pub const ADV_FLAG_GENERAL_DISCOVERABLE: u8 = 0x02;

/// BR/EDR Not Supported
pub const ADV_FLAG_BREDR_UNSUPPORTED: u8 = 0x04;

/// Parameters handed to the host when (re)starting advertising
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvertiseParams {
    pub device_name: String,
    pub service_uuid16: u16,
    pub connectable_undirected: bool,
    pub tx_power_dbm: Option<i8>,
}

impl AdvertiseParams {
    pub fn new(device: &DeviceConfig, advertising: &AdvertisingConfig) -> Self {
        Self {
            device_name: device.name.clone(),
            service_uuid16: CYCLING_POWER_SERVICE,
            connectable_undirected: true,
            tx_power_dbm: advertising
                .include_tx_power
                .then_some(advertising.tx_power_dbm),
        }
    }

    /// Encode the advertising data
    ///
    /// # Errors
    ///
    /// Returns error if the AD structures exceed the 31-byte legacy limit
    pub fn advertising_data(&self) -> Result<Bytes> {
        let mut data = BytesMut::with_capacity(MAX_ADV_DATA_LEN);

        data.put_u8(2);
        data.put_u8(AD_TYPE_FLAGS);
        data.put_u8(ADV_FLAG_GENERAL_DISCOVERABLE | ADV_FLAG_BREDR_UNSUPPORTED);

        if let Some(tx_power) = self.tx_power_dbm {
            data.put_u8(2);
            data.put_u8(AD_TYPE_TX_POWER);
            data.put_i8(tx_power);
        }

        let name = self.device_name.as_bytes();
        if name.len() > MAX_ADV_DATA_LEN {
            return Err(TrainerSimError::Protocol(format!(
                "Device name of {} bytes cannot be advertised",
                name.len()
            )));
        }
        data.put_u8(name.len() as u8 + 1);
        data.put_u8(AD_TYPE_NAME_COMPLETE);
        data.put_slice(name);

        data.put_u8(3);
        data.put_u8(AD_TYPE_UUID16_COMPLETE);
        data.put_u16_le(self.service_uuid16);

        if data.len() > MAX_ADV_DATA_LEN {
            return Err(TrainerSimError::Protocol(format!(
                "Advertising data is {} bytes, limit is {}",
                data.len(),
                MAX_ADV_DATA_LEN
            )));
        }

        Ok(data.freeze())
    }
}
