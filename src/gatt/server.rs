//! # GATT Access Dispatch
//!
//! Serves attribute reads and writes routed by the host stack.
//!
//! Device Information strings, the Power Feature bitmask and the Sensor
//! Location are static values. Writes to the two control endpoints go to
//! the [`ControlPointHandler`]. Any other characteristic/access pairing on
//! the Device Information or Cycling Power services means the registered
//! table and this dispatcher disagree, and is treated as fatal.

use bytes::Bytes;
use std::fmt;
use tracing::info;
use uuid::Uuid;

use super::control::{ControlEndpoint, ControlPointHandler};
use super::table::{AttrHandle, Characteristic, Service};
use crate::config::{CpsConfig, DeviceConfig};
use crate::cps::codec::write_u32;
use crate::cps::protocol::CYCLING_POWER_FEATURES;
use crate::peripheral::context::ConnHandle;

/// Kind of attribute access requested by the peer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessOp {
    ReadChr,
    WriteChr,
    ReadDsc,
    WriteDsc,
}

impl AccessOp {
    pub fn as_str(self) -> &'static str {
        match self {
            AccessOp::ReadChr => "READ_CHR",
            AccessOp::WriteChr => "WRITE_CHR",
            AccessOp::ReadDsc => "READ_DSC",
            AccessOp::WriteDsc => "WRITE_DSC",
        }
    }
}

impl fmt::Display for AccessOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attribute access routed by the host
#[derive(Debug, Clone)]
pub struct AccessRequest {
    pub conn: ConnHandle,
    pub attr_handle: AttrHandle,
    pub uuid: Uuid,
    pub op: AccessOp,
    pub payload: Bytes,
}

/// Static values and control endpoints behind the GATT table
#[derive(Debug)]
pub struct GattServer {
    device: DeviceConfig,
    sensor_location: u8,
    control: ControlPointHandler,
}

impl GattServer {
    pub fn new(device: &DeviceConfig, cps: &CpsConfig) -> Self {
        Self {
            device: device.clone(),
            sensor_location: cps.sensor_location,
            control: ControlPointHandler::new(),
        }
    }

    /// Serve one attribute access; the returned bytes are the read value
    /// (empty for writes)
    ///
    /// # Panics
    ///
    /// Panics if the UUID is not part of the table, or the access kind is
    /// not supported by a Device Information or Cycling Power characteristic.
    pub fn access(&self, req: &AccessRequest) -> Bytes {
        let Some(chr) = Characteristic::from_uuid(&req.uuid) else {
            panic!("access to unregistered characteristic {}", req.uuid);
        };

        if chr.service() != Service::DeviceInformation {
            info!(
                "connHandle={} attrHandle={} op={} uuid={} len={}",
                req.conn,
                req.attr_handle,
                req.op,
                chr,
                req.payload.len()
            );
        }

        use Characteristic::*;
        match (chr, req.op) {
            (ManufacturerName, AccessOp::ReadChr) => self.device_string(&self.device.manufacturer),
            (ModelNumber, AccessOp::ReadChr) => self.device_string(&self.device.model_number),
            (SerialNumber, AccessOp::ReadChr) => self.device_string(&self.device.serial_number),
            (HardwareRevision, AccessOp::ReadChr) => {
                self.device_string(&self.device.hardware_revision)
            }
            (FirmwareRevision, AccessOp::ReadChr) => {
                self.device_string(&self.device.firmware_revision)
            }
            (PowerFeature, AccessOp::ReadChr) => power_feature(),
            (SensorLocation, AccessOp::ReadChr) => Bytes::copy_from_slice(&[self.sensor_location]),
            (ControlPoint, AccessOp::WriteChr) => {
                self.control
                    .on_write(ControlEndpoint::CpsControlPoint, req.conn, &req.payload);
                Bytes::new()
            }
            (FecWrite, AccessOp::WriteChr) => {
                self.control
                    .on_write(ControlEndpoint::FecCommand, req.conn, &req.payload);
                Bytes::new()
            }
            // The FE-C service accepts anything else silently
            (FecNotify | FecWrite, _) => Bytes::new(),
            (chr, op) => panic!(
                "unsupported {} on characteristic {} (attr_handle={})",
                op, chr, req.attr_handle
            ),
        }
    }

    fn device_string(&self, value: &str) -> Bytes {
        Bytes::copy_from_slice(value.as_bytes())
    }
}

fn power_feature() -> Bytes {
    let mut value = [0u8; 4];
    write_u32(&mut value, 0, CYCLING_POWER_FEATURES);
    Bytes::copy_from_slice(&value)
}
