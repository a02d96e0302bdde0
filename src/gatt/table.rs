//! # GATT Table
//!
//! The services and characteristics exposed by the trainer, as typed data.
//! The host stack registers this table and reports the value handle it
//! assigned to each characteristic.

use std::fmt;
use uuid::Uuid;

use crate::cps::protocol::*;
use crate::error::{Result, TrainerSimError};
use crate::peripheral::registry::NotifyCharacteristic;

/// ATT attribute handle
pub type AttrHandle = u16;

/// Primary services of the trainer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    DeviceInformation,
    CyclingPower,
    FecOverBle,
}

impl Service {
    /// Services in registration order
    pub const ALL: [Service; 3] = [
        Service::DeviceInformation,
        Service::CyclingPower,
        Service::FecOverBle,
    ];

    pub fn uuid(self) -> Uuid {
        match self {
            Service::DeviceInformation => uuid16(DEVICE_INFO_SERVICE),
            Service::CyclingPower => uuid16(CYCLING_POWER_SERVICE),
            Service::FecOverBle => FEC_SERVICE_UUID,
        }
    }

    /// Characteristics of this service in registration order
    pub fn characteristics(self) -> impl Iterator<Item = Characteristic> {
        Characteristic::ALL
            .into_iter()
            .filter(move |chr| chr.service() == self)
    }
}

/// Every characteristic the trainer exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Characteristic {
    ManufacturerName,
    ModelNumber,
    SerialNumber,
    HardwareRevision,
    FirmwareRevision,
    PowerMeasurement,
    PowerFeature,
    SensorLocation,
    PowerVector,
    ControlPoint,
    FecNotify,
    FecWrite,
}

impl Characteristic {
    pub const ALL: [Characteristic; 12] = [
        Characteristic::ManufacturerName,
        Characteristic::ModelNumber,
        Characteristic::SerialNumber,
        Characteristic::HardwareRevision,
        Characteristic::FirmwareRevision,
        Characteristic::PowerMeasurement,
        Characteristic::PowerFeature,
        Characteristic::SensorLocation,
        Characteristic::PowerVector,
        Characteristic::ControlPoint,
        Characteristic::FecNotify,
        Characteristic::FecWrite,
    ];

    pub fn service(self) -> Service {
        use Characteristic::*;
        match self {
            ManufacturerName | ModelNumber | SerialNumber | HardwareRevision
            | FirmwareRevision => Service::DeviceInformation,
            PowerMeasurement | PowerFeature | SensorLocation | PowerVector | ControlPoint => {
                Service::CyclingPower
            }
            FecNotify | FecWrite => Service::FecOverBle,
        }
    }

    pub fn uuid(self) -> Uuid {
        use Characteristic::*;
        match self {
            ManufacturerName => uuid16(MANUFACTURER_NAME),
            ModelNumber => uuid16(MODEL_NUMBER),
            SerialNumber => uuid16(SERIAL_NUMBER),
            HardwareRevision => uuid16(HARDWARE_REVISION),
            FirmwareRevision => uuid16(FIRMWARE_REVISION),
            PowerMeasurement => uuid16(CYCLING_POWER_MEASUREMENT),
            PowerFeature => uuid16(CYCLING_POWER_FEATURE),
            SensorLocation => uuid16(SENSOR_LOCATION),
            PowerVector => uuid16(CYCLING_POWER_VECTOR),
            ControlPoint => uuid16(CYCLING_POWER_CONTROL_POINT),
            FecNotify => FEC_NOTIFY_UUID,
            FecWrite => FEC_WRITE_UUID,
        }
    }

    pub fn properties(self) -> Properties {
        use Characteristic::*;
        match self {
            ManufacturerName | ModelNumber | SerialNumber | HardwareRevision
            | FirmwareRevision | PowerFeature | SensorLocation => Properties::READ,
            PowerMeasurement | PowerVector | FecNotify => Properties::NOTIFY,
            ControlPoint => Properties::WRITE_INDICATE,
            FecWrite => Properties::WRITE,
        }
    }

    /// Subscription slot for notify-capable characteristics
    pub fn notify_slot(self) -> Option<NotifyCharacteristic> {
        match self {
            Characteristic::PowerMeasurement => Some(NotifyCharacteristic::PowerMeasurement),
            Characteristic::PowerVector => Some(NotifyCharacteristic::PowerVector),
            Characteristic::FecNotify => Some(NotifyCharacteristic::FecNotify),
            _ => None,
        }
    }

    pub fn from_uuid(uuid: &Uuid) -> Option<Self> {
        Self::ALL.into_iter().find(|chr| chr.uuid() == *uuid)
    }
}

impl fmt::Display for Characteristic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match short_uuid(&self.uuid()) {
            Some(short) => write!(f, "0x{:04x}", short),
            None => write!(f, "{}", self.uuid()),
        }
    }
}

/// Characteristic properties
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Properties {
    pub read: bool,
    pub write: bool,
    pub notify: bool,
    pub indicate: bool,
}

impl Properties {
    pub const READ: Properties = Properties { read: true, write: false, notify: false, indicate: false };
    pub const WRITE: Properties = Properties { read: false, write: true, notify: false, indicate: false };
    pub const NOTIFY: Properties = Properties { read: false, write: false, notify: true, indicate: false };
    pub const WRITE_INDICATE: Properties = Properties { read: false, write: true, notify: false, indicate: true };

    /// Whether the characteristic carries a Client Characteristic Configuration descriptor
    pub fn has_cccd(self) -> bool {
        self.notify || self.indicate
    }
}

/// Value handles of the characteristics the core addresses by handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeHandles {
    pub power_measurement: AttrHandle,
    pub power_vector: AttrHandle,
    pub fec_notify: AttrHandle,
    pub fec_write: AttrHandle,
}

impl AttributeHandles {
    /// Build the handle table from the value handles reported at registration
    ///
    /// # Errors
    ///
    /// Returns error if one of the addressed characteristics was not registered
    pub fn from_registered(registered: &[(Characteristic, AttrHandle)]) -> Result<Self> {
        let lookup = |wanted: Characteristic| {
            registered
                .iter()
                .find(|(chr, _)| *chr == wanted)
                .map(|(_, handle)| *handle)
                .ok_or_else(|| {
                    TrainerSimError::Protocol(format!("Characteristic {} was not registered", wanted))
                })
        };

        Ok(Self {
            power_measurement: lookup(Characteristic::PowerMeasurement)?,
            power_vector: lookup(Characteristic::PowerVector)?,
            fec_notify: lookup(Characteristic::FecNotify)?,
            fec_write: lookup(Characteristic::FecWrite)?,
        })
    }

    /// Map a subscribed attribute handle to its subscription slot
    pub fn notify_slot(&self, attr_handle: AttrHandle) -> Option<NotifyCharacteristic> {
        if attr_handle == self.power_measurement {
            Some(NotifyCharacteristic::PowerMeasurement)
        } else if attr_handle == self.power_vector {
            Some(NotifyCharacteristic::PowerVector)
        } else if attr_handle == self.fec_notify {
            Some(NotifyCharacteristic::FecNotify)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_layout() {
        let dis: Vec<_> = Service::DeviceInformation.characteristics().collect();
        assert_eq!(dis.len(), 5);
        assert!(dis.iter().all(|chr| chr.properties() == Properties::READ));

        let cps: Vec<_> = Service::CyclingPower.characteristics().collect();
        assert_eq!(
            cps,
            vec![
                Characteristic::PowerMeasurement,
                Characteristic::PowerFeature,
                Characteristic::SensorLocation,
                Characteristic::PowerVector,
                Characteristic::ControlPoint,
            ]
        );

        let fec: Vec<_> = Service::FecOverBle.characteristics().collect();
        assert_eq!(fec, vec![Characteristic::FecNotify, Characteristic::FecWrite]);
    }

    #[test]
    fn test_uuid_lookup() {
        for chr in Characteristic::ALL {
            assert_eq!(Characteristic::from_uuid(&chr.uuid()), Some(chr));
        }
        assert_eq!(Characteristic::from_uuid(&uuid16(0x2A37)), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Characteristic::PowerMeasurement.to_string(), "0x2a63");
        assert_eq!(
            Characteristic::FecWrite.to_string(),
            "6e40fec3-b5a3-f393-e0a9-e50e24dcca9e"
        );
    }

    #[test]
    fn test_control_point_is_write_indicate() {
        let props = Characteristic::ControlPoint.properties();
        assert!(props.write && props.indicate);
        assert!(!props.read && !props.notify);
        assert!(props.has_cccd());
        assert!(!Characteristic::FecWrite.properties().has_cccd());
    }

    #[test]
    fn test_notify_slots() {
        let slots: Vec<_> = Characteristic::ALL
            .into_iter()
            .filter_map(Characteristic::notify_slot)
            .collect();
        assert_eq!(
            slots,
            vec![
                NotifyCharacteristic::PowerMeasurement,
                NotifyCharacteristic::PowerVector,
                NotifyCharacteristic::FecNotify,
            ]
        );
    }

    #[test]
    fn test_handles_from_registered() {
        let registered = [
            (Characteristic::PowerMeasurement, 12),
            (Characteristic::PowerVector, 19),
            (Characteristic::FecNotify, 27),
            (Characteristic::FecWrite, 30),
        ];
        let handles = AttributeHandles::from_registered(&registered).unwrap();
        assert_eq!(handles.power_measurement, 12);
        assert_eq!(handles.notify_slot(19), Some(NotifyCharacteristic::PowerVector));
        assert_eq!(handles.notify_slot(27), Some(NotifyCharacteristic::FecNotify));
        assert_eq!(handles.notify_slot(30), None);
    }

    #[test]
    fn test_handles_missing_characteristic() {
        let registered = [(Characteristic::PowerMeasurement, 12)];
        match AttributeHandles::from_registered(&registered) {
            Err(TrainerSimError::Protocol(msg)) => assert!(msg.contains("0x2a64")),
            other => panic!("Expected Protocol error, got: {:?}", other),
        }
    }
}
