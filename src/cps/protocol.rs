//! # Cycling Power Service Constants and Types
//!
//! Assigned numbers and bit definitions for the Cycling Power Service (CPS),
//! the Device Information Service and the Tacx FE-C over BLE service.

use uuid::Uuid;

/// Bluetooth base UUID (`0000xxxx-0000-1000-8000-00805f9b34fb`)
const BLUETOOTH_BASE_UUID: u128 = 0x0000_0000_0000_1000_8000_0080_5f9b_34fb;

/// Expand a 16-bit SIG-assigned number to its full 128-bit UUID
pub const fn uuid16(short: u16) -> Uuid {
    Uuid::from_u128(BLUETOOTH_BASE_UUID | ((short as u128) << 96))
}

/// Recover the 16-bit assigned number from a UUID built on the Bluetooth base
pub fn short_uuid(uuid: &Uuid) -> Option<u16> {
    let value = uuid.as_u128();
    let short = ((value >> 96) & 0xFFFF) as u16;
    (value & !(0xFFFF_u128 << 96) == BLUETOOTH_BASE_UUID).then_some(short)
}

// Device Information Service
pub const DEVICE_INFO_SERVICE: u16 = 0x180A;
pub const MANUFACTURER_NAME: u16 = 0x2A29;
pub const MODEL_NUMBER: u16 = 0x2A24;
pub const SERIAL_NUMBER: u16 = 0x2A25;
pub const HARDWARE_REVISION: u16 = 0x2A27;
pub const FIRMWARE_REVISION: u16 = 0x2A26;

// Cycling Power Service
pub const CYCLING_POWER_SERVICE: u16 = 0x1818;
pub const CYCLING_POWER_MEASUREMENT: u16 = 0x2A63;
pub const CYCLING_POWER_VECTOR: u16 = 0x2A64;
pub const CYCLING_POWER_FEATURE: u16 = 0x2A65;
pub const CYCLING_POWER_CONTROL_POINT: u16 = 0x2A66;
pub const SENSOR_LOCATION: u16 = 0x2A5D;

/// Tacx FE-C over BLE service
pub const FEC_SERVICE_UUID: Uuid = Uuid::from_u128(0x6e40fec1_b5a3_f393_e0a9_e50e24dcca9e);

/// FE-C characteristic carrying trainer pages to the collector (notify)
pub const FEC_NOTIFY_UUID: Uuid = Uuid::from_u128(0x6e40fec2_b5a3_f393_e0a9_e50e24dcca9e);

/// FE-C characteristic receiving collector commands (write)
pub const FEC_WRITE_UUID: Uuid = Uuid::from_u128(0x6e40fec3_b5a3_f393_e0a9_e50e24dcca9e);

/// Cycling Power Feature: pedal power balance supported
pub const CPF_PEDAL_POWER_BALANCE: u32 = 0x0000_0001;

/// Cycling Power Feature: crank revolution data supported
pub const CPF_CRANK_REVOLUTION_DATA: u32 = 0x0000_0008;

/// Feature bitmask reported by this trainer
pub const CYCLING_POWER_FEATURES: u32 = CPF_PEDAL_POWER_BALANCE | CPF_CRANK_REVOLUTION_DATA;

/// Cycling Power Measurement flag: instantaneous power present
pub const CPM_INSTANT_POWER: u16 = 0x0001;

/// Cycling Power Measurement flag: pedal power balance present
pub const CPM_PEDAL_POWER_BALANCE: u16 = 0x0002;

/// Cycling Power Measurement flag: crank revolution data present
pub const CPM_CRANK_REVOLUTION_DATA: u16 = 0x0020;

/// Flags of every measurement frame (all optional fields are always emitted)
pub const CPM_FLAGS: u16 = CPM_INSTANT_POWER | CPM_PEDAL_POWER_BALANCE | CPM_CRANK_REVOLUTION_DATA;

/// Encoded measurement frame length
/// flags(2) + power(2) + balance(1) + crank revolutions(2) + crank event time(2)
pub const CPM_FRAME_LEN: usize = 9;

// Field offsets inside a measurement frame
pub const CPM_OFFSET_FLAGS: usize = 0;
pub const CPM_OFFSET_INSTANT_POWER: usize = 2;
pub const CPM_OFFSET_PEDAL_BALANCE: usize = 4;
pub const CPM_OFFSET_CRANK_REVOLUTIONS: usize = 5;
pub const CPM_OFFSET_CRANK_EVENT_TIME: usize = 7;

/// Pedal power balance is transmitted in units of 1/2 percent
pub const PEDAL_BALANCE_MAX: u8 = 200;

/// Crank event time resolution (ticks per second)
pub const CRANK_EVENT_TICKS_PER_SECOND: u32 = 1024;

/// Sensor Location: rear hub
pub const SENSOR_LOCATION_REAR_HUB: u8 = 0x0D;

/// Highest sensor location value assigned by the SIG
pub const SENSOR_LOCATION_MAX: u8 = 16;
