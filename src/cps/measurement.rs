//! # Cycling Power Measurement Frame
//!
//! Encodes telemetry snapshots into the Cycling Power Measurement (0x2A63)
//! notification payload.
//!
//! ```text
//! offset  field                          width
//! 0       flags                          u16
//! 2       instantaneous power (W)        i16
//! 4       pedal power balance (1/2 %)    u8
//! 5       cumulative crank revolutions   u16
//! 7       last crank event time (1/1024) u16
//! ```

use bytes::Bytes;

use super::codec::{read_i16, read_u16, read_u8, write_i16, write_u16, write_u8};
use super::protocol::*;
use crate::error::{Result, TrainerSimError};
use crate::telemetry::TelemetryModel;

/// Cycling Power Measurement frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpmFrame {
    pub flags: u16,
    pub instantaneous_power: i16,
    pub pedal_power_balance: u8,
    pub cumulative_crank_revolutions: u16,
    pub last_crank_event_time: u16,
}

impl CpmFrame {
    /// Build a frame from a telemetry snapshot
    ///
    /// All optional fields are populated, so the flags always carry the
    /// instant power, pedal balance and crank revolution bits.
    pub fn from_model(model: &TelemetryModel) -> Self {
        Self {
            flags: CPM_FLAGS,
            instantaneous_power: model.instant_power_watts,
            pedal_power_balance: model.pedal_power_balance,
            cumulative_crank_revolutions: model.cumulative_crank_revolutions,
            last_crank_event_time: model.last_crank_event_time,
        }
    }

    /// Serialize the frame into its 9-byte wire layout
    pub fn encode(&self) -> [u8; CPM_FRAME_LEN] {
        let mut frame = [0u8; CPM_FRAME_LEN];
        write_u16(&mut frame, CPM_OFFSET_FLAGS, self.flags);
        write_i16(&mut frame, CPM_OFFSET_INSTANT_POWER, self.instantaneous_power);
        write_u8(&mut frame, CPM_OFFSET_PEDAL_BALANCE, self.pedal_power_balance);
        write_u16(&mut frame, CPM_OFFSET_CRANK_REVOLUTIONS, self.cumulative_crank_revolutions);
        write_u16(&mut frame, CPM_OFFSET_CRANK_EVENT_TIME, self.last_crank_event_time);
        frame
    }

    /// Parse a frame produced by [`CpmFrame::encode`]
    ///
    /// # Errors
    ///
    /// Returns error if the payload is shorter than a frame or its flags
    /// do not announce every field of the fixed layout.
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < CPM_FRAME_LEN {
            return Err(TrainerSimError::Protocol(format!(
                "Measurement too short: expected {} bytes, got {}",
                CPM_FRAME_LEN,
                data.len()
            )));
        }

        let flags = read_u16(data, CPM_OFFSET_FLAGS);
        if flags & CPM_FLAGS != CPM_FLAGS {
            return Err(TrainerSimError::Protocol(format!(
                "Unsupported measurement flags: 0x{:04X}",
                flags
            )));
        }

        Ok(Self {
            flags,
            instantaneous_power: read_i16(data, CPM_OFFSET_INSTANT_POWER),
            pedal_power_balance: read_u8(data, CPM_OFFSET_PEDAL_BALANCE),
            cumulative_crank_revolutions: read_u16(data, CPM_OFFSET_CRANK_REVOLUTIONS),
            last_crank_event_time: read_u16(data, CPM_OFFSET_CRANK_EVENT_TIME),
        })
    }
}

/// Encode a telemetry snapshot into a notification payload
pub fn encode_measurement(model: &TelemetryModel) -> Bytes {
    Bytes::copy_from_slice(&CpmFrame::from_model(model).encode())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_after_one_tick() {
        let mut model = TelemetryModel::default();
        model.advance();

        let frame = CpmFrame::from_model(&model).encode();
        assert_eq!(frame, [0x23, 0x00, 0xE1, 0x00, 0x64, 0x02, 0x00, 0x00, 0x04]);
    }

    #[test]
    fn test_encode_initial_state() {
        let frame = CpmFrame::from_model(&TelemetryModel::default()).encode();
        assert_eq!(frame, [0x23, 0x00, 0xE1, 0x00, 0x64, 0x00, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn test_flags_bits() {
        let frame = CpmFrame::from_model(&TelemetryModel::default()).encode();
        let flags = read_u16(&frame, 0);

        let set_bits: Vec<u32> = (0..16u32).filter(|&bit| flags & (1u16 << bit) != 0).collect();
        assert_eq!(set_bits, vec![0, 1, 5]);
    }

    #[test]
    fn test_encode_is_deterministic() {
        let mut model = TelemetryModel::default();
        for _ in 0..10 {
            model.advance();
        }
        let copy = model;

        assert_eq!(encode_measurement(&model), encode_measurement(&copy));
        assert_eq!(encode_measurement(&model).len(), CPM_FRAME_LEN);
    }

    #[test]
    fn test_negative_power() {
        let mut model = TelemetryModel::default();
        model.instant_power_watts = -1;

        let frame = CpmFrame::from_model(&model).encode();
        assert_eq!(&frame[2..4], &[0xFF, 0xFF]);
    }

    #[test]
    fn test_decode_matches_model() {
        let mut model = TelemetryModel::default();
        for _ in 0..3 {
            model.advance();
        }

        let decoded = CpmFrame::decode(&encode_measurement(&model)).unwrap();
        assert_eq!(decoded.instantaneous_power, 225);
        assert_eq!(decoded.pedal_power_balance, 100);
        assert_eq!(decoded.cumulative_crank_revolutions, 6);
        assert_eq!(decoded.last_crank_event_time, 3072);
    }

    #[test]
    fn test_decode_too_short() {
        let result = CpmFrame::decode(&[0x23, 0x00, 0xE1, 0x00, 0x64, 0x02, 0x00, 0x00]);
        match result {
            Err(TrainerSimError::Protocol(msg)) => assert!(msg.contains("too short")),
            other => panic!("Expected Protocol error, got: {:?}", other),
        }
    }

    #[test]
    fn test_decode_rejects_missing_flags() {
        let frame = [0x01, 0x00, 0xE1, 0x00, 0x64, 0x02, 0x00, 0x00, 0x04];
        assert!(CpmFrame::decode(&frame).is_err());
    }
}
