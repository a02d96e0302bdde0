//! Control endpoints (CPS Control Point and the FE-C command characteristic).
//!
//! Writes are accepted unconditionally and logged with their raw bytes. No
//! command is interpreted.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::fmt;
use tracing::info;

use crate::cps::codec::format_payload;
use crate::peripheral::context::ConnHandle;

/// Write-only control endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEndpoint {
    CpsControlPoint,
    FecCommand,
}

impl fmt::Display for ControlEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlEndpoint::CpsControlPoint => write!(f, "cpsCp"),
            ControlEndpoint::FecCommand => write!(f, "fecCmd"),
        }
    }
}

/// A control write as it was logged
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlWrite {
    pub endpoint: ControlEndpoint,
    pub conn: ConnHandle,
    pub received_at: DateTime<Utc>,
    pub payload: Bytes,
}

#[derive(Debug, Default)]
pub struct ControlPointHandler;

impl ControlPointHandler {
    pub fn new() -> Self {
        Self
    }

    /// Accept a write on `endpoint`
    pub fn on_write(&self, endpoint: ControlEndpoint, conn: ConnHandle, payload: &[u8]) -> ControlWrite {
        let received_at = Utc::now();
        info!(
            "ts: {} {}: {{ {} }} (conn={})",
            received_at.to_rfc3339(),
            endpoint,
            format_payload(payload),
            conn
        );

        ControlWrite {
            endpoint,
            conn,
            received_at,
            payload: Bytes::copy_from_slice(payload),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_is_passed_through() {
        let handler = ControlPointHandler::new();
        let before = Utc::now();

        let write = handler.on_write(ControlEndpoint::FecCommand, 1, &[0xA4, 0x09, 0x4F, 0x05]);

        assert_eq!(write.endpoint, ControlEndpoint::FecCommand);
        assert_eq!(write.conn, 1);
        assert_eq!(&write.payload[..], &[0xA4, 0x09, 0x4F, 0x05]);
        assert!(write.received_at >= before);
    }

    #[test]
    fn test_empty_write_accepted() {
        let handler = ControlPointHandler::new();
        let write = handler.on_write(ControlEndpoint::CpsControlPoint, 3, &[]);
        assert!(write.payload.is_empty());
    }

    #[test]
    fn test_endpoint_labels() {
        assert_eq!(ControlEndpoint::CpsControlPoint.to_string(), "cpsCp");
        assert_eq!(ControlEndpoint::FecCommand.to_string(), "fecCmd");
    }
}
