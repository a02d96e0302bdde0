//! GAP events delivered by the host stack.

use super::context::ConnHandle;
use crate::gatt::table::AttrHandle;

/// Connection-level events, delivered serially by the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GapEvent {
    /// A connection was established (`status == 0`) or an attempt failed
    Connect { handle: ConnHandle, status: i32 },

    /// The peer disconnected
    Disconnect { handle: ConnHandle, reason: i32 },

    /// The advertising procedure ended without a connection
    AdvertiseComplete { reason: i32 },

    /// The peer wrote the CCCD of a characteristic
    Subscribe {
        handle: ConnHandle,
        attr_handle: AttrHandle,
        notify: bool,
        indicate: bool,
    },

    /// ATT MTU was negotiated
    MtuExchanged { handle: ConnHandle, mtu: u16 },
}
