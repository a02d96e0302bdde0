//! # Little-Endian Field Codec
//!
//! Reads and writes fixed-width integers at byte offsets inside GATT payloads.
//!
//! Every Bluetooth SIG characteristic is little-endian on the wire. The
//! caller sizes the buffer; an offset that does not leave room for the
//! field panics on the slice index rather than reading past the payload.

/// Read a signed 8-bit value at `offset`
pub fn read_i8(data: &[u8], offset: usize) -> i8 {
    data[offset] as i8
}

/// Read a signed 16-bit little-endian value at `offset`
pub fn read_i16(data: &[u8], offset: usize) -> i16 {
    i16::from_le_bytes([data[offset], data[offset + 1]])
}

/// Read a signed 24-bit little-endian value at `offset`
///
/// Bit 23 is the sign bit and is extended into the upper byte of the result.
pub fn read_i24(data: &[u8], offset: usize) -> i32 {
    let raw = read_u24(data, offset);
    ((raw << 8) as i32) >> 8
}

/// Read a signed 32-bit little-endian value at `offset`
pub fn read_i32(data: &[u8], offset: usize) -> i32 {
    i32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

/// Read an unsigned 8-bit value at `offset`
pub fn read_u8(data: &[u8], offset: usize) -> u8 {
    data[offset]
}

/// Read an unsigned 16-bit little-endian value at `offset`
pub fn read_u16(data: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([data[offset], data[offset + 1]])
}

/// Read an unsigned 24-bit little-endian value at `offset`
pub fn read_u24(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([data[offset], data[offset + 1], data[offset + 2], 0])
}

/// Read an unsigned 32-bit little-endian value at `offset`
pub fn read_u32(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

/// Write a signed 8-bit value at `offset`
pub fn write_i8(data: &mut [u8], offset: usize, value: i8) {
    data[offset] = value as u8;
}

/// Write a signed 16-bit value at `offset` (little-endian)
pub fn write_i16(data: &mut [u8], offset: usize, value: i16) {
    data[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
}

/// Write the low 24 bits of a signed value at `offset` (little-endian)
pub fn write_i24(data: &mut [u8], offset: usize, value: i32) {
    data[offset..offset + 3].copy_from_slice(&value.to_le_bytes()[..3]);
}

/// Write a signed 32-bit value at `offset` (little-endian)
pub fn write_i32(data: &mut [u8], offset: usize, value: i32) {
    data[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

/// Write an unsigned 8-bit value at `offset`
pub fn write_u8(data: &mut [u8], offset: usize, value: u8) {
    data[offset] = value;
}

/// Write an unsigned 16-bit value at `offset` (little-endian)
pub fn write_u16(data: &mut [u8], offset: usize, value: u16) {
    data[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
}

/// Write the low 24 bits of an unsigned value at `offset` (little-endian)
pub fn write_u24(data: &mut [u8], offset: usize, value: u32) {
    data[offset..offset + 3].copy_from_slice(&value.to_le_bytes()[..3]);
}

/// Write an unsigned 32-bit value at `offset` (little-endian)
pub fn write_u32(data: &mut [u8], offset: usize, value: u32) {
    data[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

/// Format a payload the way frames are dumped to the log: `0x23 0x00 0xe1`
pub fn format_payload(data: &[u8]) -> String {
    data.iter()
        .map(|byte| format!("0x{:02x}", byte))
        .collect::<Vec<_>>()
        .join(" ")
}
