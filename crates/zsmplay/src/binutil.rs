//! Little-endian byte helpers shared by the header codec and the builder.

/// Read a 16-bit little-endian unsigned integer from `bytes` at `off`.
///
/// Returns `None` when the two bytes starting at `off` are not available.
pub fn read_u16_le_at(bytes: &[u8], off: usize) -> Option<u16> {
    let pair = bytes.get(off..off.checked_add(2)?)?;
    Some(u16::from_le_bytes([pair[0], pair[1]]))
}

/// Read a single byte from `bytes` at `off`.
pub fn read_u8_at(bytes: &[u8], off: usize) -> Option<u8> {
    bytes.get(off).copied()
}

/// Write a 16-bit little-endian unsigned integer `v` into `buf` at `off`.
///
/// This function does not perform bounds checking; callers must ensure the
/// destination range is valid.
pub fn write_u16(buf: &mut [u8], off: usize, v: u16) {
    buf[off..off + 2].copy_from_slice(&v.to_le_bytes());
}

/// Write a single byte `v` into `buf` at `off`.
pub fn write_u8(buf: &mut [u8], off: usize, v: u8) {
    buf[off] = v;
}
