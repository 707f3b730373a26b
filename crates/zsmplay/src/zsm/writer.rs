//! Register-write sinks consumed by the player.

/// A device that accepts `(address, data)` register writes.
///
/// Implemented for any `FnMut(u8, u8)` closure, for [`NullWriter`], and for
/// translators such as [`VeraToSaa1099`](crate::chip::saa1099::VeraToSaa1099).
pub trait RegisterWriter {
    /// Write `data` to register `address`.
    fn write(&mut self, address: u8, data: u8);

    /// True for sinks that discard every write. A player refuses to start
    /// when all of its writers are null.
    fn is_null(&self) -> bool {
        false
    }
}

impl<F> RegisterWriter for F
where
    F: FnMut(u8, u8),
{
    fn write(&mut self, address: u8, data: u8) {
        self(address, data)
    }
}

/// Sink that discards all writes.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullWriter;

impl RegisterWriter for NullWriter {
    fn write(&mut self, _address: u8, _data: u8) {}

    fn is_null(&self) -> bool {
        true
    }
}
