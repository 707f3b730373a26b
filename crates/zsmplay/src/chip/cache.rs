//! Shadow copy of SAA1099 register contents.
//!
//! The SAA1099 registers are write-only. Registers shared between channels
//! (octave pairs, tone/noise enable bitmaps) can only be updated with a
//! read-modify-write, so the translator keeps the last value written to
//! every register of every chip.

/// Number of SAA1099 chips driven by the translator.
pub const SAA1099_MAX_CHIPS: usize = 2;

/// Size of one chip's register file.
pub const SAA1099_REGISTER_COUNT: usize = 32;

/// Last value written to each `(chip, register)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterCache {
    registers: [[u8; SAA1099_REGISTER_COUNT]; SAA1099_MAX_CHIPS],
}

impl RegisterCache {
    pub fn new() -> Self {
        Self {
            registers: [[0; SAA1099_REGISTER_COUNT]; SAA1099_MAX_CHIPS],
        }
    }

    /// Cached value, 0 for registers never written or out of range.
    pub fn read(&self, chip: u8, register: u8) -> u8 {
        self.registers
            .get(chip as usize)
            .and_then(|regs| regs.get(register as usize))
            .copied()
            .unwrap_or(0)
    }

    /// Record a write. Out-of-range addresses are ignored.
    pub fn write(&mut self, chip: u8, register: u8, value: u8) {
        if let Some(slot) = self
            .registers
            .get_mut(chip as usize)
            .and_then(|regs| regs.get_mut(register as usize))
        {
            *slot = value;
        }
    }
}

impl Default for RegisterCache {
    fn default() -> Self {
        Self::new()
    }
}
