//! VERA PSG frequency word to SAA1099 octave/frequency conversion.
//!
//! The SAA1099 produces `clock * 2^octave / (512 * (511 - n))` Hz for an
//! 8-bit frequency register `n` and a 3-bit octave. A VERA frequency word
//! `w` produces `w * 25 MHz / 2^26` Hz. [`FrequencyTable`] precomputes the
//! closest `(octave, n)` for every word the chip can represent at a given
//! clock, using integer arithmetic only:
//!
//! 1. `ratio[o] = clock_ratio << (17 + o)` where `clock_ratio` is
//!    `clock / 25 MHz * 512` rounded (147 at 7.15909 MHz, 164 at 8 MHz);
//! 2. `octave = 16 - 7 - leading_zeros(w)`, clamped to 7;
//! 3. `value = (ratio[octave] / w) >> 9`;
//! 4. a value above 511 is halved and moved one octave down, a value below
//!    256 is raised to 256;
//! 5. the entry packs `(octave << 8) | (511 - value)`.
//!
//! Words outside the representable range are clamped to its ends.
//!
//! # Examples
//!
//! ```
//! use zsmplay::chip::frequency::{FrequencyTable, SaaClock};
//!
//! let table = FrequencyTable::build(SaaClock::Mhz7_15909);
//! let a4 = table.lookup(1181);
//! assert_eq!((a4.octave, a4.frequency), (4, 2));
//! assert!((a4.hz(SaaClock::Mhz7_15909) - 440.0).abs() < 1.0);
//! ```

use crate::error::ConfigError;

const FREQ_FIXED_POINT_SHIFT: u32 = 9;
const FREQ_DIV_MAX_RANGE: u32 = 511;
const FREQ_DIV_MIN_VALUE: u32 = 256;
const FREQ_BASE_OCTAVE: u32 = 17;

/// Number of SAA1099 octaves.
pub const SAA1099_OCTAVE_COUNT: u8 = 8;
pub const SAA1099_MAX_OCTAVE: u8 = SAA1099_OCTAVE_COUNT - 1;

const PACKED_MASK_FREQUENCY: u16 = 0x00FF;
const PACKED_MASK_OCTAVE: u16 = 0x0700;
const PACKED_SHIFT_OCTAVE: u16 = 8;

/// Supported SAA1099 input clocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SaaClock {
    /// 7.15909 MHz, twice the NTSC color burst.
    #[default]
    Mhz7_15909,
    /// 8 MHz.
    Mhz8,
}

impl SaaClock {
    pub const ALL: [SaaClock; 2] = [SaaClock::Mhz7_15909, SaaClock::Mhz8];

    /// Clock in Hz.
    pub fn hz(self) -> u32 {
        match self {
            SaaClock::Mhz7_15909 => 7_159_090,
            SaaClock::Mhz8 => 8_000_000,
        }
    }

    /// `clock / 25 MHz * 512`, rounded.
    pub fn clock_ratio(self) -> u32 {
        match self {
            SaaClock::Mhz7_15909 => 147,
            SaaClock::Mhz8 => 164,
        }
    }

    /// Lowest VERA frequency word the chip can follow.
    pub fn min_word(self) -> u16 {
        match self {
            SaaClock::Mhz7_15909 => 74,
            SaaClock::Mhz8 => 82,
        }
    }

    /// Highest VERA frequency word the chip can follow.
    pub fn max_word(self) -> u16 {
        match self {
            SaaClock::Mhz7_15909 => 18_767,
            SaaClock::Mhz8 => 20_971,
        }
    }

    /// Configuration index: 0 for 7.15909 MHz, 1 for 8 MHz.
    pub fn index(self) -> u8 {
        match self {
            SaaClock::Mhz7_15909 => 0,
            SaaClock::Mhz8 => 1,
        }
    }

    /// Clock for a configuration index, clamped to the valid range.
    pub fn from_index(index: i64) -> Self {
        if index <= 0 {
            SaaClock::Mhz7_15909
        } else {
            SaaClock::Mhz8
        }
    }

    /// Clock for an exact frequency in Hz.
    pub fn from_hz(hz: u32) -> Result<Self, ConfigError> {
        SaaClock::ALL
            .into_iter()
            .find(|clock| clock.hz() == hz)
            .ok_or(ConfigError::UnsupportedClock(hz))
    }
}

impl std::fmt::Display for SaaClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SaaClock::Mhz7_15909 => write!(f, "7.15909 MHz"),
            SaaClock::Mhz8 => write!(f, "8 MHz"),
        }
    }
}

/// An SAA1099 octave and frequency-register pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PackedFrequency {
    /// Octave register value (0..=7).
    pub octave: u8,
    /// Frequency register value.
    pub frequency: u8,
}

impl PackedFrequency {
    pub fn from_packed(packed: u16) -> Self {
        Self {
            octave: ((packed & PACKED_MASK_OCTAVE) >> PACKED_SHIFT_OCTAVE) as u8,
            frequency: (packed & PACKED_MASK_FREQUENCY) as u8,
        }
    }

    pub fn to_packed(self) -> u16 {
        ((self.octave as u16) << PACKED_SHIFT_OCTAVE) | self.frequency as u16
    }

    /// Output frequency in Hz at `clock`.
    pub fn hz(self, clock: SaaClock) -> f64 {
        saa1099_hz(clock.hz() as f64, self.octave, self.frequency)
    }
}

/// SAA1099 tone output in Hz for a clock, octave and frequency register.
pub fn saa1099_hz(clock_hz: f64, octave: u8, frequency: u8) -> f64 {
    let divisor = (FREQ_DIV_MAX_RANGE - frequency as u32) as f64;
    clock_hz * (1u32 << (octave & SAA1099_MAX_OCTAVE)) as f64 / (512.0 * divisor)
}

/// Precomputed VERA word to SAA1099 mapping for one clock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrequencyTable {
    clock: SaaClock,
    entries: Box<[u16]>,
}

impl FrequencyTable {
    /// Generate the table for `clock`.
    pub fn build(clock: SaaClock) -> Self {
        let ratios: [u32; SAA1099_OCTAVE_COUNT as usize] =
            std::array::from_fn(|octave| clock.clock_ratio() << (FREQ_BASE_OCTAVE + octave as u32));

        let entries = (clock.min_word()..=clock.max_word())
            .map(|word| table_entry(&ratios, word).to_packed())
            .collect();

        log::debug!(
            "built SAA1099 frequency table for {} ({} entries)",
            clock,
            clock.max_word() - clock.min_word() + 1
        );

        Self { clock, entries }
    }

    pub fn clock(&self) -> SaaClock {
        self.clock
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry for `word`, clamped into the representable range.
    pub fn lookup(&self, word: u16) -> PackedFrequency {
        let clamped = word.clamp(self.clock.min_word(), self.clock.max_word());
        let index = (clamped - self.clock.min_word()) as usize;
        PackedFrequency::from_packed(self.entries[index])
    }

    /// All entries as `(word, entry)` pairs in ascending word order.
    pub fn iter(&self) -> impl Iterator<Item = (u16, PackedFrequency)> + '_ {
        (self.clock.min_word()..=self.clock.max_word())
            .zip(self.entries.iter())
            .map(|(word, &packed)| (word, PackedFrequency::from_packed(packed)))
    }
}

fn table_entry(ratios: &[u32; SAA1099_OCTAVE_COUNT as usize], word: u16) -> PackedFrequency {
    let mut octave = (16 - 7 - word.leading_zeros() as i32).clamp(0, SAA1099_MAX_OCTAVE as i32) as u8;
    let mut value = (ratios[octave as usize] / word as u32) >> FREQ_FIXED_POINT_SHIFT;

    if value > FREQ_DIV_MAX_RANGE {
        // No octave below 0; pin to the lowest pitch it can produce.
        if octave == 0 {
            value = FREQ_DIV_MAX_RANGE;
        } else {
            value >>= 1;
            octave -= 1;
        }
    } else if value < FREQ_DIV_MIN_VALUE {
        value = FREQ_DIV_MIN_VALUE;
    }

    PackedFrequency {
        octave,
        frequency: (FREQ_DIV_MAX_RANGE - value) as u8,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowest_word_at_8mhz_stays_in_octave_zero() {
        let table = FrequencyTable::build(SaaClock::Mhz8);
        let entry = table.lookup(82);
        assert_eq!(entry.octave, 0);
        assert_eq!(entry.frequency, 0);
    }

    #[test]
    fn out_of_range_words_clamp() {
        let table = FrequencyTable::build(SaaClock::Mhz7_15909);
        assert_eq!(table.lookup(0), table.lookup(74));
        assert_eq!(table.lookup(u16::MAX), table.lookup(18_767));
    }

    #[test]
    fn from_hz_rejects_unknown_clock() {
        assert_eq!(SaaClock::from_hz(8_000_000), Ok(SaaClock::Mhz8));
        assert_eq!(
            SaaClock::from_hz(4_000_000),
            Err(ConfigError::UnsupportedClock(4_000_000))
        );
    }
}
