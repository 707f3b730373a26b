//! VERA PSG register layout.
//!
//! The VERA PSG exposes 16 voices, four registers each, at addresses
//! `0x00..=0x3F`:
//!
//! | offset | register                                   |
//! |--------|--------------------------------------------|
//! | 0      | frequency word, low byte                   |
//! | 1      | frequency word, high byte                  |
//! | 2      | right/left enable (bits 7/6), volume 0..63 |
//! | 3      | waveform (bits 7..6), pulse width 0..63    |
//!
//! Output frequency is `word * 25 MHz / 2^26`.

/// Number of PSG voices.
pub const VERA_PSG_CHANNELS: u8 = 16;

/// VERA master clock in Hz.
pub const VERA_CLOCK_HZ: u32 = 25_000_000;

/// Power-of-two scale between a frequency word and the VERA clock
/// (512-cycle sample period times a 17-bit phase accumulator).
pub const VERA_PSG_FREQ_BASE_OCTAVE: u32 = 17;

pub const VERA_PSG_MASK_FREQ_LO: u16 = 0x00FF;
pub const VERA_PSG_MASK_FREQ_HI: u16 = 0xFF00;
pub const VERA_PSG_SHIFT_FREQ_HI: u16 = 8;
pub const VERA_PSG_MASK_RIGHT_LEFT: u8 = 0xC0;
pub const VERA_PSG_SHIFT_LEFT: u8 = 6;
pub const VERA_PSG_MASK_VOLUME: u8 = 0x3F;
pub const VERA_PSG_MASK_WAVEFORM: u8 = 0xC0;
pub const VERA_PSG_SHIFT_WAVEFORM: u8 = 6;

const ADDRESS_TO_CHANNEL_SHIFT: u8 = 2;
const ADDRESS_TO_OFFSET_MASK: u8 = 0x03;

/// One of the four registers of a PSG voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PsgRegister {
    FrequencyLo,
    FrequencyHi,
    Volume,
    Waveform,
}

impl PsgRegister {
    pub fn offset(self) -> u8 {
        match self {
            PsgRegister::FrequencyLo => 0,
            PsgRegister::FrequencyHi => 1,
            PsgRegister::Volume => 2,
            PsgRegister::Waveform => 3,
        }
    }
}

/// A decoded PSG register address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PsgAddress {
    pub channel: u8,
    pub register: PsgRegister,
}

impl PsgAddress {
    pub fn to_address(self) -> u8 {
        (self.channel << ADDRESS_TO_CHANNEL_SHIFT) | self.register.offset()
    }
}

impl From<u8> for PsgAddress {
    /// Split `address` into voice (`address >> 2`) and register (`address & 3`).
    /// Bits above the 6-bit address space end up in `channel`.
    fn from(address: u8) -> Self {
        let register = match address & ADDRESS_TO_OFFSET_MASK {
            0 => PsgRegister::FrequencyLo,
            1 => PsgRegister::FrequencyHi,
            2 => PsgRegister::Volume,
            _ => PsgRegister::Waveform,
        };
        Self {
            channel: address >> ADDRESS_TO_CHANNEL_SHIFT,
            register,
        }
    }
}

/// PSG waveform selector (bits 7..6 of the waveform register).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Waveform {
    #[default]
    Pulse = 0,
    Sawtooth = 1,
    Triangle = 2,
    Noise = 3,
}

impl Waveform {
    /// The 2-bit selector value.
    pub fn bits(self) -> u8 {
        self as u8
    }

    /// Decode from the 2-bit selector.
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => Waveform::Pulse,
            1 => Waveform::Sawtooth,
            2 => Waveform::Triangle,
            _ => Waveform::Noise,
        }
    }

    /// Decode from a full waveform-register value.
    pub fn from_register(data: u8) -> Self {
        Self::from_bits((data & VERA_PSG_MASK_WAVEFORM) >> VERA_PSG_SHIFT_WAVEFORM)
    }
}

/// Output frequency in Hz for a PSG frequency word.
pub fn frequency_hz(word: u16) -> f64 {
    word as f64 * VERA_CLOCK_HZ as f64 / (1u64 << (VERA_PSG_FREQ_BASE_OCTAVE + 9)) as f64
}
