//! VERA PSG to SAA1099 register translation.
//!
//! [`VeraToSaa1099`] accepts VERA PSG register writes and re-expresses them
//! as writes to a pair of SAA1099 chips, six tone channels each. VERA voices
//! 0..=11 map to chip `voice / 6`, channel `voice % 6`; voices 12..=15 have
//! no SAA1099 counterpart and are dropped. Pulse width has no equivalent
//! either and is ignored.
//!
//! SAA1099 register map used here:
//!
//! | register      | contents                                      |
//! |---------------|-----------------------------------------------|
//! | `0x00..=0x05` | amplitude, right nibble / left nibble         |
//! | `0x08..=0x0D` | frequency                                     |
//! | `0x10..=0x12` | octaves, two channels per register            |
//! | `0x14`        | tone enable bitmap                            |
//! | `0x15`        | noise enable bitmap                           |
//! | `0x1C`        | frequency reset (bit 1), sound enable (bit 0) |
//!
//! # Examples
//!
//! ```
//! use zsmplay::chip::frequency::SaaClock;
//! use zsmplay::chip::saa1099::VeraToSaa1099;
//!
//! let mut log = Vec::new();
//! let mut translator = VeraToSaa1099::new(SaaClock::Mhz7_15909, |chip: u8, reg: u8, data: u8| {
//!     log.push((chip, reg, data))
//! });
//! // Voice 7 is channel 1 of the second chip; full volume on both sides.
//! translator.write_psg(7 * 4 + 2, 0xFF);
//! translator.terminate();
//! assert!(log.contains(&(1, 0x01, 0xAA)));
//! ```

use crate::chip::cache::{RegisterCache, SAA1099_MAX_CHIPS, SAA1099_REGISTER_COUNT};
use crate::chip::frequency::{FrequencyTable, SaaClock};
use crate::chip::vera::{
    PsgAddress, PsgRegister, VERA_PSG_MASK_FREQ_HI, VERA_PSG_MASK_FREQ_LO,
    VERA_PSG_MASK_RIGHT_LEFT, VERA_PSG_MASK_VOLUME, VERA_PSG_SHIFT_FREQ_HI, VERA_PSG_SHIFT_LEFT,
    Waveform,
};
use crate::zsm::RegisterWriter;

/// Tone channels per SAA1099.
pub const SAA1099_CHANNEL_COUNT: u8 = 6;

/// VERA voices that have an SAA1099 channel.
pub const SAA1099_VERA_PSG_CHANNELS: u8 = SAA1099_CHANNEL_COUNT * SAA1099_MAX_CHIPS as u8;

pub const SAA1099_ADDRESS_AMPLITUDE: u8 = 0x00;
pub const SAA1099_ADDRESS_FREQUENCY: u8 = 0x08;
pub const SAA1099_ADDRESS_OCTAVE: u8 = 0x10;
pub const SAA1099_ADDRESS_FREQUENCY_ENABLE: u8 = 0x14;
pub const SAA1099_ADDRESS_NOISE_ENABLE: u8 = 0x15;
pub const SAA1099_ADDRESS_FREQUENCY_RESET_SOUND_ENABLE: u8 = 0x1C;

pub const SAA1099_SOUND_ENABLE: u8 = 0x01;
pub const SAA1099_FREQUENCY_RESET: u8 = 0x02;
pub const SAA1099_FREQUENCY_ENABLE_ALL_CHANNELS: u8 = 0x3F;

const SAA1099_MASK_OCTAVE_BITS: u8 = 0x77;
const SAA1099_MASK_OCTAVE_SELECT: u8 = 0x07;

/// VERA 6-bit volume to SAA1099 amplitude, both nibbles set.
const VERA_VOLUME_TO_SAA1099: [u8; 64] = [
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x11,
    0x22, 0x22, 0x22, 0x22, 0x22, 0x22, 0x22, 0x22, 0x22, 0x33, 0x33, 0x33, 0x33, 0x33, 0x44, 0x44,
    0x44, 0x44, 0x44, 0x55, 0x55, 0x55, 0x66, 0x66, 0x77, 0x77, 0x77, 0x88, 0x88, 0x99, 0x99, 0xAA,
];

/// Amplitude nibbles kept for VERA's (right, left) enable bits.
const AMPLITUDE_MASK: [u8; 4] = [0x00, 0x0F, 0xF0, 0xFF];

/// Physical SAA1099 register sink.
pub trait Saa1099Port {
    /// Write `data` to register `register` of chip `chip` (0 or 1).
    fn write(&mut self, chip: u8, register: u8, data: u8);
}

impl<F> Saa1099Port for F
where
    F: FnMut(u8, u8, u8),
{
    fn write(&mut self, chip: u8, register: u8, data: u8) {
        self(chip, register, data)
    }
}

/// Translator from VERA PSG writes to two SAA1099 chips.
///
/// Construction silences and configures both chips; [`terminate`] silences
/// them again and hands the port back.
///
/// [`terminate`]: VeraToSaa1099::terminate
#[derive(Debug)]
pub struct VeraToSaa1099<P: Saa1099Port> {
    port: P,
    table: FrequencyTable,
    cache: RegisterCache,
    channel_frequency: [u16; SAA1099_VERA_PSG_CHANNELS as usize],
    channel_waveform: [Waveform; SAA1099_VERA_PSG_CHANNELS as usize],
}

impl<P: Saa1099Port> VeraToSaa1099<P> {
    /// Build the frequency table for `clock` and initialize both chips
    ///
    /// Both chips are silenced and zeroed, then get a frequency reset,
    /// sound enable and tone enable on all six channels.
    ///
    /// # Arguments
    ///
    /// * `clock` - Input clock of the SAA1099 pair
    /// * `port` - Sink for the generated register writes
    pub fn new(clock: SaaClock, port: P) -> Self {
        let mut translator = Self {
            port,
            table: FrequencyTable::build(clock),
            cache: RegisterCache::new(),
            channel_frequency: [0; SAA1099_VERA_PSG_CHANNELS as usize],
            channel_waveform: [Waveform::Pulse; SAA1099_VERA_PSG_CHANNELS as usize],
        };

        translator.clear();

        for chip in 0..SAA1099_MAX_CHIPS as u8 {
            translator.write_register(
                chip,
                SAA1099_ADDRESS_FREQUENCY_RESET_SOUND_ENABLE,
                SAA1099_FREQUENCY_RESET,
            );
            translator.write_register(
                chip,
                SAA1099_ADDRESS_FREQUENCY_RESET_SOUND_ENABLE,
                SAA1099_SOUND_ENABLE,
            );
            translator.write_register(
                chip,
                SAA1099_ADDRESS_FREQUENCY_ENABLE,
                SAA1099_FREQUENCY_ENABLE_ALL_CHANNELS,
            );
        }

        log::debug!("SAA1099 pair initialized at {}", clock);
        translator
    }

    pub fn clock(&self) -> SaaClock {
        self.table.clock()
    }

    pub fn table(&self) -> &FrequencyTable {
        &self.table
    }

    /// Last value written to every SAA1099 register.
    pub fn cache(&self) -> &RegisterCache {
        &self.cache
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }

    /// Silence both chips and return the port
    ///
    /// # Returns
    ///
    /// The port passed to [`VeraToSaa1099::new`]
    pub fn terminate(mut self) -> P {
        self.clear();
        log::debug!("SAA1099 pair silenced");
        self.port
    }

    /// Translate one VERA PSG register write
    ///
    /// # Arguments
    ///
    /// * `address` - VERA PSG register address (voice * 4 + register)
    /// * `data` - Data written
    ///
    /// Writes to voices 12-15 are dropped.
    pub fn write_psg(&mut self, address: u8, data: u8) {
        let PsgAddress { channel, register } = PsgAddress::from(address);
        if channel >= SAA1099_VERA_PSG_CHANNELS {
            return;
        }

        match register {
            PsgRegister::FrequencyLo => self.set_frequency_lo(channel, data),
            PsgRegister::FrequencyHi => self.set_frequency_hi(channel, data),
            PsgRegister::Volume => self.set_volume(channel, data),
            PsgRegister::Waveform => self.set_waveform(channel, data),
        }
    }

    /// Replace the low byte of a voice's frequency word
    ///
    /// # Arguments
    ///
    /// * `channel` - VERA voice (0-11)
    /// * `data` - New low byte; the high byte comes from the last word set
    pub fn set_frequency_lo(&mut self, channel: u8, data: u8) {
        let Some(&cached) = self.channel_frequency.get(channel as usize) else {
            return;
        };
        self.set_frequency(channel, (cached & VERA_PSG_MASK_FREQ_HI) | data as u16);
    }

    /// Replace the high byte of a voice's frequency word
    ///
    /// # Arguments
    ///
    /// * `channel` - VERA voice (0-11)
    /// * `data` - New high byte; the low byte comes from the last word set
    pub fn set_frequency_hi(&mut self, channel: u8, data: u8) {
        let Some(&cached) = self.channel_frequency.get(channel as usize) else {
            return;
        };
        self.set_frequency(
            channel,
            ((data as u16) << VERA_PSG_SHIFT_FREQ_HI) | (cached & VERA_PSG_MASK_FREQ_LO),
        );
    }

    /// Program a voice's SAA1099 channel for a whole frequency word
    ///
    /// Writes the frequency register, then the shared octave register with
    /// only this channel's nibble changed.
    ///
    /// # Arguments
    ///
    /// * `channel` - VERA voice (0-11)
    /// * `word` - VERA frequency word; clamped to the table's range
    pub fn set_frequency(&mut self, channel: u8, word: u16) {
        let Some((chip, saa_channel)) = Self::locate(channel) else {
            return;
        };

        let entry = self.table.lookup(word);

        let octave_shift = (saa_channel & 1) << 2;
        let octave_mask = SAA1099_MASK_OCTAVE_BITS ^ (SAA1099_MASK_OCTAVE_SELECT << octave_shift);
        let octave_address = SAA1099_ADDRESS_OCTAVE + (saa_channel >> 1);
        let octave_data =
            (self.cache.read(chip, octave_address) & octave_mask) | (entry.octave << octave_shift);

        self.write_register(chip, SAA1099_ADDRESS_FREQUENCY + saa_channel, entry.frequency);
        self.write_register(chip, octave_address, octave_data);

        self.channel_frequency[channel as usize] = word;
    }

    /// Map a VERA volume/pan byte onto the channel's amplitude register
    ///
    /// # Arguments
    ///
    /// * `channel` - VERA voice (0-11)
    /// * `data` - Right enable (bit 7), left enable (bit 6), volume (bits 5-0)
    pub fn set_volume(&mut self, channel: u8, data: u8) {
        let Some((chip, saa_channel)) = Self::locate(channel) else {
            return;
        };

        let volume = VERA_VOLUME_TO_SAA1099[(data & VERA_PSG_MASK_VOLUME) as usize];
        let pan = AMPLITUDE_MASK[((data & VERA_PSG_MASK_RIGHT_LEFT) >> VERA_PSG_SHIFT_LEFT) as usize];

        self.write_register(chip, SAA1099_ADDRESS_AMPLITUDE + saa_channel, volume & pan);
    }

    /// Switch a channel between tone and noise when the waveform changes
    ///
    /// # Arguments
    ///
    /// * `channel` - VERA voice (0-11)
    /// * `data` - Waveform (bits 7-6); pulse width (bits 5-0) is ignored
    ///
    /// Noise (3) sets the channel's noise-enable bit and clears its
    /// tone-enable bit; every other waveform does the reverse. Writes with an
    /// unchanged waveform produce no SAA1099 traffic.
    pub fn set_waveform(&mut self, channel: u8, data: u8) {
        let Some((chip, saa_channel)) = Self::locate(channel) else {
            return;
        };

        let waveform = Waveform::from_register(data);
        if waveform == self.channel_waveform[channel as usize] {
            return;
        }

        // 0x14 and 0x15 are adjacent, so one xor picks either.
        let bits = waveform.bits();
        let enable = SAA1099_ADDRESS_FREQUENCY_ENABLE ^ ((bits >> 1) & bits);
        let disable = enable ^ 1;
        let channel_bit = 1u8 << saa_channel;

        let enable_data = self.cache.read(chip, enable) | channel_bit;
        self.write_register(chip, enable, enable_data);
        let disable_data = self.cache.read(chip, disable) & !channel_bit;
        self.write_register(chip, disable, disable_data);

        self.channel_waveform[channel as usize] = waveform;
    }

    fn locate(channel: u8) -> Option<(u8, u8)> {
        (channel < SAA1099_VERA_PSG_CHANNELS)
            .then(|| (channel / SAA1099_CHANNEL_COUNT, channel % SAA1099_CHANNEL_COUNT))
    }

    fn write_register(&mut self, chip: u8, register: u8, data: u8) {
        self.cache.write(chip, register, data);
        self.port.write(chip, register, data);
    }

    /// Sound off on both chips, then every register zeroed.
    fn clear(&mut self) {
        for chip in 0..SAA1099_MAX_CHIPS as u8 {
            self.write_register(chip, SAA1099_ADDRESS_FREQUENCY_RESET_SOUND_ENABLE, 0);
        }
        for register in 0..SAA1099_REGISTER_COUNT as u8 {
            for chip in 0..SAA1099_MAX_CHIPS as u8 {
                self.write_register(chip, register, 0);
            }
        }
        self.channel_frequency = [0; SAA1099_VERA_PSG_CHANNELS as usize];
        self.channel_waveform = [Waveform::Pulse; SAA1099_VERA_PSG_CHANNELS as usize];
    }
}

impl<P: Saa1099Port> RegisterWriter for VeraToSaa1099<P> {
    fn write(&mut self, address: u8, data: u8) {
        self.write_psg(address, data);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn translator() -> VeraToSaa1099<impl FnMut(u8, u8, u8)> {
        VeraToSaa1099::new(SaaClock::Mhz8, |_: u8, _: u8, _: u8| {})
    }

    #[test]
    fn octave_nibbles_are_merged() {
        let mut t = translator();
        let low = t.table().lookup(300).octave;
        let high = t.table().lookup(10_000).octave;

        t.set_frequency(0, 300);
        t.set_frequency(1, 10_000);
        assert_eq!(t.cache().read(0, 0x10), (high << 4) | low);

        t.set_frequency(0, 10_000);
        assert_eq!(t.cache().read(0, 0x10), (high << 4) | high);
    }

    #[test]
    fn frequency_bytes_combine_through_cache() {
        let mut t = translator();
        t.write_psg(0x01, 0x04);
        t.write_psg(0x00, 0x9D);
        assert_eq!(t.channel_frequency[0], 0x049D);
        let expected = t.table().lookup(0x049D);
        assert_eq!(t.cache().read(0, 0x08), expected.frequency);
    }
}
