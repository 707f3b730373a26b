//! SAA1099 register state tracking.
//!
//! `Saa1099State` follows the writes sent to one SAA1099 and reports when
//! a channel starts sounding, stops, or changes pitch. It is used to check
//! and annotate the output of [`VeraToSaa1099`].
//!
//! A channel sounds when sound output is enabled (register 0x1C bit 0), its
//! tone-enable bit is set (register 0x14) and its amplitude is non-zero.
//! Pitch is `clock * 2^octave / (512 * (511 - frequency))`.
//!
//! [`VeraToSaa1099`]: crate::chip::saa1099::VeraToSaa1099

use crate::chip::cache::SAA1099_REGISTER_COUNT;
use crate::chip::event::{KeyState, StateEvent, ToneInfo};
use crate::chip::frequency::saa1099_hz;

/// SAA1099 has 6 audio channels
const SAA1099_CHANNELS: usize = 6;

const REG_AMPLITUDE_FIRST: u8 = 0x00;
const REG_AMPLITUDE_LAST: u8 = 0x05;
const REG_FREQUENCY_FIRST: u8 = 0x08;
const REG_FREQUENCY_LAST: u8 = 0x0D;
const REG_OCTAVE_FIRST: u8 = 0x10;
const REG_OCTAVE_LAST: u8 = 0x12;
const REG_FREQUENCY_ENABLE: u8 = 0x14;
const REG_SOUND_ENABLE: u8 = 0x1C;

/// Per-channel key and tone state.
#[derive(Debug, Clone, Default)]
pub struct ChannelState {
    pub key_state: KeyState,
    pub tone: Option<ToneInfo>,
}

impl ChannelState {
    pub fn clear(&mut self) {
        self.key_state = KeyState::Off;
        self.tone = None;
    }
}

/// SAA1099 register state tracker
///
/// Tracks the 6 tone channels of one chip and reports key on/off and tone
/// changes as registers are written.
///
/// # Register Layout
///
/// - 0x00-0x05: Amplitude (4-bit right, 4-bit left)
/// - 0x08-0x0D: Frequency (8-bit)
/// - 0x10-0x12: Octave (3 bits per channel, two channels per register)
/// - 0x14: Frequency enable (one bit per channel)
/// - 0x1C: Sound enable (bit 0)
///
/// Other registers are stored but do not affect key state.
#[derive(Debug, Clone)]
pub struct Saa1099State {
    channels: [ChannelState; SAA1099_CHANNELS],
    master_clock_hz: f64,
    registers: [Option<u8>; SAA1099_REGISTER_COUNT],
}

impl Saa1099State {
    /// Create a new SAA1099 state tracker
    ///
    /// # Arguments
    ///
    /// * `master_clock_hz` - Master clock frequency in Hz
    ///   (7,159,090 or 8,000,000 for the supported cards)
    ///
    /// # Examples
    ///
    /// ```
    /// use zsmplay::chip::state::Saa1099State;
    ///
    /// let state = Saa1099State::new(7_159_090.0);
    /// assert_eq!(state.channel_count(), 6);
    /// ```
    pub fn new(master_clock_hz: f64) -> Self {
        Self {
            channels: std::array::from_fn(|_| ChannelState::default()),
            master_clock_hz,
            registers: [None; SAA1099_REGISTER_COUNT],
        }
    }

    /// Get a reference to a channel's state
    ///
    /// # Arguments
    ///
    /// * `channel` - Channel index (0-5)
    ///
    /// # Returns
    ///
    /// Some(&ChannelState) if channel index is valid, None otherwise
    pub fn channel(&self, channel: u8) -> Option<&ChannelState> {
        self.channels.get(channel as usize)
    }

    pub fn channel_count(&self) -> usize {
        SAA1099_CHANNELS
    }

    /// Last value written to a register
    ///
    /// # Arguments
    ///
    /// * `register` - Register address (0x00-0x1F)
    ///
    /// # Returns
    ///
    /// Some(value) if the register has been written, None otherwise
    pub fn read_register(&self, register: u8) -> Option<u8> {
        self.registers.get(register as usize).copied().flatten()
    }

    /// Forget every write and silence every channel.
    pub fn reset(&mut self) {
        for channel in &mut self.channels {
            channel.clear();
        }
        self.registers = [None; SAA1099_REGISTER_COUNT];
    }

    /// Current tone of a channel, computed from its registers
    ///
    /// # Arguments
    ///
    /// * `channel` - Channel index (0-5)
    ///
    /// # Returns
    ///
    /// Some(ToneInfo) once the channel's frequency register has been
    /// written, None otherwise. An unwritten octave register counts as 0.
    pub fn tone(&self, channel: usize) -> Option<ToneInfo> {
        if channel >= SAA1099_CHANNELS {
            return None;
        }
        let frequency = self.read_register(REG_FREQUENCY_FIRST + channel as u8)?;
        let octave_data = self
            .read_register(REG_OCTAVE_FIRST + (channel / 2) as u8)
            .unwrap_or(0);
        let octave = if channel.is_multiple_of(2) {
            octave_data & 0x07
        } else {
            (octave_data >> 4) & 0x07
        };

        Some(ToneInfo {
            frequency,
            octave,
            freq_hz: saa1099_hz(self.master_clock_hz, octave, frequency),
        })
    }

    fn is_channel_enabled(&self, channel: usize) -> bool {
        let sound_enabled = self.read_register(REG_SOUND_ENABLE).unwrap_or(0) & 0x01 != 0;
        let tone_enabled =
            self.read_register(REG_FREQUENCY_ENABLE).unwrap_or(0) & (1 << channel) != 0;
        let amplitude = self
            .read_register(REG_AMPLITUDE_FIRST + channel as u8)
            .unwrap_or(0);

        sound_enabled && tone_enabled && amplitude != 0
    }

    fn update_key(&mut self, channel: usize, events: &mut Vec<StateEvent>) {
        let new_key_state = if self.is_channel_enabled(channel) {
            KeyState::On
        } else {
            KeyState::Off
        };
        let old_key_state = self.channels[channel].key_state;
        self.channels[channel].key_state = new_key_state;

        match (old_key_state, new_key_state) {
            (KeyState::Off, KeyState::On) => {
                if let Some(tone) = self.tone(channel) {
                    self.channels[channel].tone = Some(tone);
                    events.push(StateEvent::KeyOn {
                        channel: channel as u8,
                        tone,
                    });
                }
            }
            (KeyState::On, KeyState::Off) => events.push(StateEvent::KeyOff {
                channel: channel as u8,
            }),
            _ => {}
        }
    }

    fn update_tone(&mut self, channel: usize, events: &mut Vec<StateEvent>) {
        if self.channels[channel].key_state != KeyState::On {
            return;
        }
        let Some(tone) = self.tone(channel) else {
            return;
        };
        if self.channels[channel].tone == Some(tone) {
            return;
        }
        self.channels[channel].tone = Some(tone);
        events.push(StateEvent::ToneChange {
            channel: channel as u8,
            tone,
        });
    }

    /// Record a register write and report the resulting state changes
    ///
    /// # Arguments
    ///
    /// * `register` - Register address (0x00-0x1F)
    /// * `value` - Data written
    ///
    /// # Returns
    ///
    /// Some(events) when the write changed a channel's key state or tone,
    /// None when nothing changed or the register is out of range
    pub fn on_register_write(&mut self, register: u8, value: u8) -> Option<Vec<StateEvent>> {
        let slot = self.registers.get_mut(register as usize)?;
        *slot = Some(value);

        let mut events = Vec::new();
        match register {
            REG_AMPLITUDE_FIRST..=REG_AMPLITUDE_LAST => {
                self.update_key((register - REG_AMPLITUDE_FIRST) as usize, &mut events)
            }
            REG_FREQUENCY_FIRST..=REG_FREQUENCY_LAST => {
                self.update_tone((register - REG_FREQUENCY_FIRST) as usize, &mut events)
            }
            REG_OCTAVE_FIRST..=REG_OCTAVE_LAST => {
                let base = ((register - REG_OCTAVE_FIRST) * 2) as usize;
                self.update_tone(base, &mut events);
                self.update_tone(base + 1, &mut events);
            }
            REG_FREQUENCY_ENABLE | REG_SOUND_ENABLE => {
                for channel in 0..SAA1099_CHANNELS {
                    self.update_key(channel, &mut events);
                }
            }
            _ => {}
        }

        (!events.is_empty()).then_some(events)
    }
}
