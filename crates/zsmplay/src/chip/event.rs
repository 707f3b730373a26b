//! State events reported by the SAA1099 state tracker.

/// Key state for a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyState {
    /// Channel is not producing sound
    #[default]
    Off,
    /// Channel is producing sound
    On,
}

/// Tone parameters of one SAA1099 channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneInfo {
    /// Frequency register value (0..=255).
    pub frequency: u8,
    /// Octave register nibble (0..=7).
    pub octave: u8,
    /// Output frequency in Hz at the tracker's clock.
    pub freq_hz: f64,
}

/// Events emitted when tracked register state changes.
#[derive(Debug, Clone, PartialEq)]
pub enum StateEvent {
    /// Channel went from silent to sounding.
    KeyOn { channel: u8, tone: ToneInfo },
    /// Channel went silent.
    KeyOff { channel: u8 },
    /// Frequency or octave changed while the channel is sounding.
    ToneChange { channel: u8, tone: ToneInfo },
}
