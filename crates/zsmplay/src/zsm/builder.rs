//! Programmatic construction of ZSM streams.
//!
//! `ZsmBuilder` appends commands to an in-memory body and, on
//! [`ZsmBuilder::finalize`], prepends the header and terminates the stream
//! with an end-of-stream command. Long FM write lists, long delays and long
//! extension payloads are split into as many commands as the format needs.
//!
//! Unless [`ZsmBuilder::set_channel_masks`] is called, the header channel
//! masks are derived from the writes that were appended: a PSG write marks
//! channel `address >> 2`, an FM write to a per-channel register (0x20 and
//! up) marks channel `address & 7`, and a key-on write (register 0x08) marks
//! the channel in its data byte.

use crate::zsm::command::{
    CMD_END_OF_STREAM, CMD_EXTENSION, MASK_EXTENSION_DATA, MASK_PSG_ADDRESS, MAX_DELAY_TICKS,
    MAX_FM_PAIRS,
};
use crate::zsm::header::{ZSM_HEADER_SIZE, ZsmHeader, ZsmOffset};

const YM2151_KEY_ON: u8 = 0x08;
const YM2151_CHANNEL_REGS: u8 = 0x20;
const YM2151_CHANNEL_MASK: u8 = 0x07;

/// Builder for assembling a ZSM byte stream.
///
/// Methods return `&mut Self` so calls can be chained; `finalize` consumes
/// the builder.
#[derive(Debug, Clone)]
pub struct ZsmBuilder {
    header: ZsmHeader,
    body: Vec<u8>,
    loop_offset: Option<u32>,
    explicit_masks: Option<(u8, u16)>,
    fm_channels: u8,
    psg_channels: u16,
}

impl ZsmBuilder {
    /// Create a builder for a version-1 stream at 60 Hz.
    pub fn new() -> Self {
        ZsmBuilder {
            header: ZsmHeader::new(),
            body: Vec::new(),
            loop_offset: None,
            explicit_masks: None,
            fm_channels: 0,
            psg_channels: 0,
        }
    }

    /// Set the tick rate in Hz.
    pub fn set_tick_rate(&mut self, hz: u16) -> &mut Self {
        self.header.tick_rate = hz;
        self
    }

    /// Override the derived channel masks.
    pub fn set_channel_masks(&mut self, fm: u8, psg: u16) -> &mut Self {
        self.explicit_masks = Some((fm, psg));
        self
    }

    /// Mark the position of the next appended command as the loop point.
    pub fn set_loop_here(&mut self) -> &mut Self {
        self.loop_offset = Some((ZSM_HEADER_SIZE + self.body.len()) as u32);
        self
    }

    /// Append a VERA PSG register write. `address` is masked to 6 bits.
    pub fn psg_write(&mut self, address: u8, data: u8) -> &mut Self {
        let address = address & MASK_PSG_ADDRESS;
        self.psg_channels |= 1 << (address >> 2);
        self.body.push(address);
        self.body.push(data);
        self
    }

    /// Append YM2151 register writes, 63 pairs per command at most.
    pub fn fm_write(&mut self, pairs: &[(u8, u8)]) -> &mut Self {
        for chunk in pairs.chunks(MAX_FM_PAIRS) {
            self.body.push(CMD_EXTENSION | chunk.len() as u8);
            for &(address, data) in chunk {
                self.mark_fm_channel(address, data);
                self.body.push(address);
                self.body.push(data);
            }
        }
        self
    }

    fn mark_fm_channel(&mut self, address: u8, data: u8) {
        if address == YM2151_KEY_ON {
            self.fm_channels |= 1 << (data & YM2151_CHANNEL_MASK);
        } else if address >= YM2151_CHANNEL_REGS {
            self.fm_channels |= 1 << (address & YM2151_CHANNEL_MASK);
        }
    }

    /// Append a wait of `ticks` ticks, 127 ticks per command at most.
    /// A zero wait appends nothing.
    pub fn delay(&mut self, ticks: u32) -> &mut Self {
        let mut remaining = ticks;
        while remaining > 0 {
            let step = remaining.min(MAX_DELAY_TICKS as u32);
            self.body.push(CMD_END_OF_STREAM | step as u8);
            remaining -= step;
        }
        self
    }

    /// Append an extension block for extension `channel` (0..=3).
    ///
    /// Players skip the payload. Payloads longer than 63 bytes are split
    /// across several extension commands.
    pub fn extension(&mut self, channel: u8, payload: &[u8]) -> &mut Self {
        let channel_bits = (channel & 0x03) << 6;
        for chunk in payload.chunks(MASK_EXTENSION_DATA as usize) {
            self.body.push(CMD_EXTENSION);
            self.body.push(channel_bits | chunk.len() as u8);
            self.body.extend_from_slice(chunk);
        }
        if payload.is_empty() {
            self.body.push(CMD_EXTENSION);
            self.body.push(channel_bits);
        }
        self
    }

    /// The header as it would be written by `finalize` right now.
    pub fn header(&self) -> ZsmHeader {
        let mut header = self.header;
        let (fm, psg) = self
            .explicit_masks
            .unwrap_or((self.fm_channels, self.psg_channels));
        header.fm_channel_mask = fm;
        header.psg_channel_mask = psg;
        header.loop_point = self.loop_offset.map(ZsmOffset::from).unwrap_or_default();
        header
    }

    /// Serialize header and body, terminated by an end-of-stream command.
    pub fn finalize(self) -> Vec<u8> {
        let header = self.header();
        let mut bytes = Vec::with_capacity(ZSM_HEADER_SIZE + self.body.len() + 1);
        bytes.extend_from_slice(&header.to_bytes());
        bytes.extend_from_slice(&self.body);
        bytes.push(CMD_END_OF_STREAM);
        bytes
    }
}

impl Default for ZsmBuilder {
    fn default() -> Self {
        Self::new()
    }
}
