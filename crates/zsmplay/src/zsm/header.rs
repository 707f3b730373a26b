//! ZSM header codec.
//!
//! The header is a fixed 16-byte little-endian record at offset 0 of every
//! ZSM stream:
//!
//! | offset | size | field              |
//! |--------|------|--------------------|
//! | 0x00   | 2    | magic (`"zm"`)     |
//! | 0x02   | 1    | version            |
//! | 0x03   | 3    | loop point         |
//! | 0x06   | 3    | PCM offset         |
//! | 0x09   | 1    | FM channel mask    |
//! | 0x0A   | 2    | PSG channel mask   |
//! | 0x0C   | 2    | tick rate (Hz)     |
//! | 0x0E   | 2    | reserved           |
//!
//! Three-byte offsets are a 16-bit address followed by an 8-bit bank.

use crate::binutil::{read_u8_at, read_u16_le_at, write_u8, write_u16};
use crate::error::ZsmError;

/// Size of the on-disk header in bytes.
pub const ZSM_HEADER_SIZE: usize = 16;

/// The only header version this crate decodes.
pub const ZSM_VERSION: u8 = 0x01;

/// Expected magic, the ASCII bytes `"zm"` read little-endian.
pub const ZSM_MAGIC: u16 = u16::from_le_bytes(*b"zm");

/// Header field offsets.
#[derive(Copy, Clone, Debug)]
pub enum ZsmHeaderField {
    Magic,
    Version,
    LoopPoint,
    PcmOffset,
    FmChannelMask,
    PsgChannelMask,
    TickRate,
    Reserved,
}

impl ZsmHeaderField {
    pub fn offset(self) -> usize {
        match self {
            ZsmHeaderField::Magic => 0x00,
            ZsmHeaderField::Version => 0x02,
            ZsmHeaderField::LoopPoint => 0x03,
            ZsmHeaderField::PcmOffset => 0x06,
            ZsmHeaderField::FmChannelMask => 0x09,
            ZsmHeaderField::PsgChannelMask => 0x0A,
            ZsmHeaderField::TickRate => 0x0C,
            ZsmHeaderField::Reserved => 0x0E,
        }
    }
}

/// A 24-bit stream location stored as address + bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ZsmOffset {
    pub address: u16,
    pub bank: u8,
}

impl ZsmOffset {
    /// True when both address and bank are zero.
    pub fn is_zero(&self) -> bool {
        self.address == 0 && self.bank == 0
    }

    /// Absolute stream offset, `(bank << 16) | address`.
    pub fn absolute(&self) -> u32 {
        ((self.bank as u32) << 16) | self.address as u32
    }

    fn read(bytes: &[u8], off: usize) -> Option<Self> {
        Some(Self {
            address: read_u16_le_at(bytes, off)?,
            bank: read_u8_at(bytes, off + 2)?,
        })
    }

    fn write(&self, buf: &mut [u8], off: usize) {
        write_u16(buf, off, self.address);
        write_u8(buf, off + 2, self.bank);
    }
}

impl From<u32> for ZsmOffset {
    /// Split an absolute offset into address (low 16 bits) and bank (next 8).
    fn from(offset: u32) -> Self {
        Self {
            address: offset as u16,
            bank: (offset >> 16) as u8,
        }
    }
}

/// In-memory representation of the ZSM header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ZsmHeader {
    pub magic: u16,
    pub version: u8,
    pub loop_point: ZsmOffset,
    pub pcm_offset: ZsmOffset,
    pub fm_channel_mask: u8,
    pub psg_channel_mask: u16,
    pub tick_rate: u16,
    pub reserved: u16,
}

impl ZsmHeader {
    /// A version-1 header with the standard magic and a 60 Hz tick rate.
    pub fn new() -> Self {
        Self {
            magic: ZSM_MAGIC,
            version: ZSM_VERSION,
            tick_rate: 60,
            ..Default::default()
        }
    }

    /// True when the stream loops somewhere.
    pub fn has_loop_point(&self) -> bool {
        !self.loop_point.is_zero()
    }

    /// True when the magic matches `"zm"`. Not enforced by the player.
    pub fn has_valid_magic(&self) -> bool {
        self.magic == ZSM_MAGIC
    }

    /// Serialize to the 16-byte on-disk layout.
    pub fn to_bytes(&self) -> [u8; ZSM_HEADER_SIZE] {
        let mut buf = [0u8; ZSM_HEADER_SIZE];
        write_u16(&mut buf, ZsmHeaderField::Magic.offset(), self.magic);
        write_u8(&mut buf, ZsmHeaderField::Version.offset(), self.version);
        self.loop_point
            .write(&mut buf, ZsmHeaderField::LoopPoint.offset());
        self.pcm_offset
            .write(&mut buf, ZsmHeaderField::PcmOffset.offset());
        write_u8(
            &mut buf,
            ZsmHeaderField::FmChannelMask.offset(),
            self.fm_channel_mask,
        );
        write_u16(
            &mut buf,
            ZsmHeaderField::PsgChannelMask.offset(),
            self.psg_channel_mask,
        );
        write_u16(&mut buf, ZsmHeaderField::TickRate.offset(), self.tick_rate);
        write_u16(&mut buf, ZsmHeaderField::Reserved.offset(), self.reserved);
        buf
    }
}

/// Parse a header from the first 16 bytes of `bytes`.
///
/// Only the length is checked here; version validation belongs to the
/// player so that an unsupported header can still be inspected.
impl TryFrom<&[u8]> for ZsmHeader {
    type Error = ZsmError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let too_short = || ZsmError::HeaderTooShort {
            len: bytes.len(),
            needed: ZSM_HEADER_SIZE,
        };
        if bytes.len() < ZSM_HEADER_SIZE {
            return Err(too_short());
        }

        let u16_at = |field: ZsmHeaderField| read_u16_le_at(bytes, field.offset()).ok_or_else(too_short);

        Ok(Self {
            magic: u16_at(ZsmHeaderField::Magic)?,
            version: read_u8_at(bytes, ZsmHeaderField::Version.offset()).ok_or_else(too_short)?,
            loop_point: ZsmOffset::read(bytes, ZsmHeaderField::LoopPoint.offset())
                .ok_or_else(too_short)?,
            pcm_offset: ZsmOffset::read(bytes, ZsmHeaderField::PcmOffset.offset())
                .ok_or_else(too_short)?,
            fm_channel_mask: read_u8_at(bytes, ZsmHeaderField::FmChannelMask.offset())
                .ok_or_else(too_short)?,
            psg_channel_mask: u16_at(ZsmHeaderField::PsgChannelMask)?,
            tick_rate: u16_at(ZsmHeaderField::TickRate)?,
            reserved: u16_at(ZsmHeaderField::Reserved)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_packed_little_endian_fields() {
        let bytes = [
            0x7A, 0x6D, 0x01, 0x34, 0x12, 0x02, 0x00, 0x00, 0x00, 0xFF, 0x0F, 0x00, 0x3C, 0x00,
            0x00, 0x00,
        ];
        let header = ZsmHeader::try_from(&bytes[..]).unwrap();
        assert!(header.has_valid_magic());
        assert_eq!(header.version, 1);
        assert_eq!(
            header.loop_point,
            ZsmOffset {
                address: 0x1234,
                bank: 0x02
            }
        );
        assert_eq!(header.loop_point.absolute(), 0x02_1234);
        assert_eq!(header.fm_channel_mask, 0xFF);
        assert_eq!(header.psg_channel_mask, 0x000F);
        assert_eq!(header.tick_rate, 60);
        assert_eq!(header.to_bytes(), bytes);
    }

    #[test]
    fn short_input_is_rejected() {
        let err = ZsmHeader::try_from(&[0x7A, 0x6D, 0x01][..]).unwrap_err();
        assert_eq!(err, ZsmError::HeaderTooShort { len: 3, needed: 16 });
    }
}
