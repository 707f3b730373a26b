//! ZSM command byte decoding.
//!
//! Every event in a ZSM stream starts with one command byte:
//!
//! | byte          | command                                           |
//! |---------------|---------------------------------------------------|
//! | `0x00..=0x3F` | PSG write; low 6 bits are the address, one data byte follows |
//! | `0x40`        | extension; one byte follows, low 6 bits skip ahead |
//! | `0x41..=0x7F` | FM write; low 6 bits count the (address, data) pairs that follow |
//! | `0x80`        | end of stream                                     |
//! | `0x81..=0xFF` | delay; low 7 bits are the tick count               |

pub const CMD_PSG_WRITE_FIRST: u8 = 0x00;
pub const CMD_PSG_WRITE_LAST: u8 = 0x3F;
pub const CMD_EXTENSION: u8 = 0x40;
pub const CMD_FM_WRITE_FIRST: u8 = 0x41;
pub const CMD_FM_WRITE_LAST: u8 = 0x7F;
pub const CMD_END_OF_STREAM: u8 = 0x80;
pub const CMD_DELAY_FIRST: u8 = 0x81;
pub const CMD_DELAY_LAST: u8 = 0xFF;

pub(crate) const MASK_PSG_ADDRESS: u8 = 0x3F;
pub(crate) const MASK_EXTENSION_DATA: u8 = 0x3F;
pub(crate) const MASK_FM_PAIRS: u8 = 0x3F;
pub(crate) const MASK_DELAY: u8 = 0x7F;

/// Largest pair count a single FM write command can carry.
pub const MAX_FM_PAIRS: usize = MASK_FM_PAIRS as usize;

/// Largest tick count a single delay command can carry.
pub const MAX_DELAY_TICKS: u8 = MASK_DELAY;

/// Decoded command byte. Operands that follow in the stream are not part
/// of this value; the player reads them as it executes the command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZsmCommand {
    /// Write one data byte to the VERA PSG register `address` (0..=63).
    PsgWrite { address: u8 },
    /// Extension; the following byte carries a relative skip.
    Extension,
    /// `pairs` YM2151 (address, data) pairs follow.
    FmWrite { pairs: u8 },
    /// End of stream; loop or stop.
    EndOfStream,
    /// Wait `ticks` ticks (1..=127) before the next command.
    Delay { ticks: u8 },
}

impl ZsmCommand {
    /// Classify a command byte.
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            CMD_PSG_WRITE_FIRST..=CMD_PSG_WRITE_LAST => ZsmCommand::PsgWrite {
                address: byte & MASK_PSG_ADDRESS,
            },
            CMD_EXTENSION => ZsmCommand::Extension,
            CMD_FM_WRITE_FIRST..=CMD_FM_WRITE_LAST => ZsmCommand::FmWrite {
                pairs: byte & MASK_FM_PAIRS,
            },
            CMD_END_OF_STREAM => ZsmCommand::EndOfStream,
            CMD_DELAY_FIRST..=CMD_DELAY_LAST => ZsmCommand::Delay {
                ticks: byte & MASK_DELAY,
            },
        }
    }

    /// Number of operand bytes that follow the command byte.
    pub fn operand_len(self) -> usize {
        match self {
            ZsmCommand::PsgWrite { .. } | ZsmCommand::Extension => 1,
            ZsmCommand::FmWrite { pairs } => pairs as usize * 2,
            ZsmCommand::EndOfStream | ZsmCommand::Delay { .. } => 0,
        }
    }
}

impl From<u8> for ZsmCommand {
    fn from(byte: u8) -> Self {
        ZsmCommand::from_byte(byte)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_range_boundaries() {
        assert_eq!(ZsmCommand::from_byte(0x00), ZsmCommand::PsgWrite { address: 0 });
        assert_eq!(ZsmCommand::from_byte(0x3F), ZsmCommand::PsgWrite { address: 63 });
        assert_eq!(ZsmCommand::from_byte(0x40), ZsmCommand::Extension);
        assert_eq!(ZsmCommand::from_byte(0x41), ZsmCommand::FmWrite { pairs: 1 });
        assert_eq!(ZsmCommand::from_byte(0x7F), ZsmCommand::FmWrite { pairs: 63 });
        assert_eq!(ZsmCommand::from_byte(0x80), ZsmCommand::EndOfStream);
        assert_eq!(ZsmCommand::from_byte(0x81), ZsmCommand::Delay { ticks: 1 });
        assert_eq!(ZsmCommand::from_byte(0xFF), ZsmCommand::Delay { ticks: 127 });
    }

    #[test]
    fn operand_lengths() {
        assert_eq!(ZsmCommand::from_byte(0x12).operand_len(), 1);
        assert_eq!(ZsmCommand::from_byte(0x43).operand_len(), 6);
        assert_eq!(ZsmCommand::from_byte(0x90).operand_len(), 0);
    }
}
