//! ZSM stream format and playback.
//!
//! This module exposes the header codec, command decoding, the
//! tick-driven player, the register-writer seam the player dispatches
//! through, and a builder for assembling streams programmatically.
mod builder;
pub mod command;
mod header;
pub mod player;
mod writer;

pub use builder::ZsmBuilder;
pub use command::ZsmCommand;
pub use header::{ZSM_HEADER_SIZE, ZSM_MAGIC, ZSM_VERSION, ZsmHeader, ZsmHeaderField, ZsmOffset};
pub use player::{PlaybackControl, PlayerState, REPEAT_FOREVER, Repeat, ZsmPlayer};
pub use writer::{NullWriter, RegisterWriter};
