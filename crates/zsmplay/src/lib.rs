#![doc = include_str!("../README.md")]
//! zsmplay: paged loader, tick-driven player and SAA1099 translation for ZSM streams
//!
//! A ZSM stream is a 16-byte header followed by a byte-code of register
//! writes for a YM2151 (FM) and the VERA PSG, separated by tick delays and
//! terminated by an end-of-stream command that may jump back to a loop
//! point.
//!
//! Crate layout:
//! - [`store`]: `PagedStore`, the loaded stream split into fixed-size pages,
//!   with absolute addressing and a rolling cursor.
//! - [`zsm`]: header codec, command decoding, `ZsmPlayer` and `ZsmBuilder`.
//! - [`chip`]: VERA PSG register layout, SAA1099 frequency tables, the
//!   `VeraToSaa1099` translator and the `Saa1099State` tracker.
//! - [`config`]: `SAAYM` hardware configuration.
//!
//! Only loading and player construction can fail. `tick()` is infallible:
//! out-of-range frequencies are clamped and a stream that runs past the
//! end of its data stops playback with a logged warning.
//!
//! Diagnostics go through the [`log`] facade; install any logger to see
//! them.
//!
//! Example: driving a player from a tick loop
//!
//! ```rust
//! use zsmplay::store::PagedStore;
//! use zsmplay::zsm::{NullWriter, PlayerState, Repeat, ZsmBuilder, ZsmPlayer};
//!
//! let mut builder = ZsmBuilder::new();
//! builder.fm_write(&[(0x20, 0xC7), (0x08, 0x78)]).delay(2);
//! let bytes = builder.finalize();
//!
//! let store = PagedStore::load(&bytes).unwrap();
//! let mut fm_writes = 0;
//! let mut player = ZsmPlayer::new(store, |_address: u8, _data: u8| fm_writes += 1, NullWriter).unwrap();
//!
//! assert_eq!(player.state(), PlayerState::Idle);
//! player.start(Repeat::ONCE);
//! let mut ticks = 0;
//! while player.is_playing() {
//!     player.tick();
//!     ticks += 1;
//! }
//! assert_eq!(player.state(), PlayerState::Stopped);
//! assert_eq!(ticks, 4);
//! drop(player);
//! assert_eq!(fm_writes, 2);
//! ```
mod binutil;
pub mod chip;
pub mod config;
pub mod error;
pub mod store;
pub mod zsm;

pub use chip::{SaaClock, VeraToSaa1099};
pub use config::SaaymConfig;
pub use error::{ConfigError, Result, StoreError, ZsmError};
pub use store::{PagedStore, StoreConfig};
pub use zsm::{Repeat, ZsmBuilder, ZsmHeader, ZsmPlayer};
