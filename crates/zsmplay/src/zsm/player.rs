//! Tick-driven ZSM interpreter.
//!
//! `ZsmPlayer` owns a loaded [`PagedStore`] and two register writers, one for
//! the FM device (YM2151) and one for the PSG device (VERA PSG). An external
//! scheduler calls [`ZsmPlayer::tick`] at the header's tick rate; each call
//! runs every command up to the next non-zero delay.
//!
//! # Examples
//!
//! ```
//! use std::cell::RefCell;
//!
//! use zsmplay::zsm::{NullWriter, Repeat, ZsmBuilder, ZsmPlayer};
//!
//! let mut builder = ZsmBuilder::new();
//! builder.psg_write(0x02, 0x3F).delay(1);
//! let bytes = builder.finalize();
//!
//! let writes = RefCell::new(Vec::new());
//! let mut player = ZsmPlayer::from_bytes(
//!     &bytes,
//!     NullWriter,
//!     |address: u8, data: u8| writes.borrow_mut().push((address, data)),
//! )
//! .unwrap();
//!
//! player.start(Repeat::ONCE);
//! while player.is_playing() {
//!     player.tick();
//! }
//! drop(player);
//! assert_eq!(writes.into_inner(), vec![(0x02, 0x3F)]);
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use crate::error::{Result, ZsmError};
use crate::store::{Cursor, PagedStore, SeekOrigin};
use crate::zsm::command::{MASK_EXTENSION_DATA, ZsmCommand};
use crate::zsm::header::{ZSM_HEADER_SIZE, ZSM_VERSION, ZsmHeader};
use crate::zsm::writer::RegisterWriter;

/// Repeat-forever flag in a [`Repeat`] value.
pub const REPEAT_FOREVER: u16 = 0x8000;

/// Counter value that stands for "forever"; refilled whenever it runs out.
const REPEAT_FOREVER_COUNT: u8 = 0xFF;

const REPEAT_COUNT_MASK: u16 = 0x00FF;

/// Repeat control passed to [`ZsmPlayer::start`].
///
/// Bit 15 requests endless looping; the low byte is an explicit loop count.
/// A count of 0 plays the stream once even when it has a loop point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Repeat(pub u16);

impl Repeat {
    /// Play once, never loop.
    pub const ONCE: Repeat = Repeat(0);
    /// Loop until stopped.
    pub const FOREVER: Repeat = Repeat(REPEAT_FOREVER);

    /// Loop `count` times after the first pass.
    pub fn times(count: u8) -> Self {
        Repeat(count as u16)
    }

    pub fn is_forever(self) -> bool {
        self.0 & REPEAT_FOREVER != 0
    }

    /// Initial value of the remaining-repeat counter.
    pub fn initial_count(self) -> u8 {
        if self.is_forever() {
            REPEAT_FOREVER_COUNT
        } else {
            (self.0 & REPEAT_COUNT_MASK) as u8
        }
    }
}

impl From<u16> for Repeat {
    fn from(value: u16) -> Self {
        Repeat(value)
    }
}

/// Lifecycle of a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PlayerState {
    /// Initialized; neither started nor stopped yet.
    Idle,
    /// Started and not yet stopped.
    Playing,
    /// Stopped by request or by reaching the end of the stream.
    Stopped,
}

impl PlayerState {
    fn from_u8(value: u8) -> Self {
        match value {
            v if v == PlayerState::Playing as u8 => PlayerState::Playing,
            v if v == PlayerState::Stopped as u8 => PlayerState::Stopped,
            _ => PlayerState::Idle,
        }
    }
}

/// Lifecycle state shared between a player and its control handles.
#[derive(Debug)]
struct SharedState(AtomicU8);

impl SharedState {
    fn new() -> Self {
        SharedState(AtomicU8::new(PlayerState::Idle as u8))
    }

    fn get(&self) -> PlayerState {
        PlayerState::from_u8(self.0.load(Ordering::Acquire))
    }

    fn set(&self, state: PlayerState) {
        self.0.store(state as u8, Ordering::Release);
    }
}

/// Cloneable handle for controlling playback from another context.
///
/// The player re-checks the state before every command, so after
/// [`PlaybackControl::stop`] at most the command in flight completes.
#[derive(Debug, Clone)]
pub struct PlaybackControl {
    state: Arc<SharedState>,
}

impl PlaybackControl {
    /// Move the player to [`PlayerState::Stopped`], whatever its state.
    pub fn stop(&self) {
        self.state.set(PlayerState::Stopped);
    }

    pub fn is_playing(&self) -> bool {
        self.state.get() == PlayerState::Playing
    }

    pub fn state(&self) -> PlayerState {
        self.state.get()
    }
}

type Writer<'a> = Box<dyn RegisterWriter + 'a>;

/// ZSM stream interpreter.
///
/// Only [`ZsmPlayer::tick`] mutates the cursor, delay counter and repeat
/// counter.
pub struct ZsmPlayer<'a> {
    store: PagedStore,
    header: ZsmHeader,
    fm: Option<Writer<'a>>,
    psg: Option<Writer<'a>>,
    cursor: Cursor,
    state: Arc<SharedState>,
    start_latency: bool,
    repeat: Repeat,
    delay_ticks: u8,
    repeat_remaining: u8,
    elapsed_ticks: u64,
}

impl<'a> ZsmPlayer<'a> {
    /// Bind `store` to an FM and a PSG writer.
    ///
    /// A writer is bound only when the header's channel mask for its device
    /// is non-zero and the writer is not a null sink. Fails with
    /// [`ZsmError::UnsupportedVersion`] for any version other than 1 and with
    /// [`ZsmError::NothingToPlay`] when neither writer gets bound.
    pub fn new(
        store: PagedStore,
        fm: impl RegisterWriter + 'a,
        psg: impl RegisterWriter + 'a,
    ) -> Result<Self> {
        let mut raw = [0u8; ZSM_HEADER_SIZE];
        let read = store.read_at(0, &mut raw);
        let header = ZsmHeader::try_from(&raw[..read])?;

        if header.version != ZSM_VERSION {
            return Err(ZsmError::UnsupportedVersion(header.version));
        }
        if !header.has_valid_magic() {
            log::warn!("unexpected ZSM magic 0x{:04X}", header.magic);
        }

        let fm: Option<Writer<'a>> = (header.fm_channel_mask != 0 && !fm.is_null())
            .then(|| Box::new(fm) as Writer<'a>);
        let psg: Option<Writer<'a>> = (header.psg_channel_mask != 0 && !psg.is_null())
            .then(|| Box::new(psg) as Writer<'a>);

        if fm.is_none() && psg.is_none() {
            return Err(ZsmError::NothingToPlay);
        }

        let mut cursor = store.cursor();
        store.seek(&mut cursor, ZSM_HEADER_SIZE as i32, SeekOrigin::Set);

        log::debug!(
            "ZSM v{} tick rate {} Hz, loop 0x{:04X}(0x{:02X}), fm={} psg={}",
            header.version,
            header.tick_rate,
            header.loop_point.address,
            header.loop_point.bank,
            fm.is_some(),
            psg.is_some()
        );

        Ok(Self {
            store,
            header,
            fm,
            psg,
            cursor,
            state: Arc::new(SharedState::new()),
            start_latency: false,
            repeat: Repeat::ONCE,
            delay_ticks: 0,
            repeat_remaining: 0,
            elapsed_ticks: 0,
        })
    }

    /// Load `bytes` with the default page layout and bind the writers.
    pub fn from_bytes(
        bytes: &[u8],
        fm: impl RegisterWriter + 'a,
        psg: impl RegisterWriter + 'a,
    ) -> Result<Self> {
        let store = PagedStore::load(bytes)?;
        Self::new(store, fm, psg)
    }

    /// Begin (or resume) playback.
    ///
    /// Playback continues from the current cursor; the first command runs on
    /// the second tick after this call.
    pub fn start(&mut self, repeat: impl Into<Repeat>) {
        let repeat = repeat.into();
        self.delay_ticks = 1;
        self.repeat = repeat;
        self.repeat_remaining = repeat.initial_count();
        self.start_latency = true;
        self.state.set(PlayerState::Playing);
    }

    /// Stop playback. The player reports [`PlayerState::Stopped`] afterwards
    /// even when it was never started.
    pub fn stop(&self) {
        self.state.set(PlayerState::Stopped);
    }

    pub fn is_playing(&self) -> bool {
        self.state.get() == PlayerState::Playing
    }

    /// Handle for stopping or polling playback from elsewhere.
    pub fn control(&self) -> PlaybackControl {
        PlaybackControl {
            state: Arc::clone(&self.state),
        }
    }

    pub fn state(&self) -> PlayerState {
        self.state.get()
    }

    pub fn header(&self) -> ZsmHeader {
        self.header
    }

    pub fn store(&self) -> &PagedStore {
        &self.store
    }

    /// Absolute offset of the next command byte.
    pub fn position(&self) -> u64 {
        self.cursor.position()
    }

    pub fn delay_ticks(&self) -> u8 {
        self.delay_ticks
    }

    pub fn repeat_remaining(&self) -> u8 {
        self.repeat_remaining
    }

    /// Ticks processed while playing.
    pub fn elapsed_ticks(&self) -> u64 {
        self.elapsed_ticks
    }

    /// Move the cursor back to the first command after the header.
    pub fn rewind(&mut self) {
        self.store
            .seek(&mut self.cursor, ZSM_HEADER_SIZE as i32, SeekOrigin::Set);
    }

    /// Advance playback by one tick.
    ///
    /// Runs commands until a delay is scheduled or playback stops. The first
    /// tick after [`ZsmPlayer::start`] only consumes the start delay. A stream
    /// made only of zero-delay commands can keep a single tick busy for a
    /// long time; bounding that is up to the stream's author.
    pub fn tick(&mut self) {
        if !self.is_playing() {
            return;
        }
        self.elapsed_ticks += 1;

        if self.delay_ticks > 0 {
            self.delay_ticks -= 1;
        }
        if std::mem::take(&mut self.start_latency) {
            return;
        }

        while self.is_playing() && self.delay_ticks == 0 {
            if self.step().is_none() {
                log::warn!(
                    "stream ran past the end of loaded data ({} bytes); stopping",
                    self.store.len()
                );
                self.halt();
            }
        }
    }

    fn next_byte(&mut self) -> Option<u8> {
        self.store.read_and_advance(&mut self.cursor)
    }

    /// Decode and execute one command. `None` when the store ran dry.
    fn step(&mut self) -> Option<()> {
        let command = ZsmCommand::from_byte(self.next_byte()?);
        log::trace!("0x{:06X}: {:?}", self.cursor.position(), command);

        match command {
            ZsmCommand::PsgWrite { address } => {
                let data = self.next_byte()?;
                if let Some(psg) = self.psg.as_mut() {
                    psg.write(address, data);
                }
            }
            ZsmCommand::Extension => {
                let extension = self.next_byte()?;
                self.store.seek(
                    &mut self.cursor,
                    (extension & MASK_EXTENSION_DATA) as i32,
                    SeekOrigin::Current,
                );
            }
            ZsmCommand::FmWrite { pairs } => {
                for _ in 0..pairs {
                    let address = self.next_byte()?;
                    let data = self.next_byte()?;
                    if let Some(fm) = self.fm.as_mut() {
                        fm.write(address, data);
                    }
                }
            }
            ZsmCommand::EndOfStream => self.end_of_stream(),
            ZsmCommand::Delay { ticks } => self.delay_ticks = ticks,
        }

        Some(())
    }

    fn end_of_stream(&mut self) {
        if self.repeat_remaining > 0 && self.header.has_loop_point() {
            let loop_offset = self.header.loop_point.absolute();
            self.store
                .seek(&mut self.cursor, loop_offset as i32, SeekOrigin::Set);

            self.repeat_remaining -= 1;
            if self.repeat.is_forever() && self.repeat_remaining == 0 {
                self.repeat_remaining = REPEAT_FOREVER_COUNT;
            }
            log::debug!(
                "looping to 0x{:06X}, {} repeat(s) left",
                loop_offset,
                self.repeat_remaining
            );
        } else {
            log::debug!("end of stream after {} ticks", self.elapsed_ticks);
            self.halt();
        }
    }

    fn halt(&mut self) {
        self.state.set(PlayerState::Stopped);
        self.delay_ticks = 0;
    }
}

impl std::fmt::Debug for ZsmPlayer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZsmPlayer")
            .field("header", &self.header)
            .field("state", &self.state())
            .field("position", &self.cursor.position())
            .field("delay_ticks", &self.delay_ticks)
            .field("repeat", &self.repeat)
            .field("repeat_remaining", &self.repeat_remaining)
            .finish_non_exhaustive()
    }
}
