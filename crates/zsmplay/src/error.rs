//! Error types for loading, initializing and configuring ZSM playback.
//!
//! Only load and initialization are fallible. Once a [`ZsmPlayer`] exists,
//! ticking it never returns an error.
//!
//! [`ZsmPlayer`]: crate::zsm::ZsmPlayer

/// Capacity errors raised while partitioning input into pages.
///
/// Kept distinct from I/O failures so callers can report "insufficient
/// memory" separately from "unreadable file".
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The input was empty; a store always owns at least one page.
    #[error("no data to load")]
    Empty,

    /// The input needs more pages than the store is configured to hold.
    #[error("insufficient memory: {needed} pages needed, at most {max} available")]
    OutOfPages { needed: usize, max: usize },

    /// A page size of zero was requested.
    #[error("invalid page size: {0}")]
    InvalidPageSize(usize),
}

/// Format errors raised when binding a store to a player.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ZsmError {
    /// Error from the underlying page store.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The stream is shorter than the fixed 16-byte header.
    #[error("header too short: {len} bytes (need {needed})")]
    HeaderTooShort { len: usize, needed: usize },

    /// The header carries a version this player does not decode.
    #[error("version {0} ZSM files are not supported")]
    UnsupportedVersion(u8),

    /// Neither the FM nor the PSG device has both data and a writer.
    #[error("nothing to play; no FM or PSG data, or no suitable writer to play on")]
    NothingToPlay,
}

/// Errors raised while parsing hardware configuration.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A token's value could not be parsed.
    #[error("invalid value for '{key}': {value:?}")]
    InvalidValue { key: char, value: String },

    /// A token key that the configuration syntax does not define.
    #[error("unknown configuration key '{0}'")]
    UnknownKey(char),

    /// No base I/O port was configured.
    #[error("no base I/O port configured")]
    MissingBasePort,

    /// A chip clock that has no frequency table.
    #[error("unsupported SAA1099 clock: {0} Hz")]
    UnsupportedClock(u32),
}

/// Result type for ZSM operations.
pub type Result<T> = std::result::Result<T, ZsmError>;
