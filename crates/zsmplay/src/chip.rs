//! Sound-chip support: VERA PSG register layout, SAA1099 frequency tables,
//! the VERA-to-SAA1099 translator and an SAA1099 state tracker.
pub mod cache;
pub mod event;
pub mod frequency;
pub mod saa1099;
pub mod state;
pub mod vera;

pub use frequency::{FrequencyTable, PackedFrequency, SaaClock};
pub use saa1099::{Saa1099Port, VeraToSaa1099};
pub use state::Saa1099State;
