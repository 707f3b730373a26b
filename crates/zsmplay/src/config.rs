//! Hardware configuration for an SAA1099 + YM2151 sound card.
//!
//! The configuration is read from the `SAAYM` environment variable, a list
//! of whitespace-separated tokens, each a one-letter key (case-insensitive)
//! followed immediately by its value:
//!
//! | token | meaning                                                |
//! |-------|--------------------------------------------------------|
//! | `A`   | base I/O port, hexadecimal (`A220`)                    |
//! | `I`   | IRQ number, decimal (`I7`)                             |
//! | `Y`   | YM2151 clock: 0 = 3.579545 MHz, 1 = 4 MHz              |
//! | `S`   | SAA1099 clock: 0 = 7.15909 MHz, 1 = 8 MHz              |
//!
//! Clock indices outside the valid range are clamped to it.
//!
//! # Examples
//!
//! ```
//! use zsmplay::chip::SaaClock;
//! use zsmplay::config::{SaaymConfig, Ym2151Clock};
//!
//! let config = SaaymConfig::parse("A220 I7 Y1 S5").unwrap();
//! assert_eq!(config.base_port, Some(0x220));
//! assert_eq!(config.irq, Some(7));
//! assert_eq!(config.ym2151_clock, Some(Ym2151Clock::Mhz4));
//! assert_eq!(config.saa1099_clock, Some(SaaClock::Mhz8));
//! ```

use crate::chip::SaaClock;
use crate::error::ConfigError;

/// Environment variable holding the card configuration.
pub const SAAYM_ENV_VAR: &str = "SAAYM";

/// YM2151 register port, relative to the base port.
pub const SAAYM_PORT_OFFSET_YM2151: u16 = 0x0E;

/// Each SAA1099 occupies two ports (data, address) from the base port up.
const SAAYM_PORTS_PER_SAA1099: u16 = 2;

/// Supported YM2151 input clocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Ym2151Clock {
    /// 3.579545 MHz, the NTSC color burst.
    #[default]
    Mhz3_579545,
    /// 4 MHz.
    Mhz4,
}

impl Ym2151Clock {
    /// Clock for a configuration index, clamped to the valid range.
    pub fn from_index(index: i64) -> Self {
        if index <= 0 {
            Ym2151Clock::Mhz3_579545
        } else {
            Ym2151Clock::Mhz4
        }
    }
}

/// Parsed `SAAYM` configuration. Keys that were not given stay `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SaaymConfig {
    pub base_port: Option<u16>,
    pub irq: Option<u8>,
    pub ym2151_clock: Option<Ym2151Clock>,
    pub saa1099_clock: Option<SaaClock>,
}

impl SaaymConfig {
    /// Parse a configuration string.
    pub fn parse(input: &str) -> Result<Self, ConfigError> {
        let mut config = SaaymConfig::default();

        for token in input.split_whitespace() {
            let mut chars = token.chars();
            let Some(key) = chars.next() else {
                continue;
            };
            let value = chars.as_str();
            let invalid = || ConfigError::InvalidValue {
                key,
                value: value.to_string(),
            };

            match key.to_ascii_lowercase() {
                'a' => {
                    let digits = value
                        .strip_prefix("0x")
                        .or_else(|| value.strip_prefix("0X"))
                        .unwrap_or(value);
                    let port = u16::from_str_radix(digits, 16).map_err(|_| invalid())?;
                    config.base_port = Some(port);
                }
                'i' => config.irq = Some(value.parse().map_err(|_| invalid())?),
                'y' => {
                    let index: i64 = value.parse().map_err(|_| invalid())?;
                    config.ym2151_clock = Some(Ym2151Clock::from_index(index));
                }
                's' => {
                    let index: i64 = value.parse().map_err(|_| invalid())?;
                    config.saa1099_clock = Some(SaaClock::from_index(index));
                }
                _ => return Err(ConfigError::UnknownKey(key)),
            }
        }

        Ok(config)
    }

    /// Read and parse the `SAAYM` environment variable.
    ///
    /// `Ok(None)` when the variable is not set.
    pub fn from_env() -> Result<Option<Self>, ConfigError> {
        match std::env::var(SAAYM_ENV_VAR) {
            Ok(value) => {
                let config = Self::parse(&value)?;
                log::debug!("{}={:?} -> {:?}", SAAYM_ENV_VAR, value, config);
                Ok(Some(config))
            }
            Err(_) => Ok(None),
        }
    }

    /// Base port, or [`ConfigError::MissingBasePort`]. A port of 0 counts as
    /// missing.
    pub fn require_port(&self) -> Result<u16, ConfigError> {
        self.base_port
            .filter(|&port| port != 0)
            .ok_or(ConfigError::MissingBasePort)
    }

    /// YM2151 register port.
    pub fn ym2151_port(&self) -> Result<u16, ConfigError> {
        Ok(self.require_port()?.saturating_add(SAAYM_PORT_OFFSET_YM2151))
    }

    /// Data port of SAA1099 `chip`; its address port is the next one.
    pub fn saa1099_port(&self, chip: u8) -> Result<u16, ConfigError> {
        Ok(self
            .require_port()?
            .saturating_add(chip as u16 * SAAYM_PORTS_PER_SAA1099))
    }

    /// SAA1099 clock, defaulting to 7.15909 MHz.
    pub fn saa1099_clock_or_default(&self) -> SaaClock {
        self.saa1099_clock.unwrap_or_default()
    }
}

impl std::str::FromStr for SaaymConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
