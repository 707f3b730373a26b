use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use zsmplay::zsm::Repeat;
use zsmplay::{SaaClock, SaaymConfig};

mod play;
mod table;
mod zsm;
use play::{PlayOptions, play_zsm};
use table::print_table;
use zsm::{dump as zsm_dump, info as zsm_info, read_zsm_as_vec};

/// zsmplay command line tools
#[derive(Parser)]
#[command(
    name = env!("CARGO_PKG_NAME"),
    version = env!("CARGO_PKG_VERSION"),
    about = env!("CARGO_PKG_DESCRIPTION"),
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show header summary for a ZSM file (accepts .zsm or .zsm.gz; use '-' for stdin)
    Info {
        /// Input file to read (use '-' for stdin)
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// List the decoded commands of a ZSM file with their offsets
    Dump {
        /// Input file to read (use '-' for stdin)
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Play a ZSM file offline and display register writes with events
    Play {
        /// Input file to read (use '-' for stdin)
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Number of times to replay from the loop point
        #[arg(long, default_value_t = 0, conflicts_with = "forever")]
        repeat: u8,
        /// Replay from the loop point until --max-ticks is reached
        #[arg(long)]
        forever: bool,
        /// SAA1099 clock index (0 = 7.15909 MHz, 1 = 8 MHz); defaults to SAAYM's S value
        #[arg(long, value_name = "INDEX")]
        saa_clock: Option<i64>,
        /// Log VERA PSG writes as-is instead of translating them to SAA1099
        #[arg(long)]
        no_translate: bool,
        /// Stop after this many ticks
        #[arg(long, default_value_t = 60 * 60 * 10)]
        max_ticks: u64,
        /// Process the file without printing the register log
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the VERA to SAA1099 frequency table
    Table {
        /// SAA1099 clock index (0 = 7.15909 MHz, 1 = 8 MHz); defaults to SAAYM's S value
        #[arg(long, value_name = "INDEX")]
        saa_clock: Option<i64>,
        /// First VERA frequency word
        #[arg(long, value_parser = parse_word)]
        from: Option<u16>,
        /// Last VERA frequency word
        #[arg(long, value_parser = parse_word)]
        to: Option<u16>,
        /// Print every Nth word
        #[arg(long, default_value_t = 256)]
        step: u16,
    },
}

/// Accept decimal or 0x-prefixed hexadecimal words
fn parse_word(s: &str) -> Result<u16, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid frequency word '{}': {}", s, e))
}

/// Clock from the command line, else from `SAAYM`, else the default
fn resolve_clock(index: Option<i64>) -> Result<SaaClock> {
    if let Some(index) = index {
        return Ok(SaaClock::from_index(index));
    }
    let config = SaaymConfig::from_env().context("invalid SAAYM environment variable")?;
    Ok(config.map(|c| c.saa1099_clock_or_default()).unwrap_or_default())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Info { file } => {
            let bytes = read_zsm_as_vec(&file)?;
            zsm_info(&file, bytes)?;
        }
        Commands::Dump { file } => {
            let bytes = read_zsm_as_vec(&file)?;
            zsm_dump(&file, bytes)?;
        }
        Commands::Play {
            file,
            repeat,
            forever,
            saa_clock,
            no_translate,
            max_ticks,
            dry_run,
        } => {
            let options = PlayOptions {
                repeat: if forever {
                    Repeat::FOREVER
                } else {
                    Repeat::times(repeat)
                },
                clock: resolve_clock(saa_clock)?,
                translate: !no_translate,
                max_ticks,
                dry_run,
            };
            let bytes = read_zsm_as_vec(&file)?;
            play_zsm(&file, bytes, &options)?;
        }
        Commands::Table {
            saa_clock,
            from,
            to,
            step,
        } => {
            print_table(resolve_clock(saa_clock)?, from, to, step)?;
        }
    }

    Ok(())
}
