use std::cell::{Cell, RefCell};
use std::path::Path;

use anyhow::{Context, Result};
use zsmplay::chip::event::StateEvent;
use zsmplay::chip::saa1099::VeraToSaa1099;
use zsmplay::chip::state::Saa1099State;
use zsmplay::zsm::{Repeat, ZsmPlayer};
use zsmplay::{PagedStore, SaaClock, ZsmHeader};

/// Options for the `play` subcommand
pub struct PlayOptions {
    pub repeat: Repeat,
    pub clock: SaaClock,
    pub translate: bool,
    pub max_ticks: u64,
    pub dry_run: bool,
}

/// Run the player offline and log every register write with its tick
pub fn play_zsm(file_path: &Path, data: Vec<u8>, options: &PlayOptions) -> Result<()> {
    let dry_run = options.dry_run;
    let header = ZsmHeader::try_from(&data[..])
        .with_context(|| format!("failed to parse ZSM header: {}", file_path.display()))?;
    let store = PagedStore::load(&data)
        .with_context(|| format!("failed to load ZSM file: {}", file_path.display()))?;

    if !dry_run {
        println!("=== ZSM File: {} ===", file_path.display());
        println!("Tick Rate: {} Hz", header.tick_rate);
        println!("FM Channels: 0x{:02X}", header.fm_channel_mask);
        println!("PSG Channels: 0x{:04X}", header.psg_channel_mask);
        println!("Loop Point: 0x{:06X}", header.loop_point.absolute());
        if options.translate {
            println!("SAA1099 Clock: {}", options.clock);
        }
        println!();
        println!("Register Write Log:");
        println!("{:<12} {:<40} Events", "Tick", "Register Write");
        println!("{}", "-".repeat(100));
    }

    let tick = Cell::new(0u64);
    let states = RefCell::new([
        Saa1099State::new(options.clock.hz() as f64),
        Saa1099State::new(options.clock.hz() as f64),
    ]);

    let fm = |register: u8, data: u8| {
        let reg_info = format!("Ym2151 0x{:02X}=0x{:02X}", register, data);
        print_register_log(tick.get(), &reg_info, None, dry_run);
    };

    let saa_port = |chip: u8, register: u8, data: u8| {
        let events = states
            .borrow_mut()
            .get_mut(chip as usize)
            .and_then(|state| state.on_register_write(register, data));
        let reg_info = format!("Saa1099[{}] 0x{:02X}=0x{:02X}", chip, register, data);
        print_register_log(tick.get(), &reg_info, events, dry_run);
    };
    let translator =
        RefCell::new(options.translate.then(|| VeraToSaa1099::new(options.clock, saa_port)));

    let psg = |address: u8, data: u8| {
        if let Some(translator) = translator.borrow_mut().as_mut() {
            translator.write_psg(address, data);
        } else {
            let reg_info = format!(
                "VeraPsg ch{} reg{} 0x{:02X}",
                address >> 2,
                address & 0x03,
                data
            );
            print_register_log(tick.get(), &reg_info, None, dry_run);
        }
    };

    let mut player = ZsmPlayer::new(store, fm, psg)
        .with_context(|| format!("failed to start ZSM file: {}", file_path.display()))?;

    player.start(options.repeat);
    while player.is_playing() && tick.get() < options.max_ticks {
        player.tick();
        tick.set(tick.get() + 1);
    }

    let finished = !player.is_playing();
    player.stop();
    drop(player);

    if let Some(translator) = translator.into_inner() {
        translator.terminate();
    }

    if !dry_run {
        println!();
        if finished {
            println!("=== Playback Complete ({} ticks) ===", tick.get());
        } else {
            println!("=== Stopped after {} ticks ===", tick.get());
        }
    }

    Ok(())
}

/// Helper function to print register log line with events
fn print_register_log(tick: u64, reg_info: &str, events: Option<Vec<StateEvent>>, dry_run: bool) {
    if dry_run {
        return;
    }
    let event_str = events
        .map(|evs| evs.iter().map(format_event).collect::<Vec<_>>().join(", "))
        .unwrap_or_default();

    println!("{:<12} {:<40} {}", tick, reg_info, event_str);
}

/// Format a StateEvent for display
fn format_event(event: &StateEvent) -> String {
    match event {
        StateEvent::KeyOn { channel, tone } => {
            format!("KeyOn(ch={}, freq={:.2}Hz)", channel, tone.freq_hz)
        }
        StateEvent::KeyOff { channel } => format!("KeyOff(ch={})", channel),
        StateEvent::ToneChange { channel, tone } => {
            format!("ToneChange(ch={}, freq={:.2}Hz)", channel, tone.freq_hz)
        }
    }
}
