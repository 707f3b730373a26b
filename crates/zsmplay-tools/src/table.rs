use anyhow::{Result, bail};
use zsmplay::SaaClock;
use zsmplay::chip::FrequencyTable;
use zsmplay::chip::vera;

use comfy_table::{Cell, CellAlignment, ContentArrangement, Table, presets::NOTHING};

/// Print the VERA word to SAA1099 mapping for `clock`.
///
/// `from`/`to` default to the ends of the representable range.
pub fn print_table(clock: SaaClock, from: Option<u16>, to: Option<u16>, step: u16) -> Result<()> {
    if step == 0 {
        bail!("--step must be at least 1");
    }
    let from = from.unwrap_or(clock.min_word());
    let to = to.unwrap_or(clock.max_word());
    if from > to {
        bail!("empty word range 0x{:04X}..=0x{:04X}", from, to);
    }

    let frequency_table = FrequencyTable::build(clock);

    let mut table = Table::new();
    table.load_preset(NOTHING);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Word"),
        Cell::new("VERA Hz"),
        Cell::new("Octave"),
        Cell::new("Freq"),
        Cell::new("SAA1099 Hz"),
        Cell::new("Error"),
    ]);

    for word in (from..=to).step_by(step as usize) {
        let entry = frequency_table.lookup(word);
        let vera_hz = vera::frequency_hz(word);
        let saa_hz = entry.hz(clock);
        let error = if vera_hz > 0.0 {
            format!("{:+.2}%", (saa_hz - vera_hz) / vera_hz * 100.0)
        } else {
            "-".to_string()
        };
        table.add_row(vec![
            Cell::new(format!("0x{:04X}", word)),
            Cell::new(format!("{:.2}", vera_hz)).set_alignment(CellAlignment::Right),
            Cell::new(entry.octave).set_alignment(CellAlignment::Right),
            Cell::new(format!("0x{:02X}", entry.frequency)),
            Cell::new(format!("{:.2}", saa_hz)).set_alignment(CellAlignment::Right),
            Cell::new(error).set_alignment(CellAlignment::Right),
        ]);
    }

    println!(
        "SAA1099 @ {} ({} entries, words 0x{:04X}..=0x{:04X})",
        clock,
        frequency_table.len(),
        clock.min_word(),
        clock.max_word()
    );
    println!("{}", table);
    Ok(())
}
