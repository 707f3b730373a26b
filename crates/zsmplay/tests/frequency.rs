use zsmplay::chip::frequency::{FrequencyTable, PackedFrequency, SAA1099_MAX_OCTAVE, SaaClock};
use zsmplay::chip::vera;

#[test]
fn test_table_covers_representable_range() {
    for clock in SaaClock::ALL {
        let table = FrequencyTable::build(clock);
        assert_eq!(
            table.len(),
            (clock.max_word() - clock.min_word() + 1) as usize,
            "{clock}"
        );
        assert_eq!(table.iter().next().map(|(word, _)| word), Some(clock.min_word()));
        assert_eq!(table.iter().last().map(|(word, _)| word), Some(clock.max_word()));
    }
}

#[test]
fn test_entries_stay_within_register_limits() {
    for clock in SaaClock::ALL {
        let table = FrequencyTable::build(clock);
        for (word, entry) in table.iter() {
            assert!(entry.octave <= SAA1099_MAX_OCTAVE, "{clock} word={word} {entry:?}");

            // octave in bits 10..8, frequency register in bits 7..0
            let packed = entry.to_packed();
            assert_eq!(packed & !0x07FF, 0, "{clock} word={word} packed=0x{packed:04X}");
            assert_eq!(PackedFrequency::from_packed(packed), entry);

            // register = 511 - divider; the divider the VERA pitch asks for
            // at this octave must land in 256..=511
            let divider = 511 - (packed & 0x00FF);
            let ideal = clock.hz() as f64 * (1u32 << entry.octave) as f64
                / (512.0 * vera::frequency_hz(word));
            assert!(
                (255.0..=512.0).contains(&ideal),
                "{clock} word={word} octave={} ideal divider {ideal:.2}",
                entry.octave
            );
            assert!(
                (divider as f64 - ideal).abs() <= ideal * 0.004,
                "{clock} word={word} divider={divider} ideal={ideal:.2}"
            );
        }
    }
}

#[test]
fn test_octave_never_decreases_with_pitch() {
    for clock in SaaClock::ALL {
        let table = FrequencyTable::build(clock);
        let mut previous = 0;
        for (word, entry) in table.iter() {
            assert!(
                entry.octave >= previous,
                "{clock} word={word}: octave {} after {previous}",
                entry.octave
            );
            previous = entry.octave;
        }
    }
}

#[test]
fn test_concert_a() {
    let table = FrequencyTable::build(SaaClock::Mhz7_15909);
    let entry = table.lookup(1181);
    assert_eq!(
        entry,
        PackedFrequency {
            octave: 4,
            frequency: 2
        }
    );
    assert!((entry.hz(SaaClock::Mhz7_15909) - 440.0).abs() < 1.0);
}

#[test]
fn test_pitch_tracks_vera_output() {
    for clock in SaaClock::ALL {
        let table = FrequencyTable::build(clock);
        for (word, entry) in table.iter() {
            let vera_hz = vera::frequency_hz(word);
            let saa_hz = entry.hz(clock);
            let error = (saa_hz - vera_hz).abs() / vera_hz;
            assert!(
                error < 0.015,
                "{clock} word={word}: {saa_hz:.2} Hz vs {vera_hz:.2} Hz"
            );
        }
    }
}

#[test]
fn test_lookup_clamps_out_of_range_words() {
    for clock in SaaClock::ALL {
        let table = FrequencyTable::build(clock);
        assert_eq!(table.lookup(0), table.lookup(clock.min_word()));
        assert_eq!(table.lookup(1), table.lookup(clock.min_word()));
        assert_eq!(table.lookup(u16::MAX), table.lookup(clock.max_word()));
    }
}

#[test]
fn test_packed_form() {
    let entry = PackedFrequency::from_packed(0x0433);
    assert_eq!(
        entry,
        PackedFrequency {
            octave: 4,
            frequency: 0x33
        }
    );
    assert_eq!(entry.to_packed(), 0x0433);
}
