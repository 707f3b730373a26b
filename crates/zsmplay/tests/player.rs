use std::cell::{OnceCell, RefCell};

use zsmplay::store::{PagedStore, StoreConfig};
use zsmplay::zsm::{
    NullWriter, PlaybackControl, PlayerState, Repeat, ZSM_HEADER_SIZE, ZsmBuilder, ZsmHeader,
    ZsmOffset, ZsmPlayer,
};
use zsmplay::{StoreError, ZsmError};

type Writes = RefCell<Vec<(u8, u8)>>;

/// Header with PSG data only and no loop point
fn psg_header() -> ZsmHeader {
    ZsmHeader {
        psg_channel_mask: 0x0001,
        ..ZsmHeader::new()
    }
}

/// Concatenate a header and raw command bytes
fn stream(header: ZsmHeader, body: &[u8]) -> Vec<u8> {
    let mut bytes = header.to_bytes().to_vec();
    bytes.extend_from_slice(body);
    bytes
}

/// Tick until playback stops or `limit` ticks have run; returns ticks run
fn run(player: &mut ZsmPlayer<'_>, limit: usize) -> usize {
    let mut ticks = 0;
    while player.is_playing() && ticks < limit {
        player.tick();
        ticks += 1;
    }
    ticks
}

#[test]
fn test_crafted_stream_tick_trace() {
    let bytes = stream(psg_header(), &[0x00, 0x05, 0x81, 0x80]);
    let psg: Writes = RefCell::new(Vec::new());
    let mut player = ZsmPlayer::from_bytes(&bytes, NullWriter, |a: u8, d: u8| {
        psg.borrow_mut().push((a, d))
    })
    .unwrap();

    assert_eq!(player.state(), PlayerState::Idle);
    player.start(Repeat(0));
    assert_eq!(player.delay_ticks(), 1);

    player.tick();
    assert!(psg.borrow().is_empty(), "first tick must not run a command");
    assert!(player.is_playing());

    player.tick();
    assert_eq!(*psg.borrow(), vec![(0, 5)]);
    assert_eq!(player.delay_ticks(), 1);
    assert!(player.is_playing());

    player.tick();
    assert!(!player.is_playing());
    assert_eq!(player.state(), PlayerState::Stopped);
    assert_eq!(player.delay_ticks(), 0);

    player.tick();
    assert_eq!(psg.borrow().len(), 1, "stopped player must stay silent");
}

#[test]
fn test_repeat_count_replays_from_loop_point() {
    let header = ZsmHeader {
        loop_point: ZsmOffset::from(ZSM_HEADER_SIZE as u32),
        ..psg_header()
    };
    let bytes = stream(header, &[0x00, 0x01, 0x81, 0x80]);
    let psg: Writes = RefCell::new(Vec::new());
    let mut player =
        ZsmPlayer::from_bytes(&bytes, NullWriter, |a: u8, d: u8| psg.borrow_mut().push((a, d))).unwrap();

    player.start(Repeat::times(2));
    let ticks = run(&mut player, 100);

    assert_eq!(psg.borrow().len(), 3, "one pass plus two repeats");
    assert_eq!(ticks, 5);
    assert_eq!(player.repeat_remaining(), 0);
}

#[test]
fn test_repeat_without_loop_point_plays_once() {
    let bytes = stream(psg_header(), &[0x00, 0x01, 0x81, 0x80]);
    let psg: Writes = RefCell::new(Vec::new());
    let mut player =
        ZsmPlayer::from_bytes(&bytes, NullWriter, |a: u8, d: u8| psg.borrow_mut().push((a, d))).unwrap();

    player.start(Repeat::times(5));
    run(&mut player, 100);

    assert_eq!(psg.borrow().len(), 1);
    assert_eq!(player.state(), PlayerState::Stopped);
}

#[test]
fn test_repeat_forever_never_stops() {
    let header = ZsmHeader {
        loop_point: ZsmOffset::from(ZSM_HEADER_SIZE as u32),
        ..psg_header()
    };
    let bytes = stream(header, &[0x00, 0x01, 0x81, 0x80]);
    let psg: Writes = RefCell::new(Vec::new());
    let mut player =
        ZsmPlayer::from_bytes(&bytes, NullWriter, |a: u8, d: u8| psg.borrow_mut().push((a, d))).unwrap();

    player.start(Repeat::FOREVER);
    let ticks = run(&mut player, 2000);

    assert_eq!(ticks, 2000);
    assert!(player.is_playing());
    assert!(player.repeat_remaining() > 0);
    // 255 loops exhausted the counter several times over
    assert!(psg.borrow().len() > 900);
}

#[test]
fn test_loop_point_in_second_bank() {
    let mut body = vec![0x81; 0x1_0000 - ZSM_HEADER_SIZE];
    body.extend_from_slice(&[0x00, 0x2A, 0x81, 0x80]);
    let header = ZsmHeader {
        loop_point: ZsmOffset {
            address: 0x0000,
            bank: 0x01,
        },
        ..psg_header()
    };
    let bytes = stream(header, &body);
    let psg: Writes = RefCell::new(Vec::new());
    let mut player =
        ZsmPlayer::from_bytes(&bytes, NullWriter, |a: u8, d: u8| psg.borrow_mut().push((a, d))).unwrap();

    player.start(Repeat::times(1));
    run(&mut player, 200_000);

    assert_eq!(*psg.borrow(), vec![(0, 0x2A), (0, 0x2A)]);
}

#[test]
fn test_stop_from_control_handle() {
    let mut builder = ZsmBuilder::new();
    for i in 0..10 {
        builder.psg_write(0x02, i).delay(1);
    }
    let bytes = builder.finalize();
    let psg: Writes = RefCell::new(Vec::new());
    let mut player =
        ZsmPlayer::from_bytes(&bytes, NullWriter, |a: u8, d: u8| psg.borrow_mut().push((a, d))).unwrap();
    let control = player.control();

    player.start(Repeat::ONCE);
    assert!(control.is_playing());
    run(&mut player, 4);
    let written = psg.borrow().len();

    control.stop();
    assert_eq!(player.state(), PlayerState::Stopped);
    run(&mut player, 10);
    player.tick();
    assert_eq!(psg.borrow().len(), written);
}

#[test]
fn test_stop_before_start_reports_stopped() {
    let bytes = stream(psg_header(), &[0x00, 0x01, 0x81, 0x80]);
    let psg: Writes = RefCell::new(Vec::new());
    let mut player =
        ZsmPlayer::from_bytes(&bytes, NullWriter, |a: u8, d: u8| psg.borrow_mut().push((a, d))).unwrap();
    let control = player.control();

    assert_eq!(player.state(), PlayerState::Idle);
    player.stop();
    assert_eq!(player.state(), PlayerState::Stopped);
    assert_eq!(control.state(), PlayerState::Stopped);
    assert!(!player.is_playing());

    run(&mut player, 5);
    assert!(psg.borrow().is_empty());

    // Stopping an idle player through a handle works the same way
    let mut idle = ZsmPlayer::from_bytes(&bytes, NullWriter, |_: u8, _: u8| {}).unwrap();
    idle.control().stop();
    assert_eq!(idle.state(), PlayerState::Stopped);
    idle.tick();
    assert_eq!(idle.elapsed_ticks(), 0);
}

#[test]
fn test_stop_inside_writer_halts_before_next_command() {
    let bytes = stream(psg_header(), &[0x00, 0x01, 0x00, 0x02, 0x00, 0x03, 0x81, 0x80]);
    let psg: Writes = RefCell::new(Vec::new());
    let control: OnceCell<PlaybackControl> = OnceCell::new();
    let mut player = ZsmPlayer::from_bytes(&bytes, NullWriter, |a: u8, d: u8| {
        psg.borrow_mut().push((a, d));
        if let Some(control) = control.get() {
            control.stop();
        }
    })
    .unwrap();
    let _ = control.set(player.control());

    player.start(Repeat::ONCE);
    player.tick();
    player.tick();

    assert_eq!(*psg.borrow(), vec![(0, 1)]);
    assert_eq!(player.state(), PlayerState::Stopped);
    run(&mut player, 5);
    assert_eq!(psg.borrow().len(), 1);
}

#[test]
fn test_start_resumes_and_rewind_restarts() {
    let bytes = stream(psg_header(), &[0x00, 0x01, 0x81, 0x00, 0x02, 0x81, 0x80]);
    let psg: Writes = RefCell::new(Vec::new());
    let mut player =
        ZsmPlayer::from_bytes(&bytes, NullWriter, |a: u8, d: u8| psg.borrow_mut().push((a, d))).unwrap();

    player.start(Repeat::ONCE);
    player.tick();
    player.tick();
    player.stop();
    assert_eq!(*psg.borrow(), vec![(0, 1)]);

    // Resumes where it stopped
    player.start(Repeat::ONCE);
    run(&mut player, 10);
    assert_eq!(*psg.borrow(), vec![(0, 1), (0, 2)]);

    player.rewind();
    player.start(Repeat::ONCE);
    run(&mut player, 10);
    assert_eq!(psg.borrow().len(), 4);
}

#[test]
fn test_extension_payload_is_skipped() {
    let bytes = stream(
        psg_header(),
        &[0x40, 0x43, 0xAA, 0xBB, 0xCC, 0x00, 0x07, 0x81, 0x80],
    );
    let psg: Writes = RefCell::new(Vec::new());
    let mut player =
        ZsmPlayer::from_bytes(&bytes, NullWriter, |a: u8, d: u8| psg.borrow_mut().push((a, d))).unwrap();

    player.start(Repeat::ONCE);
    run(&mut player, 10);
    assert_eq!(*psg.borrow(), vec![(0, 7)]);
}

#[test]
fn test_fm_pairs_are_dispatched() {
    let header = ZsmHeader {
        fm_channel_mask: 0x01,
        psg_channel_mask: 0x0001,
        ..ZsmHeader::new()
    };
    let bytes = stream(
        header,
        &[0x42, 0x20, 0xC7, 0x08, 0x78, 0x3F, 0x11, 0x81, 0x80],
    );
    let fm: Writes = RefCell::new(Vec::new());
    let psg: Writes = RefCell::new(Vec::new());
    let mut player = ZsmPlayer::from_bytes(
        &bytes,
        |a: u8, d: u8| fm.borrow_mut().push((a, d)),
        |a: u8, d: u8| psg.borrow_mut().push((a, d)),
    )
    .unwrap();

    player.start(Repeat::ONCE);
    run(&mut player, 10);
    assert_eq!(*fm.borrow(), vec![(0x20, 0xC7), (0x08, 0x78)]);
    assert_eq!(*psg.borrow(), vec![(0x3F, 0x11)]);
}

#[test]
fn test_writer_for_unused_device_is_not_bound() {
    let bytes = stream(psg_header(), &[0x41, 0x20, 0xC7, 0x00, 0x09, 0x81, 0x80]);
    let fm: Writes = RefCell::new(Vec::new());
    let psg: Writes = RefCell::new(Vec::new());
    let mut player = ZsmPlayer::from_bytes(
        &bytes,
        |a: u8, d: u8| fm.borrow_mut().push((a, d)),
        |a: u8, d: u8| psg.borrow_mut().push((a, d)),
    )
    .unwrap();

    player.start(Repeat::ONCE);
    run(&mut player, 10);
    assert!(fm.borrow().is_empty());
    assert_eq!(*psg.borrow(), vec![(0, 9)]);
}

#[test]
fn test_cross_page_stream_matches_single_page() {
    let mut builder = ZsmBuilder::new();
    for i in 0..200u8 {
        builder
            .psg_write(i % 64, i)
            .fm_write(&[(0x20 + (i % 8), i), (0x08, i % 8)])
            .delay(u32::from(i % 3));
    }
    let bytes = builder.finalize();

    let play = |store: PagedStore| {
        let writes: Writes = RefCell::new(Vec::new());
        let mut player = ZsmPlayer::new(
            store,
            |a: u8, d: u8| writes.borrow_mut().push((0xF0, a ^ d)),
            |a: u8, d: u8| writes.borrow_mut().push((a, d)),
        )
        .unwrap();
        player.start(Repeat::ONCE);
        run(&mut player, 10_000);
        drop(player);
        writes.into_inner()
    };

    let single = play(PagedStore::load_single_page(&bytes).unwrap());
    let paged = play(
        PagedStore::load_with_config(
            &bytes,
            StoreConfig {
                page_size: 5,
                max_pages: usize::MAX,
            },
        )
        .unwrap(),
    );

    assert_eq!(single.len(), 200 * 3);
    assert_eq!(single, paged);
}

#[test]
fn test_running_off_the_end_stops() {
    // No end-of-stream command
    let bytes = stream(psg_header(), &[0x00, 0x01, 0x81, 0x00, 0x02]);
    let psg: Writes = RefCell::new(Vec::new());
    let mut player =
        ZsmPlayer::from_bytes(&bytes, NullWriter, |a: u8, d: u8| psg.borrow_mut().push((a, d))).unwrap();

    player.start(Repeat::ONCE);
    let ticks = run(&mut player, 10);
    assert_eq!(ticks, 3);
    assert_eq!(player.state(), PlayerState::Stopped);
    assert_eq!(*psg.borrow(), vec![(0, 1), (0, 2)]);
}

#[test]
fn test_unsupported_version() {
    let header = ZsmHeader {
        version: 2,
        ..psg_header()
    };
    let bytes = stream(header, &[0x80]);
    let err = ZsmPlayer::from_bytes(&bytes, NullWriter, |_: u8, _: u8| {}).unwrap_err();
    assert_eq!(err, ZsmError::UnsupportedVersion(2));
}

#[test]
fn test_nothing_to_play() {
    // No channels in use
    let bytes = stream(ZsmHeader::new(), &[0x80]);
    let err = ZsmPlayer::from_bytes(&bytes, |_: u8, _: u8| {}, |_: u8, _: u8| {}).unwrap_err();
    assert_eq!(err, ZsmError::NothingToPlay);

    // Channels in use but only null writers
    let bytes = stream(psg_header(), &[0x80]);
    let err = ZsmPlayer::from_bytes(&bytes, NullWriter, NullWriter).unwrap_err();
    assert_eq!(err, ZsmError::NothingToPlay);
}

#[test]
fn test_header_too_short() {
    let bytes = psg_header().to_bytes();
    let err = ZsmPlayer::from_bytes(&bytes[..10], NullWriter, |_: u8, _: u8| {}).unwrap_err();
    assert_eq!(err, ZsmError::HeaderTooShort { len: 10, needed: 16 });
}

#[test]
fn test_header_split_across_small_pages() {
    let bytes = stream(psg_header(), &[0x00, 0x01, 0x80]);
    let store = PagedStore::load_with_config(
        &bytes,
        StoreConfig {
            page_size: 3,
            max_pages: 16,
        },
    )
    .unwrap();
    let player = ZsmPlayer::new(store, NullWriter, |_: u8, _: u8| {}).unwrap();
    assert_eq!(player.header(), psg_header());
    assert_eq!(player.position(), ZSM_HEADER_SIZE as u64);
}

#[test]
fn test_store_errors_propagate() {
    let err = ZsmPlayer::from_bytes(&[], NullWriter, |_: u8, _: u8| {}).unwrap_err();
    assert_eq!(err, ZsmError::Store(StoreError::Empty));
}

#[test]
fn test_repeat_value_decoding() {
    assert_eq!(Repeat::ONCE.initial_count(), 0);
    assert_eq!(Repeat::FOREVER.initial_count(), 255);
    assert_eq!(Repeat(0x8003).initial_count(), 255);
    assert_eq!(Repeat(0x0103).initial_count(), 3);
    assert!(!Repeat::times(9).is_forever());
}
