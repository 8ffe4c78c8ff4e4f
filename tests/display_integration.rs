/*
 *  tests/display_integration.rs
 *
 *  Integration tests for the display controllers
 *
 *  display-handler - two rows, two protocols
 *  (c) 2023-26 display-handler contributors
 */

use chrono::{Local, TimeZone};

use display_handler::display::bitmap::FRAME_HEADER;
use display_handler::display::canvas::Renderer;
use display_handler::display::factory::build;
use display_handler::display::indicator::IndicatorSink;
use display_handler::display::mock::{MockChannel, MockDelay, MockI2c};
use display_handler::display::{
    BoxedDisplay, DeviceFamily, DisplayError, DisplayMode,
};

fn open(family: DeviceFamily) -> (BoxedDisplay, MockChannel, MockDelay) {
    let ch = MockChannel::new();
    let delay = MockDelay::new();
    let d = build(family, ch.clone(), delay.clone(), 0, 0, IndicatorSink::<MockI2c>::None);
    (d, ch, delay)
}

#[test]
fn test_bitmap_viewership_frame_on_the_wire() {
    let (mut d, ch, delay) = open(DeviceFamily::BinaryBitmap);
    d.send("ABCDEFGHIJKL", "1-3--o", DisplayMode::Viewership).unwrap();

    let writes = ch.writes();
    assert_eq!(writes[0], vec![0x1F, 0x28, 0x61, 0x40, 0x01]);
    assert_eq!(&writes[1][..4], &FRAME_HEADER);
    assert!(writes[1..].iter().all(|w| w.len() <= 1024));
    assert_eq!(writes[1..].iter().map(Vec::len).sum::<usize>(), 4 + 8192);

    // power-on settle, one pause per chunk, then the frame settle
    let delays = delay.delays_ms();
    assert_eq!(delays[0], 100);
    assert_eq!(delays.len(), writes.len() + 1);
    assert_eq!(delays.last(), Some(&200));
}

#[test]
fn test_ascii_idempotent_send() {
    let (mut d, ch, delay) = open(DeviceFamily::AsciiCommand);
    d.send("AB----------", "1----1", DisplayMode::Viewership).unwrap();
    let first = ch.write_count();
    assert_eq!(
        ch.written_lines(),
        vec!["$9002\"A\"1&\n", "$9002\"B\"1&\n", "$9002\"1\"1&\n", "$9002\"ABS\"1&\n"]
    );
    assert_eq!(delay.total_ms(), 4 * 120);

    d.send("AB----------", "1----1", DisplayMode::Viewership).unwrap();
    assert_eq!(ch.write_count(), first);
}

#[test]
fn test_ascii_partial_update() {
    let (mut d, ch, _) = open(DeviceFamily::AsciiCommand);
    d.send("AB----------", "------", DisplayMode::Viewership).unwrap();
    ch.reset();

    // A stays, B goes out, C comes on
    d.send("A.C---------", "------", DisplayMode::Viewership).unwrap();
    assert_eq!(ch.written_lines(), vec!["$9003\"B\"1&\n", "$9002\"C\"1&\n"]);
}

#[test]
fn test_request_errors_before_io() {
    for family in [DeviceFamily::BinaryBitmap, DeviceFamily::AsciiCommand] {
        let (mut d, ch, _) = open(family);
        let err = d.send("ABCDEFGHIJK", "123451", DisplayMode::Viewership).unwrap_err();
        assert!(matches!(err, DisplayError::InvalidFormat(_)));
        assert_eq!(ch.write_count(), 0, "{} wrote on a bad request", family);
    }

    // only the lamp panel has nothing to show for an unknown composite
    let (mut d, ch, _) = open(DeviceFamily::AsciiCommand);
    let err = d.send("ABCDEFGHIJKL", "12345z", DisplayMode::Viewership).unwrap_err();
    assert!(matches!(err, DisplayError::InvalidInput('z')));
    assert_eq!(ch.write_count(), 0);
}

#[test]
fn test_bitmap_draws_unknown_composite_as_stars() {
    let (mut d, ch, _) = open(DeviceFamily::BinaryBitmap);
    d.send("ABCDEFGHIJKL", "12345z", DisplayMode::Viewership).unwrap();
    assert_eq!(ch.write_count(), 10);

    // same pixels as the explicit fallback glyph, drawn at x=134
    let now = Local.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
    let r = Renderer::new();
    let z = r.draw("------------", "-----z", DisplayMode::Viewership, now).unwrap();
    let zero = r.draw("------------", "-----0", DisplayMode::Viewership, now).unwrap();
    assert_eq!(z, zero);
    let lit = (32..64)
        .flat_map(|y| (134..164).map(move |x| (x, y)))
        .filter(|&(x, y)| z.luma(x, y).unwrap_or(0) != 0)
        .count();
    assert!(lit > 0);
}

#[test]
fn test_led_sink_does_not_change_bitmap_outcome() {
    let ch = MockChannel::new();
    let bus = MockI2c::new();
    let sink = IndicatorSink::attach(bus.clone(), 0x3C);
    let mut d = build(DeviceFamily::BinaryBitmap, ch.clone(), MockDelay::new(), 0x2047, 0xF002, sink);

    d.send("ABCDEFGHIJKL", "12345z", DisplayMode::Viewership).unwrap();
    assert_eq!(ch.write_count(), 10);
    assert_eq!(bus.writes().len(), 1);
}

#[test]
fn test_ascii_rejects_bitmap_modes() {
    let (mut d, ch, _) = open(DeviceFamily::AsciiCommand);
    assert!(matches!(
        d.send("", "", DisplayMode::Screensaver),
        Err(DisplayError::InvalidFormat(_))
    ));
    assert_eq!(ch.write_count(), 0);
}

#[test]
fn test_remote_codes_per_family() {
    let (mut d, ch, _) = open(DeviceFamily::BinaryBitmap);
    ch.push_rx(&[0x0C, 0x30]);
    assert_eq!(d.read_remote_cmd().unwrap(), Some(0x300C));
    assert_eq!(d.read_remote_cmd().unwrap(), None);

    let (mut d, ch, _) = open(DeviceFamily::AsciiCommand);
    ch.push_rx(b"junk\r\n$9001\"12\"0&\r\n");
    assert_eq!(d.read_remote_cmd().unwrap(), Some(0xC00C));
    assert_eq!(d.read_remote_cmd().unwrap(), None);
}

#[test]
fn test_read_failure_is_channel_error() {
    let (mut d, ch, _) = open(DeviceFamily::AsciiCommand);
    ch.state().lock().unwrap().simulate_read_failure = true;
    assert!(matches!(d.read_remote_cmd(), Err(DisplayError::Channel(_))));
}

#[test]
fn test_close_blanks_both_families() {
    let (d, ch, _) = open(DeviceFamily::BinaryBitmap);
    d.close().unwrap();
    assert_eq!(ch.writes(), vec![vec![0x1F, 0x28, 0x61, 0x40, 0x00]]);

    let (d, ch, _) = open(DeviceFamily::AsciiCommand);
    d.close().unwrap();
    assert_eq!(ch.written_lines(), vec!["$9009\"ALLOFF\"1&\n"]);
}

#[test]
fn test_led_mirror_tracks_ascii_panel() {
    let ch = MockChannel::new();
    let bus = MockI2c::new();
    let sink = IndicatorSink::attach(bus.clone(), 0x3C);
    let mut d = build(DeviceFamily::AsciiCommand, ch, MockDelay::new(), 0x10C4, 0xEA60, sink);

    d.send("------------", "-----1", DisplayMode::Viewership).unwrap();
    // enable, then ABS is wired to two channels: 3 writes each
    let abs: Vec<Vec<u8>> = bus.writes().into_iter().skip(1).map(|(_, b)| b).collect();
    assert_eq!(abs.len(), 6);
    assert_eq!(abs[1], vec![0x2A + 20, 0x01]);
    assert_eq!(abs[4], vec![0x2A + 25, 0x01]);

    // mirror failures never reach the caller
    bus.set_failing(true);
    d.send("A-----------", "------", DisplayMode::Viewership).unwrap();
    d.clear().unwrap();
}
