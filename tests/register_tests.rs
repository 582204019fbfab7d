//! Register writes, the read handshake, and run/script helpers against the
//! simulated bridge.

use cp2112_hid::mock::{MockBridge, MockConnector};
use cp2112_hid::script::Script;
use cp2112_hid::{Cp2112, Error, SessionConfig, SessionStatus, SlaveAddress};
use std::time::Duration;

const CHIP: u8 = 0x2D;

fn open(bridge: &MockBridge) -> Cp2112<MockConnector> {
    let _ = env_logger::builder().is_test(true).try_init();
    let config = SessionConfig::default()
        .with_poll_interval(Duration::ZERO)
        .with_settle_delay(Duration::ZERO);
    Cp2112::open(bridge.connector(), config).expect("mock open")
}

fn chip() -> SlaveAddress {
    SlaveAddress::new(CHIP).unwrap()
}

// --- Writes ---

#[test]
fn test_write_register_short_frames() {
    let bridge = MockBridge::new();
    let mut session = open(&bridge);

    session.write_register(chip(), 0x020E, 0xAB, 1).unwrap();
    session.write_register(chip(), 0x0300, 0x1234, 2).unwrap();

    let state = bridge.state();
    assert_eq!(state.writes.len(), 2);
    assert_eq!(&state.writes[0][..6], &[0x14, 0x5A, 0x03, 0x02, 0x0E, 0xAB]);
    assert_eq!(state.writes[0].len(), 64);
    assert_eq!(&state.writes[1][..7], &[0x14, 0x5A, 0x04, 0x03, 0x00, 0x12, 0x34]);
    drop(state);
    assert_eq!(bridge.register(CHIP, 0x020E), Some(0xAB));
    assert_eq!(bridge.register(CHIP, 0x0300), Some(0x12));
    assert_eq!(bridge.register(CHIP, 0x0301), Some(0x34));
}

#[test]
fn test_write_register_long_frame() {
    let bridge = MockBridge::new();
    let mut session = open(&bridge);

    session
        .write_register(chip(), 0x0400, 0x0102_0304_0506_0708, 8)
        .unwrap();

    let state = bridge.state();
    assert_eq!(
        &state.writes[0][..14],
        &[0x17, 0x5A, 0x08, 0x02, 0x04, 0x00, 1, 2, 3, 4, 5, 6, 7, 8]
    );
    drop(state);
    assert_eq!(bridge.register(CHIP, 0x0407), Some(0x08));
}

#[test]
fn test_misuse_never_touches_transport() {
    let bridge = MockBridge::new();
    let mut session = open(&bridge);

    assert!(matches!(
        session.write_register(chip(), 0, 0, 9),
        Err(Error::UnsupportedLength(9))
    ));
    assert!(matches!(
        session.write_register(chip(), 0, 0, 0),
        Err(Error::UnsupportedLength(0))
    ));
    assert!(matches!(
        session.write_block(chip(), 0, &[]),
        Err(Error::BlockTooLarge(0))
    ));
    assert!(matches!(
        session.write_block(chip(), 0, &[0u8; 62]),
        Err(Error::BlockTooLarge(62))
    ));
    assert!(matches!(
        session.read_register(chip(), 0, 9),
        Err(Error::UnsupportedLength(9))
    ));
    assert!(matches!(
        session.read_run(chip(), 0xFFFE, 3),
        Err(Error::ArgumentOutOfRange(_))
    ));

    let state = bridge.state();
    assert!(state.writes.is_empty());
    assert_eq!(state.resets(), 0);
    drop(state);
    assert_eq!(session.recovery_count(), 0);
}

#[test]
fn test_write_block_limits() {
    let bridge = MockBridge::new();
    let mut session = open(&bridge);

    session.write_block(chip(), 0x1000, &[0x42]).unwrap();
    let payload: Vec<u8> = (0..61).collect();
    session.write_block(chip(), 0x2000, &payload).unwrap();

    let state = bridge.state();
    assert_eq!(&state.writes[0][..6], &[0x14, 0x5A, 0x03, 0x10, 0x00, 0x42]);
    assert_eq!(state.writes[1][2], 63);
    drop(state);
    assert_eq!(bridge.register(CHIP, 0x2000 + 60), Some(60));
}

#[test]
fn test_write_transport_fault_recovers_once() {
    let bridge = MockBridge::new();
    let mut session = open(&bridge);
    bridge.state().fail_write_at = Some(0);

    let err = session.write_register(chip(), 0x0010, 0x55, 1).unwrap_err();
    match &err {
        Error::Device { cause, reopened } => {
            assert!(*reopened);
            assert!(matches!(**cause, Error::Transport(_)));
        }
        other => panic!("expected Device error, got {other:?}"),
    }

    let state = bridge.state();
    assert_eq!(state.resets(), 1);
    assert_eq!(state.closes, 1);
    assert_eq!(state.opens, 2);
    // The failed write was not resent.
    assert_eq!(state.writes.len(), 1);
    drop(state);
    assert_eq!(session.recovery_count(), 1);
    assert_eq!(session.status(), SessionStatus::Ready);

    // The repaired session serves the next call.
    session.write_register(chip(), 0x0010, 0x55, 1).unwrap();
    assert_eq!(bridge.register(CHIP, 0x0010), Some(0x55));
}

// --- Reads ---

#[test]
fn test_read_register_handshake() {
    let bridge = MockBridge::new();
    bridge.set_register(CHIP, 0x020E, 0xBE);
    bridge.set_register(CHIP, 0x020F, 0xEF);
    let mut session = open(&bridge);

    assert_eq!(session.read_register(chip(), 0x020E, 2).unwrap(), 0xBEEF);

    let state = bridge.state();
    assert_eq!(
        &state.writes[0][..7],
        &[0x11, 0x5A, 0x00, 0x02, 0x02, 0x02, 0x0E]
    );
    assert_eq!(&state.writes[1][..2], &[0x15, 0x01]);
    assert_eq!(&state.writes[2][..3], &[0x12, 0x00, 0x02]);
    assert_eq!(state.writes.len(), 3);
    assert_eq!(state.status_polls, 1);
}

#[test]
fn test_read_all_widths() {
    let bridge = MockBridge::new();
    for (i, b) in [0x01u8, 0x23, 0x45, 0x67, 0x89, 0xAB, 0xCD, 0xEF]
        .iter()
        .enumerate()
    {
        bridge.set_register(CHIP, 0x0100 + i as u16, *b);
    }
    let mut session = open(&bridge);

    assert_eq!(session.read_register(chip(), 0x0100, 1).unwrap(), 0x01);
    assert_eq!(session.read_register(chip(), 0x0100, 2).unwrap(), 0x0123);
    assert_eq!(session.read_register(chip(), 0x0100, 4).unwrap(), 0x0123_4567);
    assert_eq!(
        session.read_register(chip(), 0x0100, 8).unwrap(),
        0x0123_4567_89AB_CDEF
    );
}

#[test]
fn test_read_ready_on_tenth_poll() {
    let bridge = MockBridge::new();
    bridge.set_register(CHIP, 0x0001, 0x7E);
    bridge.state().busy_polls = 9;
    let mut session = open(&bridge);

    assert_eq!(session.read_register(chip(), 0x0001, 1).unwrap(), 0x7E);
    assert_eq!(bridge.state().status_polls, 10);
    assert_eq!(bridge.state().resets(), 0);
}

#[test]
fn test_read_polls_exactly_until_ready() {
    for busy in 0..10 {
        let bridge = MockBridge::new();
        bridge.state().busy_polls = busy;
        let mut session = open(&bridge);

        session.read_register(chip(), 0x0001, 1).unwrap();
        assert_eq!(bridge.state().status_polls, busy + 1);
    }
}

#[test]
fn test_read_skips_foreign_status_frame() {
    let bridge = MockBridge::new();
    bridge.set_register(CHIP, 0x0001, 0x3C);
    bridge.state().foreign_status_polls = 1;
    let mut session = open(&bridge);

    assert_eq!(session.read_register(chip(), 0x0001, 1).unwrap(), 0x3C);
    let state = bridge.state();
    assert_eq!(state.status_polls, 2);
    assert_eq!(state.resets(), 0);
}

#[test]
fn test_read_timeout_after_ten_polls() {
    let bridge = MockBridge::new();
    bridge.state().busy_polls = 10;
    let mut session = open(&bridge);

    let err = session.read_register(chip(), 0x0042, 1).unwrap_err();
    match err.root_cause() {
        Error::ReadTimeout {
            address,
            register,
            attempts,
        } => {
            assert_eq!(*address, chip());
            assert_eq!(*register, 0x0042);
            assert_eq!(*attempts, 10);
        }
        other => panic!("expected ReadTimeout, got {other:?}"),
    }
    assert!(matches!(err, Error::Device { reopened: true, .. }));

    let state = bridge.state();
    assert_eq!(state.status_polls, 10);
    assert_eq!(state.resets(), 1);
    // No force read was issued.
    assert!(state.writes_with_tag(0x12).is_empty());
}

#[test]
fn test_read_malformed_response_recovers() {
    let bridge = MockBridge::new();
    bridge.state().corrupt_data_response = true;
    let mut session = open(&bridge);

    let err = session.read_register(chip(), 0x0001, 1).unwrap_err();
    assert!(matches!(err.root_cause(), Error::MalformedResponse(_)));
    assert!(matches!(err, Error::Device { .. }));
    assert_eq!(bridge.state().resets(), 1);
    assert_eq!(session.recovery_count(), 1);
}

#[test]
fn test_read_transport_fault_recovers_once() {
    let bridge = MockBridge::new();
    bridge.state().fail_read_register = Some(0x0005);
    let mut session = open(&bridge);

    let err = session.read_register(chip(), 0x0005, 1).unwrap_err();
    assert!(matches!(err.root_cause(), Error::Transport(_)));

    let state = bridge.state();
    assert_eq!(state.resets(), 1);
    assert_eq!(state.opens, 2);
    assert_eq!(state.status_polls, 0);
}

// --- Runs ---

#[test]
fn test_read_run_in_order() {
    let bridge = MockBridge::new();
    for (i, b) in [0xAAu8, 0xBB, 0xCC, 0xDD].iter().enumerate() {
        bridge.set_register(CHIP, 0x10 + i as u16, *b);
    }
    let mut session = open(&bridge);

    assert_eq!(
        session.read_run(chip(), 0x10, 4).unwrap(),
        vec![0xAA, 0xBB, 0xCC, 0xDD]
    );
    let requests: Vec<u16> = bridge
        .state()
        .writes_with_tag(0x11)
        .iter()
        .map(|w| u16::from_be_bytes([w[5], w[6]]))
        .collect();
    assert_eq!(requests, vec![0x10, 0x11, 0x12, 0x13]);
    assert!(session.read_run(chip(), 0x10, 0).unwrap().is_empty());
}

#[test]
fn test_read_run_aborts_without_partial_result() {
    let bridge = MockBridge::new();
    for (i, b) in [0xAAu8, 0xBB, 0xCC, 0xDD].iter().enumerate() {
        bridge.set_register(CHIP, 0x10 + i as u16, *b);
    }
    bridge.state().fail_read_register = Some(0x12);
    let mut session = open(&bridge);

    let err = session.read_run(chip(), 0x10, 4).unwrap_err();
    assert!(matches!(err, Error::Device { .. }));
    // The fourth register was never requested.
    let requests = bridge.state().writes_with_tag(0x11).len();
    assert_eq!(requests, 3);
    assert_eq!(bridge.state().resets(), 1);
}

#[test]
fn test_write_run_in_order_and_abort() {
    let bridge = MockBridge::new();
    let mut session = open(&bridge);

    session.write_run(chip(), 0x0200, &[1, 2, 3]).unwrap();
    assert_eq!(bridge.register(CHIP, 0x0200), Some(1));
    assert_eq!(bridge.register(CHIP, 0x0202), Some(3));

    bridge.state().fail_write_register = Some(0x0301);
    let err = session.write_run(chip(), 0x0300, &[9, 8, 7]).unwrap_err();
    assert!(matches!(err, Error::Device { .. }));
    assert_eq!(bridge.register(CHIP, 0x0300), Some(9));
    assert_eq!(bridge.register(CHIP, 0x0302), None);
}

// --- Scripts ---

#[test]
fn test_script_block_issues_block_writes_in_order() {
    let bridge = MockBridge::new();
    let mut session = open(&bridge);
    let script = Script::parse(
        "WBlock(1, Init)\n[\n(0x020E, 0x00AB, 2)\n(0x0210, 0x01, 1)\n]\n",
    )
    .unwrap();

    session.run_script(&script, chip()).unwrap();

    let state = bridge.state();
    assert_eq!(state.writes.len(), 2);
    assert_eq!(&state.writes[0][..7], &[0x14, 0x5A, 0x04, 0x02, 0x0E, 0x00, 0xAB]);
    assert_eq!(&state.writes[1][..6], &[0x14, 0x5A, 0x03, 0x02, 0x10, 0x01]);
}

#[test]
fn test_script_address_and_named_block() {
    let bridge = MockBridge::new();
    let mut session = open(&bridge);
    let script = Script::parse(
        "Addr=0x50\nWBlock(1, A)\n[\n(0x0001, 0x11, 1)\n]\nWBlock(2, B)\n[\n(0x0002, 0x22, 1)\n]\n",
    )
    .unwrap();

    session.run_named_block(&script, "B", chip()).unwrap();
    assert_eq!(bridge.register(0x50, 0x0002), Some(0x22));
    assert_eq!(bridge.register(0x50, 0x0001), None);

    assert!(matches!(
        session.run_named_block(&script, "C", chip()),
        Err(Error::UnknownBlock(_))
    ));
}
