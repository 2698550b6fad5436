use std::time::Duration;

use rstest::rstest;
use venitrain_hardware::ReplayTransport;
use venitrain_hardware::error::HwError;
use venitrain_traits::clock::test_clock::TestClock;
use venitrain_traits::{Clock, ReadOutcome, Transport};

fn read_all(t: &mut ReplayTransport) -> Vec<Vec<u8>> {
    let mut chunks = Vec::new();
    loop {
        match t.read(Duration::from_millis(10)).unwrap() {
            ReadOutcome::Data(b) => chunks.push(b),
            ReadOutcome::Idle => {}
            ReadOutcome::EndOfStream => return chunks,
        }
    }
}

#[rstest]
#[case(1, 11)]
#[case(4, 3)]
#[case(64, 1)]
fn capture_is_served_in_chunks(#[case] chunk_bytes: usize, #[case] expected_chunks: usize) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("capture.log");
    std::fs::write(&path, b"hello\nworld").unwrap();

    let mut t = ReplayTransport::from_file(&path, chunk_bytes);
    t.open().unwrap();
    let chunks = read_all(&mut t);
    assert_eq!(chunks.len(), expected_chunks);
    assert_eq!(chunks.concat(), b"hello\nworld");
    // Stays at end of stream.
    assert_eq!(
        t.read(Duration::from_millis(1)).unwrap(),
        ReadOutcome::EndOfStream
    );
}

#[test]
fn missing_capture_fails_on_open() {
    let mut t = ReplayTransport::from_file("/nonexistent/capture.log", 16);
    let err = t.open().unwrap_err();
    assert!(matches!(err.downcast_ref::<HwError>(), Some(HwError::Io(_))));
}

#[test]
fn read_after_close_is_not_open() {
    let mut t = ReplayTransport::from_bytes(b"abc".to_vec(), 2);
    t.open().unwrap();
    t.close().unwrap();
    let err = t.read(Duration::from_millis(1)).unwrap_err();
    assert!(matches!(err.downcast_ref::<HwError>(), Some(HwError::NotOpen)));
}

#[test]
fn reopen_rewinds() {
    let mut t = ReplayTransport::from_bytes(b"abcdef".to_vec(), 4);
    t.open().unwrap();
    assert_eq!(read_all(&mut t).concat(), b"abcdef");
    t.open().unwrap();
    assert_eq!(read_all(&mut t).concat(), b"abcdef");
}

#[test]
fn paced_replay_sleeps_once_per_chunk() {
    let clock = TestClock::new();
    let start = clock.now();
    let mut t = ReplayTransport::from_bytes(b"abcdef".to_vec(), 2)
        .paced(Duration::from_millis(250))
        .with_clock(clock.clone());
    t.open().unwrap();
    assert_eq!(read_all(&mut t).len(), 3);
    assert_eq!(clock.now() - start, Duration::from_millis(750));
}
