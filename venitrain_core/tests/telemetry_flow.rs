//! Byte stream to rolling window, driven through `Trainer` with a test clock.

use std::time::Duration;

use venitrain_core::{Command, SessionCfg, Trainer};
use venitrain_traits::clock::test_clock::TestClock;

fn recording_trainer(clock: &TestClock) -> Trainer {
    let mut t = Trainer::builder()
        .session(SessionCfg::default())
        .clock(clock.clone())
        .build()
        .unwrap();
    t.on_connected().unwrap();
    t.apply(&Command::StartRecording).unwrap();
    t
}

fn line(i: usize) -> String {
    format!(
        "angleR:{}.5 pressure:{} angleP:{}.25 vein:{}\r\n",
        i,
        50 + i,
        20 + i % 5,
        i % 2
    )
}

#[test]
fn fragments_across_chunks_form_one_sample() {
    let clock = TestClock::new();
    let mut t = recording_trainer(&clock);
    let r1 = t.on_chunk(b"angleR:56.53 press");
    assert_eq!(r1.lines, 0);
    assert_eq!(t.pending_fragment(), "angleR:56.53 press");
    let r2 = t.on_chunk(b"ure:80.38 angleP:23.45 vein:1\nangle");
    assert_eq!(r2.accepted, 1);
    assert_eq!(t.pending_fragment(), "angle");
    let s = t.latest_reading().unwrap();
    assert_eq!(s.pressure, 80.38);
    assert!(s.vein_touch);
}

#[test]
fn rejected_lines_leave_window_unchanged() {
    let clock = TestClock::new();
    let mut t = recording_trainer(&clock);
    t.on_chunk(line(1).as_bytes());
    let before = t.window().to_vec();
    let r = t.on_chunk(
        b"angleR:NaN pressure:1 angleP:1 vein:0\nangleR:1 pressure:1 angleP:1 vein:2\nhello\n",
    );
    assert_eq!(r.rejected, 3);
    assert_eq!(t.window().to_vec(), before);
    assert_eq!(t.raw_lines().len(), 4);
}

#[test]
fn timestamps_come_from_recording_start() {
    let clock = TestClock::new();
    clock.advance(Duration::from_secs(30));
    let mut t = recording_trainer(&clock);
    clock.advance(Duration::from_millis(1500));
    t.on_chunk(line(0).as_bytes());
    clock.advance(Duration::from_millis(500));
    t.on_chunk(line(1).as_bytes());
    let times: Vec<f64> = t.window().snapshot().map(|s| s.time_s).collect();
    assert_eq!(times, vec![1.5, 2.0]);
}

#[test]
fn window_keeps_newest_hundred() {
    let clock = TestClock::new();
    let mut t = recording_trainer(&clock);
    let stream: String = (0..105).map(line).collect();
    for chunk in stream.as_bytes().chunks(13) {
        t.on_chunk(chunk);
    }
    assert_eq!(t.window().len(), 100);
    assert_eq!(t.window().snapshot().next().unwrap().angle_raw, 5.5);
    assert_eq!(t.latest_reading().unwrap().angle_raw, 104.5);
    assert_eq!(t.raw_lines().len(), 100);
    assert_eq!(t.counters().accepted, 105);
}

#[test]
fn restart_clears_window_but_pause_keeps_it() {
    let clock = TestClock::new();
    let mut t = recording_trainer(&clock);
    t.on_chunk(line(0).as_bytes());
    t.apply(&Command::PauseRecording).unwrap();
    t.on_chunk(line(1).as_bytes());
    assert_eq!(t.window().len(), 1);
    t.apply(&Command::StartRecording).unwrap();
    assert!(t.window().is_empty());
    assert_eq!(t.raw_lines().processed(), t.raw_lines().len());
}

#[test]
fn disconnect_stops_sampling_and_keeps_window() {
    let clock = TestClock::new();
    let mut t = recording_trainer(&clock);
    t.on_chunk(line(0).as_bytes());
    t.on_disconnected();
    assert!(!t.state().is_recording());
    assert!(!t.state().is_transport_connected());
    assert_eq!(t.window().len(), 1);
}

#[test]
fn reset_clears_pipeline_and_keeps_connection() {
    let clock = TestClock::new();
    let mut t = recording_trainer(&clock);
    t.on_chunk(b"angleR:1 pressure:2 angleP:3 vein:0\nangleR:");
    t.apply(&Command::Complete(1)).unwrap();
    t.apply(&Command::Reset).unwrap();
    assert!(t.window().is_empty());
    assert!(t.raw_lines().is_empty());
    assert_eq!(t.pending_fragment(), "");
    assert!(t.state().is_transport_connected());
    assert!(!t.state().is_recording());
    assert_eq!(t.state().current_step().get(), 1);
}

#[test]
fn clear_raw_lines_drops_echo_and_fragment() {
    let clock = TestClock::new();
    let mut t = recording_trainer(&clock);
    t.on_chunk(b"angleR:1 pressure:2 angleP:3 vein:0\nangle");
    t.clear_raw_lines();
    assert!(t.raw_lines().is_empty());
    assert_eq!(t.pending_fragment(), "");
    assert_eq!(t.window().len(), 1);
}

#[test]
fn aggregates_and_guidance_in_snapshot() {
    let clock = TestClock::new();
    let mut t = recording_trainer(&clock);
    t.on_chunk(b"angleR:10 pressure:40 angleP:12 vein:0\nangleR:10 pressure:60 angleP:22 vein:1\n");
    let snap = t.snapshot();
    let pr = snap.pressure_range.unwrap();
    assert_eq!((pr.min, pr.max), (40.0, 60.0));
    assert_eq!(snap.angle_zone, Some(venitrain_core::window::AngleZone::Optimal));
    assert_eq!(snap.samples, 2);
    let json = serde_json::to_value(&snap).unwrap();
    assert_eq!(json["steps"][0]["status"], "current");
}
