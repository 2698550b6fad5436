//! End-to-end runs of `SessionRunner` over scripted transports.

use std::time::Duration;

use crossbeam_channel as xch;
use venitrain_core::mocks::{ScriptedTransport, Step};
use venitrain_core::{
    AutoContinue, Command, Control, EndReason, Notice, RunOptions, SessionCfg, SessionRunner,
    TrainerError, TransportFactory,
};

fn lines(n: usize) -> Vec<u8> {
    (0..n)
        .map(|i| format!("angleR:{i} pressure:50 angleP:20 vein:0\n"))
        .collect::<String>()
        .into_bytes()
}

fn factory_from(make: impl Fn() -> ScriptedTransport + Send + 'static) -> TransportFactory {
    Box::new(move || Ok(Box::new(make()) as Box<dyn venitrain_traits::Transport + Send>))
}

fn fast_session() -> SessionCfg {
    SessionCfg {
        tick: Duration::from_millis(10),
        ..SessionCfg::default()
    }
}

#[test]
fn replay_runs_to_end_of_stream() {
    let data = lines(30);
    let runner = SessionRunner::builder()
        .session(fast_session())
        .transport_factory(factory_from(move || {
            ScriptedTransport::new(data.chunks(7).map(|c| Step::Data(c.to_vec())))
        }))
        .build()
        .unwrap();
    let (_tx, rx) = xch::unbounded();
    let summary = runner
        .run(
            rx,
            RunOptions {
                connect_on_start: true,
                record_on_start: true,
                stop_on_end_of_stream: true,
                max_duration: Some(Duration::from_secs(5)),
            },
        )
        .unwrap();
    assert_eq!(summary.ended_by, EndReason::EndOfStream);
    assert_eq!(summary.counters.accepted, 30);
    assert_eq!(summary.samples.len(), 30);
    assert!(!summary.session.transport_connected);
    assert!(summary.transport_error.is_none());
}

#[test]
fn controls_apply_in_order_until_quit() {
    let runner = SessionRunner::builder()
        .session(fast_session())
        .transport_factory(factory_from(|| {
            ScriptedTransport::new([]).idle_when_exhausted()
        }))
        .build()
        .unwrap();
    let (tx, rx) = xch::unbounded();
    tx.send(Control::Session(Command::Complete(1))).unwrap();
    tx.send(Control::Session(Command::Complete(2))).unwrap();
    tx.send(Control::Session(Command::Skip(4))).unwrap();
    tx.send(Control::Quit).unwrap();
    let summary = runner
        .run(
            rx,
            RunOptions {
                max_duration: Some(Duration::from_secs(5)),
                ..RunOptions::default()
            },
        )
        .unwrap();
    assert_eq!(summary.ended_by, EndReason::Quit);
    assert_eq!(summary.session.current_step.get(), 3);
    assert_eq!(summary.session.performance.level, 40);
}

#[test]
fn rejected_controls_are_reported() {
    let runner = SessionRunner::builder()
        .session(fast_session())
        .transport_factory(factory_from(|| ScriptedTransport::new([])))
        .build()
        .unwrap();
    let (ntx, nrx) = xch::unbounded();
    let runner = runner.with_notices(ntx);
    let (tx, rx) = xch::unbounded();
    tx.send(Control::Session(Command::StartRecording)).unwrap();
    tx.send(Control::Session(Command::Fail(9))).unwrap();
    tx.send(Control::Status).unwrap();
    tx.send(Control::Quit).unwrap();
    runner.run(rx, RunOptions::default()).unwrap();

    let notices: Vec<Notice> = nrx.try_iter().collect();
    assert!(matches!(
        &notices[0],
        Notice::Rejected {
            error: TrainerError::NotConnected,
            ..
        }
    ));
    assert!(matches!(
        &notices[1],
        Notice::Rejected {
            error: TrainerError::StepOutOfRange { id: 9, .. },
            ..
        }
    ));
    assert!(matches!(&notices[2], Notice::Status(s) if s.current_step.get() == 1));
}

#[test]
fn transport_failure_ends_connection_not_run() {
    let runner = SessionRunner::builder()
        .session(fast_session())
        .transport_factory(factory_from(|| {
            ScriptedTransport::new([Step::Fail("device unplugged".into())])
        }))
        .build()
        .unwrap();
    let (tx, rx) = xch::unbounded::<Control>();
    drop(tx);
    let summary = runner
        .run(
            rx,
            RunOptions {
                connect_on_start: true,
                record_on_start: true,
                max_duration: Some(Duration::from_millis(200)),
                ..RunOptions::default()
            },
        )
        .unwrap();
    assert_eq!(summary.ended_by, EndReason::Deadline);
    assert!(summary.transport_error.unwrap().contains("device unplugged"));
    assert!(!summary.session.transport_connected);
    assert!(!summary.session.recording);
}

#[test]
fn failing_initial_connect_is_an_error() {
    let runner = SessionRunner::builder()
        .transport_factory(factory_from(|| {
            ScriptedTransport::new([]).failing_open("no such device")
        }))
        .build()
        .unwrap();
    let (_tx, rx) = xch::unbounded();
    let err = runner
        .run(
            rx,
            RunOptions {
                connect_on_start: true,
                ..RunOptions::default()
            },
        )
        .unwrap_err();
    assert_eq!(
        err.downcast_ref::<TrainerError>(),
        Some(&TrainerError::Transport("no such device".into()))
    );
}

#[test]
fn reconnect_after_disconnect() {
    let runner = SessionRunner::builder()
        .session(fast_session())
        .transport_factory(factory_from(|| {
            ScriptedTransport::new([]).idle_when_exhausted()
        }))
        .build()
        .unwrap();
    let (ntx, nrx) = xch::unbounded();
    let (tx, rx) = xch::unbounded();
    tx.send(Control::Connect).unwrap();
    tx.send(Control::Connect).unwrap();
    tx.send(Control::Disconnect).unwrap();
    tx.send(Control::Connect).unwrap();
    tx.send(Control::Quit).unwrap();
    runner.with_notices(ntx).run(rx, RunOptions::default()).unwrap();

    let notices: Vec<Notice> = nrx.try_iter().collect();
    assert!(matches!(notices[0], Notice::Connected));
    assert!(matches!(
        notices[1],
        Notice::Rejected {
            error: TrainerError::AlreadyConnected,
            ..
        }
    ));
    assert!(matches!(notices[2], Notice::Connected));
}

#[test]
fn auto_continue_fires_on_runner_ticks() {
    let runner = SessionRunner::builder()
        .session(SessionCfg {
            auto_continue: AutoContinue::Secs10,
            ..fast_session()
        })
        .transport_factory(factory_from(|| ScriptedTransport::new([])))
        .build()
        .unwrap();
    let (_tx, rx) = xch::unbounded();
    let summary = runner
        .run(
            rx,
            RunOptions {
                max_duration: Some(Duration::from_millis(600)),
                ..RunOptions::default()
            },
        )
        .unwrap();
    assert_eq!(summary.ended_by, EndReason::Deadline);
    assert_eq!(summary.session.current_step.get(), 2);
    assert!(summary.session.session_duration_s >= 10);
}
