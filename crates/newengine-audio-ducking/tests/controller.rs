use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use newengine_audio_ducking::{
    DuckingController, DuckingError, DuckingStateChanged, NativeCall, NotifyMode,
    NullDuckingPlatform, StreamCategory,
};

fn platform() -> Arc<NullDuckingPlatform> {
    Arc::new(NullDuckingPlatform::new())
}

fn count(platform: &NullDuckingPlatform, pred: impl Fn(&NativeCall) -> bool) -> usize {
    platform.calls().iter().filter(|&c| pred(c)).count()
}

#[test]
fn unrecognized_categories_allocate_nothing() {
    let p = platform();
    for raw in [-1, 10, 99, i32::MAX] {
        let err = DuckingController::with_raw_category(raw, p.clone()).unwrap_err();
        assert!(matches!(err, DuckingError::InvalidArgument { name: "stream_category", .. }));
    }
    assert!(p.calls().is_empty());
    assert_eq!(p.live_sessions(), 0);
}

#[test]
fn raw_category_constructs_when_known() {
    let p = platform();
    let ctl = DuckingController::with_raw_category(3, p.clone()).unwrap();
    assert_eq!(ctl.target_category(), StreamCategory::Notification);
    assert_eq!(p.live_sessions(), 1);
}

#[test]
fn out_of_range_duration_makes_no_native_call() {
    let p = platform();
    let ctl = DuckingController::new(StreamCategory::Media, p.clone()).unwrap();

    for duration in [3001, 10_000, u32::MAX] {
        let err = ctl.activate(duration, 0.5).unwrap_err();
        assert!(matches!(err, DuckingError::OutOfRange { name: "duration", .. }));
    }
    assert_eq!(count(&p, |c| matches!(c, NativeCall::Activate { .. })), 0);
}

#[test]
fn out_of_range_ratio_makes_no_native_call() {
    let p = platform();
    let ctl = DuckingController::new(StreamCategory::Media, p.clone()).unwrap();

    for ratio in [0.0, 1.0, -0.5, 1.5, f64::NAN] {
        let err = ctl.activate(500, ratio).unwrap_err();
        assert!(matches!(err, DuckingError::OutOfRange { name: "ratio", .. }), "{ratio}");
    }
    assert_eq!(count(&p, |c| matches!(c, NativeCall::Activate { .. })), 0);
}

#[test]
fn valid_activate_forwards_exact_values_once() {
    let p = platform();
    let ctl = DuckingController::new(StreamCategory::Media, p.clone()).unwrap();
    let session = p.session_ids()[0];

    ctl.activate(500, 0.3).unwrap();

    let activations: Vec<NativeCall> = p
        .calls()
        .into_iter()
        .filter(|c| matches!(c, NativeCall::Activate { .. }))
        .collect();
    assert_eq!(
        activations,
        vec![NativeCall::Activate { session, duration_ms: 500, ratio: 0.3 }]
    );
}

#[test]
fn boundary_values_are_accepted() {
    let p = platform();
    let ctl = DuckingController::new(StreamCategory::Media, p.clone()).unwrap();
    ctl.activate(0, 0.01).unwrap();
    ctl.activate(3000, 0.99).unwrap();
    assert_eq!(count(&p, |c| matches!(c, NativeCall::Activate { .. })), 2);
}

#[test]
fn release_twice_releases_once() {
    let p = platform();
    let ctl = DuckingController::new(StreamCategory::Media, p.clone()).unwrap();

    ctl.release();
    ctl.release();
    assert!(ctl.is_released());
    drop(ctl);

    assert_eq!(count(&p, |c| matches!(c, NativeCall::Release { .. })), 1);
    assert_eq!(p.live_sessions(), 0);
}

#[test]
fn operations_after_release_fail_with_invalid_state() {
    let p = platform();
    let ctl = DuckingController::new(StreamCategory::Media, p.clone()).unwrap();
    ctl.release();
    p.clear_calls();

    for _ in 0..3 {
        assert!(matches!(ctl.is_ducked(), Err(DuckingError::InvalidState(_))));
        assert!(matches!(ctl.activate(100, 0.5), Err(DuckingError::InvalidState(_))));
        assert!(matches!(ctl.deactivate(), Err(DuckingError::InvalidState(_))));
    }
    assert!(p.calls().is_empty());
}

#[test]
fn argument_errors_win_over_released_state() {
    let p = platform();
    let ctl = DuckingController::new(StreamCategory::Media, p.clone()).unwrap();
    ctl.release();
    assert!(matches!(ctl.activate(3001, 0.5), Err(DuckingError::OutOfRange { .. })));
}

#[test]
fn callback_notifies_each_subscriber_once_with_live_state() {
    let p = platform();
    let ctl = DuckingController::new(StreamCategory::Media, p.clone()).unwrap();
    let session = p.session_ids()[0];

    let seen: Arc<Mutex<Vec<(usize, bool)>>> = Arc::new(Mutex::new(Vec::new()));
    for idx in 0..2 {
        let seen = seen.clone();
        ctl.subscribe(move |ev: &DuckingStateChanged| {
            seen.lock().unwrap().push((idx, ev.is_ducked));
        });
    }

    assert!(p.simulate_state_change(session, true));
    assert_eq!(*seen.lock().unwrap(), vec![(0, true), (1, true)]);
}

#[test]
fn callback_ignores_reported_flag_and_requeries() {
    let p = platform();
    let ctl = DuckingController::new(StreamCategory::Media, p.clone()).unwrap();
    let session = p.session_ids()[0];
    let sub = ctl.subscribe_channel();

    p.set_ducked(session, true);
    p.clear_calls();
    assert!(p.fire_callback(session, false));

    assert_eq!(sub.try_recv(), Some(DuckingStateChanged { is_ducked: true }));
    assert_eq!(p.calls(), vec![NativeCall::IsDucked { session }]);
}

#[test]
fn callback_without_subscribers_is_silent() {
    let p = platform();
    let _ctl = DuckingController::new(StreamCategory::Media, p.clone()).unwrap();
    let session = p.session_ids()[0];
    assert!(p.simulate_state_change(session, true));
}

#[test]
fn unsubscribed_handler_is_not_called() {
    let p = platform();
    let ctl = DuckingController::new(StreamCategory::Media, p.clone()).unwrap();
    let session = p.session_ids()[0];

    let hits = Arc::new(AtomicUsize::new(0));
    let h = hits.clone();
    let id = ctl.subscribe(move |_| {
        h.fetch_add(1, Ordering::SeqCst);
    });
    assert!(ctl.unsubscribe(id));

    p.simulate_state_change(session, true);
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[test]
fn each_native_invocation_dispatches_once() {
    let p = platform();
    let ctl = DuckingController::new(StreamCategory::Media, p.clone()).unwrap();
    let session = p.session_ids()[0];
    let sub = ctl.subscribe_channel();

    p.simulate_state_change(session, true);
    p.simulate_state_change(session, true);
    p.simulate_state_change(session, false);

    let mut out = Vec::new();
    sub.drain_into(&mut out);
    let flags: Vec<bool> = out.iter().map(|e| e.is_ducked).collect();
    assert_eq!(flags, vec![true, true, false]);
}

#[test]
fn end_to_end_media_session() {
    let p = platform();
    let ctl = DuckingController::new(StreamCategory::Media, p.clone()).unwrap();
    let session = p.session_ids()[0];
    let sub = ctl.subscribe_channel();

    ctl.activate(1000, 0.5).unwrap();
    assert!(p.simulate_state_change(session, true));

    assert_eq!(sub.try_recv(), Some(DuckingStateChanged { is_ducked: true }));
    assert_eq!(sub.try_recv(), None);

    ctl.deactivate().unwrap();
    ctl.release();
    assert!(matches!(ctl.is_ducked(), Err(DuckingError::InvalidState(_))));
}

#[test]
fn async_platform_callback_reaches_channel() {
    let p = Arc::new(NullDuckingPlatform::with_auto_notify(true));
    let ctl = DuckingController::new(StreamCategory::Media, p.clone()).unwrap();
    let sub = ctl.subscribe_channel();

    ctl.activate(200, 0.4).unwrap();
    assert_eq!(
        sub.recv_timeout(Duration::from_secs(5)),
        Some(DuckingStateChanged { is_ducked: true })
    );

    ctl.deactivate().unwrap();
    assert_eq!(
        sub.recv_timeout(Duration::from_secs(5)),
        Some(DuckingStateChanged { is_ducked: false })
    );
}

#[test]
fn release_races_with_callbacks_without_touching_freed_session() {
    let p = Arc::new(NullDuckingPlatform::new());
    let ctl = Arc::new(DuckingController::new(StreamCategory::Media, p.clone()).unwrap());
    let session = p.session_ids()[0];

    let firing = {
        let p = p.clone();
        std::thread::spawn(move || {
            for i in 0..500 {
                p.simulate_state_change(session, i % 2 == 0);
            }
        })
    };

    std::thread::sleep(Duration::from_millis(1));
    ctl.release();
    firing.join().unwrap();

    let calls = p.calls();
    let release_at = calls
        .iter()
        .position(|c| matches!(c, NativeCall::Release { .. }))
        .unwrap();
    assert!(!calls[release_at..]
        .iter()
        .any(|c| matches!(c, NativeCall::IsDucked { .. })));
}

#[test]
fn inline_callback_dispatches_before_activate_returns() {
    let p = Arc::new(NullDuckingPlatform::with_notify(NotifyMode::Inline));
    let ctl = DuckingController::new(StreamCategory::Media, p.clone()).unwrap();
    let sub = ctl.subscribe_channel();

    ctl.activate(100, 0.5).unwrap();
    assert_eq!(sub.try_recv(), Some(DuckingStateChanged { is_ducked: true }));

    ctl.deactivate().unwrap();
    assert_eq!(sub.try_recv(), Some(DuckingStateChanged { is_ducked: false }));
}

#[test]
fn handler_releasing_during_inline_callback_does_not_deadlock() {
    let p = Arc::new(NullDuckingPlatform::with_notify(NotifyMode::Inline));
    let ctl = Arc::new(DuckingController::new(StreamCategory::Media, p.clone()).unwrap());
    let session = p.session_ids()[0];

    let weak = Arc::downgrade(&ctl);
    ctl.subscribe(move |_| {
        if let Some(ctl) = weak.upgrade() {
            ctl.release();
        }
    });

    let (tx, rx) = crossbeam_channel::bounded(1);
    let worker = {
        let ctl = ctl.clone();
        std::thread::spawn(move || {
            let _ = tx.send(ctl.activate(100, 0.5));
        })
    };

    let outcome = rx
        .recv_timeout(Duration::from_secs(5))
        .expect("activate did not return");
    worker.join().unwrap();
    assert_eq!(outcome, Ok(()));

    assert!(ctl.is_released());
    assert!(matches!(ctl.is_ducked(), Err(DuckingError::InvalidState(_))));
    assert_eq!(p.live_sessions(), 0);

    // Freed once, after the in-flight activate and re-query finished with the handle.
    assert_eq!(
        p.calls(),
        vec![
            NativeCall::Create { category: StreamCategory::Media },
            NativeCall::Activate { session, duration_ms: 100, ratio: 0.5 },
            NativeCall::IsDucked { session },
            NativeCall::Release { session },
        ]
    );

    drop(ctl);
    assert_eq!(count(&p, |c| matches!(c, NativeCall::Release { .. })), 1);
}
