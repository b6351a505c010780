//! Drive the application state through the simulated detector thread,
//! without opening a window.

use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use gesture_field::app::AppState;
use gesture_field::config::AppConfig;
use gesture_field::detector::{DetectorWorker, SimDetector, SimInput, SimKey};

fn small_config() -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.field.count = 100;
    cfg.seed = Some(3);
    cfg
}

/// Run frames until a detection has been applied, like the frame loop does.
fn frame_until_applied(app: &mut AppState, worker: &DetectorWorker) {
    let deadline = Instant::now() + Duration::from_secs(5);
    let mut elapsed = 0;
    loop {
        elapsed += 16;
        let (frame, ts) = app.next_frame(elapsed);
        worker.request(frame, ts);
        if let Some(outcome) = worker.poll() {
            if app.apply_detection(outcome) {
                app.tick();
                return;
            }
        }
        app.tick();
        assert!(Instant::now() < deadline, "no detection applied");
        thread::sleep(Duration::from_millis(1));
    }
}

#[test]
fn keyboard_hands_steer_the_field() {
    let (tx, rx) = mpsc::channel();
    let mut worker = DetectorWorker::spawn(SimDetector::new(rx));
    let mut app = AppState::new(&small_config());

    frame_until_applied(&mut app, &worker);
    assert!(!app.signal().is_active());

    tx.send(SimInput::KeyDown(SimKey::ToggleLeft)).unwrap();
    for _ in 0..8 { tx.send(SimInput::KeyDown(SimKey::OpenLeft)).unwrap(); }

    // A detection already in flight may see only some of the keys.
    let deadline = Instant::now() + Duration::from_secs(5);
    while !(app.signal().is_active() && (app.signal().chaos() - 0.5).abs() < 1e-4) {
        frame_until_applied(&mut app, &worker);
        assert!(Instant::now() < deadline, "left hand never opened");
    }
    assert!((app.signal().chaos() - 0.5).abs() < 1e-4);
    assert!((app.signal().scale() - 0.5).abs() < 1e-4);

    tx.send(SimInput::KeyDown(SimKey::ToggleLeft)).unwrap();
    let deadline = Instant::now() + Duration::from_secs(5);
    while app.signal().is_active() {
        frame_until_applied(&mut app, &worker);
        assert!(Instant::now() < deadline, "left hand never went away");
    }
    assert!((app.signal().chaos() - 0.5).abs() < 1e-4);

    let (w, h) = app.extent();
    assert!(app.field().stats(app.signal().scale(), w, h).all_finite);
    worker.shutdown();
}

#[test]
fn collapsed_scale_pulls_field_to_centre() {
    let (tx, rx) = mpsc::channel();
    let mut worker = DetectorWorker::spawn(SimDetector::new(rx));
    let mut app = AppState::new(&small_config());

    tx.send(SimInput::KeyDown(SimKey::ToggleRight)).unwrap();
    for _ in 0..20 { tx.send(SimInput::KeyDown(SimKey::CloseRight)).unwrap(); }

    let deadline = Instant::now() + Duration::from_secs(5);
    while !(app.signal().is_active() && app.signal().scale() == 0.0) {
        frame_until_applied(&mut app, &worker);
        assert!(Instant::now() < deadline, "right hand never closed");
    }

    for _ in 0..200 { app.tick(); }
    let (w, h) = app.extent();
    let stats = app.field().stats(0.0, w, h);
    let max_orbit = w.min(h) / 3.0;
    // Spread at scale 0 is a tenth of the nominal orbit; chaos jitter adds a little.
    assert!(stats.mean_radius < max_orbit * 0.1 + 2.0, "mean radius {}", stats.mean_radius);
    worker.shutdown();
}
