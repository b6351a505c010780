//! Hand detection: from an external landmark process or keyboard simulation.
//!
//! The public interface is [`HandDetector`], driven by a [`DetectorWorker`]
//! on its own thread.  The frame loop requests a detection per frame and
//! picks up the newest finished result from a [`LatestCell`]; it never waits
//! for the detector.

use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use hand_signal::wire::{encode_request, parse_detection};
use hand_signal::{HandObservation, Handedness, Landmark, OPENNESS_GAIN};
use log::{debug, info, warn};

use crate::error::DetectorError;
use crate::latest::LatestCell;

// ════════════════════════════════════════════════════════════════════════════
// HandDetector trait: unified interface for real and simulated detectors
// ════════════════════════════════════════════════════════════════════════════

/// Anything that can report the hands visible at a point in time.
///
/// Timestamps passed to [`HandDetector::detect`] increase strictly.
pub trait HandDetector: Send + 'static {
    fn detect(&mut self, timestamp_ms: u64) -> Result<Vec<HandObservation>, DetectorError>;

    /// Short label for the status line.
    fn name(&self) -> &'static str;

    /// Handle that can tear the detector down from another thread, even
    /// while a detection is blocked.
    fn kill_handle(&self) -> Option<KillHandle> { None }
}

/// Kills a detector's helper process from outside the detection thread.
#[derive(Clone, Debug)]
pub struct KillHandle {
    child: Arc<Mutex<Child>>,
}

impl KillHandle {
    /// Kill and reap the process.  Safe to call more than once.
    pub fn kill(&self) {
        let mut child = self.child.lock().unwrap_or_else(|e| e.into_inner());
        let _ = child.kill();
        let _ = child.wait();
    }

    pub fn is_running(&self) -> bool {
        let mut child = self.child.lock().unwrap_or_else(|e| e.into_inner());
        matches!(child.try_wait(), Ok(None))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Requests and results
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DetectionRequest {
    pub frame:        u64,
    pub timestamp_ms: u64,
}

/// Hands found for the frame the request was issued in.
#[derive(Clone, Debug, PartialEq)]
pub struct DetectionFrame {
    pub frame:        u64,
    pub timestamp_ms: u64,
    pub hands:        Vec<HandObservation>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum DetectionOutcome {
    Hands(DetectionFrame),
    Failed { frame: u64, reason: String },
}

impl DetectionOutcome {
    pub fn frame(&self) -> u64 {
        match self {
            DetectionOutcome::Hands(f)          => f.frame,
            DetectionOutcome::Failed { frame, .. } => *frame,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// DetectorWorker: the detection thread
// ════════════════════════════════════════════════════════════════════════════

/// Handle to the detection thread.
///
/// At most one request is in flight: [`DetectorWorker::request`] refuses new
/// work while the previous detection is still running.
pub struct DetectorWorker {
    req_tx:  Option<Sender<DetectionRequest>>,
    results: LatestCell<DetectionOutcome>,
    busy:    Arc<AtomicBool>,
    stop:    Arc<AtomicBool>,
    thread:  Option<JoinHandle<()>>,
    killer:  Option<KillHandle>,
    name:    &'static str,
}

impl DetectorWorker {
    /// Move `detector` onto its own thread.
    pub fn spawn<D: HandDetector>(detector: D) -> Self {
        let (req_tx, req_rx) = mpsc::channel::<DetectionRequest>();
        let results = LatestCell::new();
        let busy    = Arc::new(AtomicBool::new(false));
        let stop    = Arc::new(AtomicBool::new(false));
        let name    = detector.name();
        let killer  = detector.kill_handle();

        let thread = {
            let results = results.clone();
            let busy    = Arc::clone(&busy);
            let stop    = Arc::clone(&stop);
            thread::spawn(move || detector_thread(detector, req_rx, results, busy, stop))
        };

        info!("detector worker started ({})", name);
        DetectorWorker {
            req_tx: Some(req_tx),
            results,
            busy,
            stop,
            thread: Some(thread),
            killer,
            name,
        }
    }

    pub fn name(&self) -> &'static str { self.name }

    pub fn is_busy(&self) -> bool { self.busy.load(Ordering::Acquire) }

    /// Ask for the hands at `timestamp_ms` on behalf of `frame`.
    /// Returns false when a detection is still running or the worker is gone.
    pub fn request(&self, frame: u64, timestamp_ms: u64) -> bool {
        let Some(tx) = &self.req_tx else { return false };
        if self.busy.swap(true, Ordering::AcqRel) {
            return false;
        }
        if tx.send(DetectionRequest { frame, timestamp_ms }).is_err() {
            self.busy.store(false, Ordering::Release);
            return false;
        }
        true
    }

    /// Newest finished detection, if one arrived since the last poll.
    pub fn poll(&self) -> Option<DetectionOutcome> { self.results.take() }

    /// Stop the thread and release the detector.  A helper process is
    /// killed first, which unblocks a detection stuck waiting on it; the
    /// call returns once the thread has exited.
    pub fn shutdown(&mut self) {
        if self.req_tx.take().is_some() {
            self.stop.store(true, Ordering::Release);
            info!("detector worker stopping ({})", self.name);
        }
        if let Some(killer) = self.killer.take() {
            killer.kill();
        }
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("detector thread panicked ({})", self.name);
            }
        }
    }
}

impl Drop for DetectorWorker {
    fn drop(&mut self) { self.shutdown(); }
}

fn detector_thread<D: HandDetector>(
    mut detector: D,
    req_rx:       Receiver<DetectionRequest>,
    results:      LatestCell<DetectionOutcome>,
    busy:         Arc<AtomicBool>,
    stop:         Arc<AtomicBool>,
) {
    for req in req_rx {
        if stop.load(Ordering::Acquire) { break; }

        let outcome = match detector.detect(req.timestamp_ms) {
            Ok(hands) => DetectionOutcome::Hands(DetectionFrame {
                frame:        req.frame,
                timestamp_ms: req.timestamp_ms,
                hands,
            }),
            Err(e) => {
                warn!("[detector] frame {}: {}", req.frame, e);
                DetectionOutcome::Failed { frame: req.frame, reason: e.to_string() }
            }
        };
        results.put(outcome);
        busy.store(false, Ordering::Release);
    }
    info!("[detector] {} released", detector.name());
}

// ════════════════════════════════════════════════════════════════════════════
// PipeDetector: external landmark process
// ════════════════════════════════════════════════════════════════════════════

/// Detector backed by an external process that owns the camera and the
/// landmark model.
///
/// # Protocol
///
/// * After start-up the process prints `READY` on its own line.
/// * For each detection we write `{"timestamp_ms":N}` plus newline.
/// * It answers with one JSON line (see [`hand_signal::wire`]).
///
/// The process is killed when the detector is dropped.
pub struct PipeDetector {
    child:     Arc<Mutex<Child>>,
    stdin:     ChildStdin,
    stdout:    BufReader<ChildStdout>,
    min_score: f32,
}

impl PipeDetector {
    pub fn spawn(command: &[String], min_score: f32) -> Result<Self, DetectorError> {
        let (program, args) = command.split_first().ok_or(DetectorError::NoCommand)?;
        info!("starting landmark detector: {}", command.join(" "));

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| DetectorError::Spawn { command: command.join(" "), source })?;

        let (stdin, stdout) = match (child.stdin.take(), child.stdout.take()) {
            (Some(i), Some(o)) => (i, o),
            _ => {
                let _ = child.kill();
                return Err(DetectorError::Closed);
            }
        };
        let mut stdout = BufReader::new(stdout);

        let mut ready = String::new();
        let read = stdout.read_line(&mut ready);
        if !matches!(read, Ok(n) if n > 0) || ready.trim() != "READY" {
            let _ = child.kill();
            return Err(match read {
                Err(e) => DetectorError::Io(e),
                Ok(0)  => DetectorError::Closed,
                Ok(_)  => DetectorError::NotReady(ready.trim().to_string()),
            });
        }

        info!("landmark detector ready");
        Ok(PipeDetector { child: Arc::new(Mutex::new(child)), stdin, stdout, min_score })
    }
}

impl HandDetector for PipeDetector {
    fn detect(&mut self, timestamp_ms: u64) -> Result<Vec<HandObservation>, DetectorError> {
        writeln!(self.stdin, "{}", encode_request(timestamp_ms))?;
        self.stdin.flush()?;

        let mut line = String::new();
        if self.stdout.read_line(&mut line)? == 0 {
            return Err(DetectorError::Closed);
        }

        let msg = parse_detection(&line)?;
        if let Some(err) = msg.error {
            return Err(DetectorError::Reported(err));
        }
        let hands = msg.observations(self.min_score);
        debug!("[pipe] t={} hands={}", timestamp_ms, hands.len());
        Ok(hands)
    }

    fn name(&self) -> &'static str { "landmark pipe" }

    fn kill_handle(&self) -> Option<KillHandle> {
        Some(KillHandle { child: Arc::clone(&self.child) })
    }
}

impl Drop for PipeDetector {
    fn drop(&mut self) {
        KillHandle { child: Arc::clone(&self.child) }.kill();
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SimDetector: keyboard simulation (always available)
// ════════════════════════════════════════════════════════════════════════════

/// Raw input event from the simulation window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimInput {
    KeyDown(SimKey),
}

/// Simulated key codes (mapped from minifb keys by the visualizer).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimKey {
    ToggleLeft,   // 1
    ToggleRight,  // 2
    OpenLeft,     // W
    CloseLeft,    // S
    OpenRight,    // Up
    CloseRight,   // Down
}

/// Per-key change in openness.
pub const SIM_STEP: f32 = 0.05;

/// State of the two simulated hands.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimHands {
    pub left_visible:  bool,
    pub right_visible: bool,
    pub left_open:     f32,
    pub right_open:    f32,
}

impl Default for SimHands {
    fn default() -> Self {
        SimHands {
            left_visible:  false,
            right_visible: false,
            left_open:     0.1,
            right_open:    0.5,
        }
    }
}

impl SimHands {
    pub fn apply(&mut self, key: SimKey) {
        let bump = |v: f32, d: f32| (v + d).clamp(0.0, 1.0);
        match key {
            SimKey::ToggleLeft  => self.left_visible  = !self.left_visible,
            SimKey::ToggleRight => self.right_visible = !self.right_visible,
            SimKey::OpenLeft    => self.left_open  = bump(self.left_open,   SIM_STEP),
            SimKey::CloseLeft   => self.left_open  = bump(self.left_open,  -SIM_STEP),
            SimKey::OpenRight   => self.right_open = bump(self.right_open,  SIM_STEP),
            SimKey::CloseRight  => self.right_open = bump(self.right_open, -SIM_STEP),
        }
    }

    /// Synthetic observations for the visible hands.  The index tip sits
    /// straight above the thumb at the distance that yields the openness.
    pub fn observations(&self) -> Vec<HandObservation> {
        let hand = |h: Handedness, x: f32, open: f32| {
            let thumb = Landmark::new(x, 0.6);
            let index = Landmark::new(x, 0.6 - open / OPENNESS_GAIN);
            HandObservation::pinch(h, thumb, index)
        };
        let mut out = Vec::with_capacity(2);
        if self.left_visible  { out.push(hand(Handedness::Left,  0.3, self.left_open));  }
        if self.right_visible { out.push(hand(Handedness::Right, 0.7, self.right_open)); }
        out
    }
}

/// Detector driven by [`SimInput`] events from the visualizer's window.
pub struct SimDetector {
    rx:    Receiver<SimInput>,
    hands: SimHands,
}

impl SimDetector {
    pub fn new(rx: Receiver<SimInput>) -> Self {
        SimDetector { rx, hands: SimHands::default() }
    }

    pub fn hands(&self) -> &SimHands { &self.hands }
}

impl HandDetector for SimDetector {
    fn detect(&mut self, _timestamp_ms: u64) -> Result<Vec<HandObservation>, DetectorError> {
        loop {
            match self.rx.try_recv() {
                Ok(SimInput::KeyDown(key)) => self.hands.apply(key),
                Err(TryRecvError::Empty) => break,
                // Window gone: keep reporting the last hands until shutdown.
                Err(TryRecvError::Disconnected) => break,
            }
        }
        Ok(self.hands.observations())
    }

    fn name(&self) -> &'static str { "keyboard simulation" }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn wait_for(worker: &DetectorWorker) -> DetectionOutcome {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(o) = worker.poll() { return o; }
            assert!(Instant::now() < deadline, "detector never answered");
            thread::sleep(Duration::from_millis(1));
        }
    }

    struct Failing;
    impl HandDetector for Failing {
        fn detect(&mut self, _: u64) -> Result<Vec<HandObservation>, DetectorError> {
            Err(DetectorError::Reported("camera unplugged".to_string()))
        }
        fn name(&self) -> &'static str { "failing" }
    }

    #[test]
    fn sim_hands_start_hidden() {
        assert!(SimHands::default().observations().is_empty());
    }

    #[test]
    fn sim_openness_round_trips_through_landmarks() {
        let mut h = SimHands::default();
        h.apply(SimKey::ToggleLeft);
        h.apply(SimKey::OpenLeft);
        h.apply(SimKey::OpenLeft);
        let obs = h.observations();
        assert_eq!(obs.len(), 1);
        assert_eq!(obs[0].handedness, Handedness::Left);
        assert!((obs[0].openness().unwrap() - 0.2).abs() < 1e-5);
    }

    #[test]
    fn sim_openness_is_clamped() {
        let mut h = SimHands::default();
        for _ in 0..40 { h.apply(SimKey::CloseRight); }
        assert_eq!(h.right_open, 0.0);
        for _ in 0..40 { h.apply(SimKey::OpenRight); }
        assert_eq!(h.right_open, 1.0);
    }

    #[test]
    fn sim_detector_applies_pending_keys() {
        let (tx, rx) = mpsc::channel();
        let mut det = SimDetector::new(rx);
        tx.send(SimInput::KeyDown(SimKey::ToggleRight)).unwrap();
        tx.send(SimInput::KeyDown(SimKey::ToggleLeft)).unwrap();
        let hands = det.detect(0).unwrap();
        assert_eq!(hands.len(), 2);
        assert_eq!(hands[0].handedness, Handedness::Left);
        assert_eq!(hands[1].handedness, Handedness::Right);
    }

    #[test]
    fn worker_tags_result_with_request_frame() {
        let (tx, rx) = mpsc::channel();
        tx.send(SimInput::KeyDown(SimKey::ToggleLeft)).unwrap();
        let mut worker = DetectorWorker::spawn(SimDetector::new(rx));
        assert!(worker.request(7, 700));
        match wait_for(&worker) {
            DetectionOutcome::Hands(f) => {
                assert_eq!(f.frame, 7);
                assert_eq!(f.timestamp_ms, 700);
                assert_eq!(f.hands.len(), 1);
            }
            other => panic!("unexpected {:?}", other),
        }
        worker.shutdown();
        assert!(!worker.request(8, 800));
    }

    #[test]
    fn worker_reports_failures_as_outcomes() {
        let worker = DetectorWorker::spawn(Failing);
        assert!(worker.request(3, 30));
        let outcome = wait_for(&worker);
        assert_eq!(outcome.frame(), 3);
        assert!(matches!(outcome, DetectionOutcome::Failed { ref reason, .. } if reason.contains("camera")));
    }

    #[test]
    fn pipe_with_empty_command_fails() {
        assert!(matches!(PipeDetector::spawn(&[], 0.5), Err(DetectorError::NoCommand)));
    }

    #[cfg(unix)]
    fn sh(script: &str) -> Vec<String> {
        vec!["sh".to_string(), "-c".to_string(), script.to_string()]
    }

    #[cfg(unix)]
    #[test]
    fn shutdown_kills_helper_blocked_in_detection() {
        let det = PipeDetector::spawn(&sh("echo READY; exec sleep 30"), 0.5).unwrap();
        let child = det.kill_handle().unwrap();
        let mut worker = DetectorWorker::spawn(det);

        assert!(worker.request(1, 16));
        thread::sleep(Duration::from_millis(50));
        assert!(worker.is_busy());
        assert!(child.is_running());

        let started = Instant::now();
        worker.shutdown();
        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(!child.is_running());
        assert!(!worker.request(2, 32));
    }

    #[cfg(unix)]
    #[test]
    fn dropping_worker_kills_idle_helper() {
        let det = PipeDetector::spawn(&sh("echo READY; exec sleep 30"), 0.5).unwrap();
        let child = det.kill_handle().unwrap();
        drop(DetectorWorker::spawn(det));
        assert!(!child.is_running());
    }

    #[cfg(unix)]
    #[test]
    fn pipe_round_trip_through_helper() {
        let reply = r#"{"timestamp_ms":5,"hands":[{"handedness":"Left","score":0.9,"landmarks":[]}]}"#;
        let script = format!("echo READY; read line; echo '{}'; exec sleep 30", reply);
        let mut det = PipeDetector::spawn(&sh(&script), 0.5).unwrap();
        // Empty landmark list: accepted on the wire, absent to the interpreter.
        let hands = det.detect(5).unwrap();
        assert_eq!(hands.len(), 1);
        assert!(hands[0].openness().is_none());
    }

    #[test]
    fn pipe_with_missing_program_fails() {
        let cmd = vec!["definitely-not-a-landmark-detector-binary".to_string()];
        assert!(matches!(PipeDetector::spawn(&cmd, 0.5), Err(DetectorError::Spawn { .. })));
    }
}
