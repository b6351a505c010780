//! Top-level application state and frame loop.
//!
//! `AppState` owns the `GestureInterpreter`, the `ParticleField` and the
//! values shown in the HUD.  It consumes `DetectionOutcome`s and is read by
//! the visualizer each frame.

use std::sync::mpsc::{self, Sender};
use std::time::Instant;

use field_analysis::{AnalysisClient, LocalAnalyst};
use hand_signal::{ControlSignal, GestureInterpreter};
use log::{debug, info, warn};
use particle_field::{Particle, ParticleField};

use crate::analyst::AnalysisWorker;
use crate::config::{AppConfig, DetectorKind};
use crate::detector::{
    DetectionOutcome, DetectorWorker, PipeDetector, SimDetector, SimInput,
};
use crate::error::{AppError, DetectorError};
use crate::palette::Gauge;
use crate::visualizer::Visualizer;

// ════════════════════════════════════════════════════════════════════════════
// AppState
// ════════════════════════════════════════════════════════════════════════════

pub struct AppState {
    // ── control ──────────────────────────────────────────────────────────
    interpreter: GestureInterpreter,
    signal:      ControlSignal,

    // ── simulation ───────────────────────────────────────────────────────
    field:       ParticleField,
    width:       f32,
    height:      f32,

    // ── frame bookkeeping ────────────────────────────────────────────────
    frame:                u64,
    last_timestamp_ms:    Option<u64>,
    last_detection_frame: Option<u64>,

    // ── HUD ──────────────────────────────────────────────────────────────
    chaos_gauge:      Gauge,
    scale_gauge:      Gauge,
    analysis:         Option<String>,
    analysis_pending: bool,
    status:           String,
}

impl AppState {
    pub fn new(cfg: &AppConfig) -> Self {
        let seed   = cfg.seed.unwrap_or_else(rand::random);
        let width  = cfg.window.width as f32;
        let height = cfg.window.height as f32;

        let interpreter = GestureInterpreter::with_initial(cfg.initial_chaos, cfg.initial_scale);
        let signal      = interpreter.current();
        let field       = ParticleField::new(&cfg.field, width, height, seed);
        info!("field ready: {} particles, seed {}", field.len(), seed);

        AppState {
            interpreter,
            signal,
            field,
            width,
            height,
            frame:                0,
            last_timestamp_ms:    None,
            last_detection_frame: None,
            chaos_gauge:          Gauge::new(signal.chaos()),
            scale_gauge:          Gauge::new(signal.scale()),
            analysis:             None,
            analysis_pending:     false,
            status:               "Ready. Show a hand (or press 1 / 2).".to_string(),
        }
    }

    /// Start a new frame.  Returns its number and a detection timestamp that
    /// is strictly greater than the previous one, even if the clock stalls.
    pub fn next_frame(&mut self, elapsed_ms: u64) -> (u64, u64) {
        self.frame += 1;
        let ts = match self.last_timestamp_ms {
            Some(last) => elapsed_ms.max(last + 1),
            None       => elapsed_ms,
        };
        self.last_timestamp_ms = Some(ts);
        (self.frame, ts)
    }

    // ── process one DetectionOutcome ─────────────────────────────────────

    /// Feed a finished detection to the interpreter.  Results for frames
    /// older than one already applied are ignored; returns whether it was
    /// applied.
    pub fn apply_detection(&mut self, outcome: DetectionOutcome) -> bool {
        let frame = outcome.frame();
        if let Some(last) = self.last_detection_frame {
            if frame <= last {
                debug!("ignoring stale detection for frame {} (have {})", frame, last);
                return false;
            }
        }
        self.last_detection_frame = Some(frame);

        match outcome {
            DetectionOutcome::Hands(f) => {
                self.signal = self.interpreter.interpret(&f.hands);
                self.status = if self.signal.is_active() {
                    format!(
                        "Tracking {} hand(s)  chaos={:.2}  scale={:.2}",
                        f.hands.len(), self.signal.chaos(), self.signal.scale()
                    )
                } else {
                    format!(
                        "Waiting for hands  (holding chaos={:.2} scale={:.2})",
                        self.signal.chaos(), self.signal.scale()
                    )
                };
            }
            DetectionOutcome::Failed { reason, .. } => {
                self.signal = self.interpreter.interpret(&[]);
                self.status = format!("Detector error: {}", reason);
            }
        }
        true
    }

    // ── Per-frame tick ────────────────────────────────────────────────────

    pub fn tick(&mut self) {
        self.field.tick(&self.signal, self.width, self.height);
        self.chaos_gauge.tick(self.signal.chaos());
        self.scale_gauge.tick(self.signal.scale());
    }

    // ── Analysis ──────────────────────────────────────────────────────────

    pub fn begin_analysis(&mut self) {
        self.analysis_pending = true;
    }

    pub fn set_analysis(&mut self, text: String) {
        self.analysis = Some(text);
        self.analysis_pending = false;
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    // ── Accessors for the render loop ─────────────────────────────────────

    pub fn signal(&self)           -> ControlSignal  { self.signal }
    pub fn particles(&self)        -> &[Particle]    { self.field.particles() }
    pub fn field(&self)            -> &ParticleField { &self.field }
    pub fn frame(&self)            -> u64            { self.frame }
    pub fn chaos_gauge(&self)      -> f32            { self.chaos_gauge.shown }
    pub fn scale_gauge(&self)      -> f32            { self.scale_gauge.shown }
    pub fn analysis(&self)         -> Option<&str>   { self.analysis.as_deref() }
    pub fn analysis_pending(&self) -> bool           { self.analysis_pending }
    pub fn status(&self)           -> &str           { &self.status }
    pub fn extent(&self)           -> (f32, f32)     { (self.width, self.height) }
}

// ════════════════════════════════════════════════════════════════════════════
// Detector selection
// ════════════════════════════════════════════════════════════════════════════

/// Start the configured detector.  With the keyboard simulation the returned
/// sender feeds it from the window.
pub fn open_detector(
    cfg: &AppConfig,
) -> (Option<Sender<SimInput>>, Result<DetectorWorker, DetectorError>) {
    match cfg.detector.kind {
        DetectorKind::Simulated => {
            let (sim_tx, sim_rx) = mpsc::channel::<SimInput>();
            (Some(sim_tx), Ok(DetectorWorker::spawn(SimDetector::new(sim_rx))))
        }
        DetectorKind::Pipe => {
            let worker = PipeDetector::spawn(&cfg.detector.command, cfg.detector.min_score)
                .map(DetectorWorker::spawn);
            (None, worker)
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// run(): the main application loop
// ════════════════════════════════════════════════════════════════════════════

/// Run the full application.
///
/// A detector that fails to start is not fatal: the field keeps running on
/// its initial values and the status line says why.
pub fn run(cfg: AppConfig) -> Result<(), AppError> {
    cfg.validate()?;

    let mut app = AppState::new(&cfg);

    // ── Detector ──────────────────────────────────────────────────────────
    let (sim_tx, detector) = open_detector(&cfg);
    let mut detector = match detector {
        Ok(worker) => {
            app.set_status(format!("Detector: {}", worker.name()));
            Some(worker)
        }
        Err(e) => {
            warn!("running without a detector: {}", e);
            app.set_status(format!("DETECTOR OFFLINE: {}", e));
            None
        }
    };

    // ── Analysis ──────────────────────────────────────────────────────────
    let analyst = cfg
        .analysis
        .enabled
        .then(|| AnalysisWorker::spawn(AnalysisClient::new(LocalAnalyst::new())));

    // ── Visualizer ────────────────────────────────────────────────────────
    let mut vis = Visualizer::new(&cfg.window, sim_tx)?;

    // ── Main loop ─────────────────────────────────────────────────────────
    let start = Instant::now();
    while vis.is_open() {
        // 1. Keyboard
        let input = vis.poll_input();
        if input.quit { break; }

        // 2. Detection: ask for this frame, take whatever has finished
        let (frame, ts) = app.next_frame(start.elapsed().as_millis() as u64);
        if let Some(det) = &detector {
            det.request(frame, ts);
            if let Some(outcome) = det.poll() {
                app.apply_detection(outcome);
            }
        }

        // 3. Analysis
        if input.analyze {
            match &analyst {
                Some(a) => {
                    let s = app.signal();
                    if a.request(s.chaos(), s.scale(), cfg.analysis.query.clone()) {
                        app.begin_analysis();
                    }
                }
                None => app.set_status("Analysis is disabled"),
            }
        }
        if let Some(text) = analyst.as_ref().and_then(|a| a.poll()) {
            app.set_analysis(text);
        }

        // 4. Simulation
        app.tick();

        // 5. Render
        vis.render(&app)?;
    }

    // ── Shutdown ──────────────────────────────────────────────────────────
    info!("shutting down after {} frames", app.frame());
    if let Some(det) = detector.as_mut() {
        det.shutdown();
    }
    if let Some(a) = &analyst {
        a.quit();
    }
    Ok(())
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
