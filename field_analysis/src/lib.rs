//! # field_analysis
//!
//! Turn a `(chaos, scale)` reading of the particle field into a short
//! descriptive text.
//!
//! * [`AnalysisBackend`]: anything that can produce text, and may fail.
//! * [`LocalAnalyst`]: deterministic backend built from band vocabularies.
//! * [`AnalysisClient`]: the caller-facing wrapper: never fails, returns
//!   [`FALLBACK_ANALYSIS`] when the backend does.
//!
//! ## Quick start
//!
//! ```rust
//! use field_analysis::{AnalysisClient, LocalAnalyst, Voice};
//!
//! let mut client = AnalysisClient::new(
//!     LocalAnalyst::new().voice(Voice::Telemetry).percentages(true),
//! );
//! let text = client.generate_analysis(0.82, 0.15, Some("is it stable?"));
//! assert!(text.contains("MAELSTROM"));
//! ```

use log::{debug, warn};
use thiserror::Error;

/// Returned by [`AnalysisClient`] whenever the backend fails.
pub const FALLBACK_ANALYSIS: &str = "ANALYSIS FAILED. SIGNAL LOST IN THE VOID.";

// ════════════════════════════════════════════════════════════════════════════
// AnalysisError
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Error, PartialEq)]
pub enum AnalysisError {
    #[error("reading out of range: chaos={chaos}, scale={scale}")]
    InvalidReading { chaos: f32, scale: f32 },

    #[error("backend produced no text")]
    Empty,

    #[error("backend failure: {0}")]
    Backend(String),
}

// ════════════════════════════════════════════════════════════════════════════
// ControlReading
// ════════════════════════════════════════════════════════════════════════════

/// A validated pair of control values.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ControlReading {
    chaos: f32,
    scale: f32,
}

impl ControlReading {
    /// Both values must be finite and inside `[0, 1]`.
    pub fn new(chaos: f32, scale: f32) -> Result<Self, AnalysisError> {
        let ok = |v: f32| v.is_finite() && (0.0..=1.0).contains(&v);
        if ok(chaos) && ok(scale) {
            Ok(ControlReading { chaos, scale })
        } else {
            Err(AnalysisError::InvalidReading { chaos, scale })
        }
    }

    pub fn chaos(&self) -> f32 { self.chaos }
    pub fn scale(&self) -> f32 { self.scale }

    pub fn chaos_band(&self) -> ChaosBand { ChaosBand::of(self.chaos) }
    pub fn scale_band(&self) -> ScaleBand { ScaleBand::of(self.scale) }
}

// ════════════════════════════════════════════════════════════════════════════
// Bands: vocabulary for each control axis
// ════════════════════════════════════════════════════════════════════════════

/// Quartile bands of the chaos axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChaosBand {
    Order,
    Flux,
    Turbulence,
    Maelstrom,
}

impl ChaosBand {
    pub fn of(chaos: f32) -> Self {
        match chaos {
            c if c < 0.25 => ChaosBand::Order,
            c if c < 0.50 => ChaosBand::Flux,
            c if c < 0.75 => ChaosBand::Turbulence,
            _             => ChaosBand::Maelstrom,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ChaosBand::Order      => "ORDER",
            ChaosBand::Flux       => "FLUX",
            ChaosBand::Turbulence => "TURBULENCE",
            ChaosBand::Maelstrom  => "MAELSTROM",
        }
    }

    fn describe(self) -> &'static str {
        match self {
            ChaosBand::Order      => "orbits run clean and unhurried",
            ChaosBand::Flux       => "orbits quicken and the edges begin to shimmer",
            ChaosBand::Turbulence => "orbits accelerate and the trails fray into noise",
            ChaosBand::Maelstrom  => "orbits race at triple speed and every path is torn by jitter",
        }
    }

    fn advice(self) -> &'static str {
        match self {
            ChaosBand::Order      => "open the left hand to inject entropy",
            ChaosBand::Flux       => "hold the left pinch steady to keep the shimmer",
            ChaosBand::Turbulence => "close the left pinch to calm the swarm",
            ChaosBand::Maelstrom  => "close the left hand fully to restore order",
        }
    }
}

/// Quartile bands of the scale axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScaleBand {
    Singularity,
    Compact,
    Nebula,
    Expanse,
}

impl ScaleBand {
    pub fn of(scale: f32) -> Self {
        match scale {
            s if s < 0.25 => ScaleBand::Singularity,
            s if s < 0.50 => ScaleBand::Compact,
            s if s < 0.75 => ScaleBand::Nebula,
            _             => ScaleBand::Expanse,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ScaleBand::Singularity => "SINGULARITY",
            ScaleBand::Compact     => "COMPACT",
            ScaleBand::Nebula      => "NEBULA",
            ScaleBand::Expanse     => "EXPANSE",
        }
    }

    fn describe(self) -> &'static str {
        match self {
            ScaleBand::Singularity => "the swarm collapses toward a single bright point",
            ScaleBand::Compact     => "the swarm holds a tight, dense core",
            ScaleBand::Nebula      => "the swarm spreads into a loose nebular disc",
            ScaleBand::Expanse     => "the swarm stretches past its nominal orbits",
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// AnalysisBackend
// ════════════════════════════════════════════════════════════════════════════

/// A text generator for field readings.
pub trait AnalysisBackend: Send {
    fn analyze(&mut self, reading: &ControlReading, query: Option<&str>)
        -> Result<String, AnalysisError>;
}

// ════════════════════════════════════════════════════════════════════════════
// LocalAnalyst
// ════════════════════════════════════════════════════════════════════════════

/// Register of the generated text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Voice {
    /// One line: `STATE: X / Y`.
    Terse,
    /// Headline plus one sentence per axis.
    #[default]
    Telemetry,
}

/// Deterministic, offline analyst.
///
/// Builder-style configuration:
///
/// ```rust
/// use field_analysis::{AnalysisBackend, ControlReading, LocalAnalyst, Voice};
///
/// let mut a = LocalAnalyst::new().voice(Voice::Terse);
/// let r = ControlReading::new(0.1, 0.9).unwrap();
/// assert_eq!(a.analyze(&r, None).unwrap(), "STATE: ORDER / EXPANSE.");
/// ```
#[derive(Clone, Debug, Default)]
pub struct LocalAnalyst {
    voice:       Voice,
    percentages: bool,
}

impl LocalAnalyst {
    pub fn new() -> Self { LocalAnalyst::default() }

    pub fn voice(mut self, voice: Voice) -> Self {
        self.voice = voice;
        self
    }

    /// Include the raw values as percentages.
    pub fn percentages(mut self, on: bool) -> Self {
        self.percentages = on;
        self
    }

    fn headline(&self, r: &ControlReading) -> String {
        format!("STATE: {} / {}.", r.chaos_band().name(), r.scale_band().name())
    }

    fn axis(&self, label: &str, value: f32, text: &str) -> String {
        if self.percentages {
            format!("{} at {:.0}%: {}.", label, value * 100.0, text)
        } else {
            format!("{}: {}.", label, text)
        }
    }
}

impl AnalysisBackend for LocalAnalyst {
    fn analyze(&mut self, reading: &ControlReading, query: Option<&str>)
        -> Result<String, AnalysisError>
    {
        let mut parts = vec![self.headline(reading)];

        if self.voice == Voice::Telemetry {
            parts.push(self.axis("Entropy", reading.chaos(), reading.chaos_band().describe()));
            parts.push(self.axis("Gravity", reading.scale(), reading.scale_band().describe()));
        }

        if let Some(q) = query.map(str::trim).filter(|q| !q.is_empty()) {
            parts.push(format!("RE \"{}\": {}.", q, reading.chaos_band().advice()));
        }

        let text = parts.join(" ");
        debug!("local analysis: {}", text);
        Ok(text)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// AnalysisClient: the never-fail boundary
// ════════════════════════════════════════════════════════════════════════════

/// Caller-facing analysis entry point.
pub struct AnalysisClient {
    backend: Box<dyn AnalysisBackend>,
}

impl AnalysisClient {
    pub fn new<B: AnalysisBackend + 'static>(backend: B) -> Self {
        AnalysisClient { backend: Box::new(backend) }
    }

    /// Describe the field at `(chaos, scale)`, optionally answering `query`.
    ///
    /// Never fails: any invalid reading or backend error yields
    /// [`FALLBACK_ANALYSIS`].
    pub fn generate_analysis(&mut self, chaos: f32, scale: f32, query: Option<&str>) -> String {
        let result = ControlReading::new(chaos, scale)
            .and_then(|r| self.backend.analyze(&r, query))
            .and_then(|text| if text.trim().is_empty() { Err(AnalysisError::Empty) } else { Ok(text) });

        match result {
            Ok(text) => text,
            Err(e) => {
                warn!("analysis failed: {}", e);
                FALLBACK_ANALYSIS.to_string()
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
