//! # hand_signal
//!
//! Gesture-to-parameter extraction.  Each frame the landmark detector hands
//! over zero, one or two [`HandObservation`]s; the [`GestureInterpreter`]
//! turns them into one [`ControlSignal`]:
//!
//! | Hand | Pinch openness controls |
//! |---|---|
//! | Left | `chaos` |
//! | Right | `scale` |
//!
//! Openness is the thumb-tip to index-tip distance in normalised image
//! coordinates, multiplied by [`OPENNESS_GAIN`] and clamped into `[0, 1]`.
//!
//! A hand that is absent (or whose landmarks are unusable) leaves its
//! parameter at the last value, so the field never snaps back to a default
//! when a hand briefly leaves the frame.

use log::{debug, trace};
use serde::{Deserialize, Serialize};

pub use particle_field::ControlSignal;

pub mod wire;

// ════════════════════════════════════════════════════════════════════════════
// Landmark indices (MediaPipe hand model)
// ════════════════════════════════════════════════════════════════════════════

pub mod landmarks {
    pub const WRIST:             usize = 0;
    pub const THUMB_CMC:         usize = 1;
    pub const THUMB_MCP:         usize = 2;
    pub const THUMB_IP:          usize = 3;
    pub const THUMB_TIP:         usize = 4;
    pub const INDEX_FINGER_MCP:  usize = 5;
    pub const INDEX_FINGER_PIP:  usize = 6;
    pub const INDEX_FINGER_DIP:  usize = 7;
    pub const INDEX_FINGER_TIP:  usize = 8;
    pub const MIDDLE_FINGER_MCP: usize = 9;
    pub const MIDDLE_FINGER_TIP: usize = 12;
    pub const RING_FINGER_MCP:   usize = 13;
    pub const RING_FINGER_TIP:   usize = 16;
    pub const PINKY_MCP:         usize = 17;
    pub const PINKY_TIP:         usize = 20;

    /// Landmarks per hand.
    pub const COUNT: usize = 21;
}

/// Scale from pinch distance to openness; a 0.2-unit spread is fully open.
pub const OPENNESS_GAIN: f32 = 5.0;

// ════════════════════════════════════════════════════════════════════════════
// Landmark / Handedness / HandObservation
// ════════════════════════════════════════════════════════════════════════════

/// A landmark in normalised image coordinates (0.0–1.0 on both axes).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32) -> Self { Landmark { x, y } }

    pub fn distance(&self, other: &Landmark) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    fn is_finite(&self) -> bool { self.x.is_finite() && self.y.is_finite() }
}

/// Detector-reported label for which physical hand an observation is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Handedness {
    Left,
    Right,
}

impl Handedness {
    /// Parse a detector label (`"Left"`, `"right"`, …).
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "left"  => Some(Handedness::Left),
            "right" => Some(Handedness::Right),
            _       => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Handedness::Left  => "Left",
            Handedness::Right => "Right",
        }
    }
}

/// One detected hand for one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct HandObservation {
    pub handedness: Handedness,
    pub landmarks:  Vec<Landmark>,
}

impl HandObservation {
    pub fn new(handedness: Handedness, landmarks: Vec<Landmark>) -> Self {
        HandObservation { handedness, landmarks }
    }

    /// Build a full 21-point hand whose only meaningful landmarks are the
    /// thumb and index tips.  The rest are folded onto the wrist below the
    /// thumb.  Used by simulated detectors and tests.
    pub fn pinch(handedness: Handedness, thumb: Landmark, index: Landmark) -> Self {
        let wrist = Landmark::new(thumb.x, (thumb.y + 0.15).min(1.0));
        let mut points = vec![wrist; landmarks::COUNT];
        points[landmarks::THUMB_TIP]        = thumb;
        points[landmarks::INDEX_FINGER_TIP] = index;
        HandObservation::new(handedness, points)
    }

    pub fn thumb_tip(&self) -> Option<&Landmark> {
        self.landmarks.get(landmarks::THUMB_TIP)
    }

    pub fn index_tip(&self) -> Option<&Landmark> {
        self.landmarks.get(landmarks::INDEX_FINGER_TIP)
    }

    /// Thumb-to-index distance, or `None` when either landmark is missing
    /// or not finite.
    pub fn pinch_distance(&self) -> Option<f32> {
        let thumb = self.thumb_tip().filter(|l| l.is_finite())?;
        let index = self.index_tip().filter(|l| l.is_finite())?;
        Some(thumb.distance(index))
    }

    /// Normalised openness of this hand, `None` when malformed.
    pub fn openness(&self) -> Option<f32> {
        self.pinch_distance().map(openness)
    }
}

/// Map a pinch distance to `[0, 1]`.
pub fn openness(distance: f32) -> f32 {
    (distance * OPENNESS_GAIN).max(0.0).min(1.0)
}

// ════════════════════════════════════════════════════════════════════════════
// GestureInterpreter
// ════════════════════════════════════════════════════════════════════════════

/// Frame-by-frame mapping from hand observations to a [`ControlSignal`].
///
/// The only state carried between frames is the last emitted signal.
#[derive(Clone, Debug)]
pub struct GestureInterpreter {
    last: ControlSignal,
}

impl Default for GestureInterpreter {
    fn default() -> Self { GestureInterpreter::new() }
}

impl GestureInterpreter {
    /// Start from `chaos = 0.1`, `scale = 0.5`, inactive.
    pub fn new() -> Self {
        GestureInterpreter { last: ControlSignal::default() }
    }

    /// Start from explicit values (clamped).
    pub fn with_initial(chaos: f32, scale: f32) -> Self {
        GestureInterpreter { last: ControlSignal::new(chaos, scale, false) }
    }

    /// The signal emitted for the most recent frame.
    pub fn current(&self) -> ControlSignal { self.last }

    /// Interpret one frame.
    ///
    /// Observations are applied in order: a later hand with the same label
    /// overwrites an earlier one.  Malformed observations are skipped.  When
    /// no usable hand remains the previous chaos and scale are re-emitted
    /// with `active = false`.
    pub fn interpret(&mut self, hands: &[HandObservation]) -> ControlSignal {
        let mut chaos = self.last.chaos();
        let mut scale = self.last.scale();
        let mut seen  = false;

        for hand in hands {
            let Some(open) = hand.openness() else {
                debug!(
                    "dropping malformed {} hand ({} landmarks)",
                    hand.handedness.name(), hand.landmarks.len()
                );
                continue;
            };
            match hand.handedness {
                Handedness::Left  => chaos = open,
                Handedness::Right => scale = open,
            }
            seen = true;
        }

        self.last = ControlSignal::new(chaos, scale, seen);
        trace!(
            "signal chaos={:.3} scale={:.3} active={}",
            self.last.chaos(), self.last.scale(), self.last.is_active()
        );
        self.last
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
