//! JSON line format spoken by external landmark detectors.
//!
//! One line per frame:
//!
//! ```text
//! {"timestamp_ms":1234,"hands":[{"handedness":"Left","score":0.93,
//!   "landmarks":[{"x":0.41,"y":0.62,"z":-0.01}, ...]}],"error":null}
//! ```
//!
//! Extra fields (such as `z`) are ignored.  A hand with an unknown label or
//! a confidence below the caller's threshold is dropped here; a hand with too
//! few landmarks is kept and left for the interpreter to treat as absent.

use log::warn;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{HandObservation, Handedness, Landmark};

#[derive(Debug, Error)]
pub enum WireError {
    #[error("empty detector line")]
    Empty,

    #[error("malformed detector line: {0}")]
    Json(#[from] serde_json::Error),
}

/// One hand as reported by the detector.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HandMessage {
    pub handedness: String,
    #[serde(default = "full_confidence")]
    pub score:      f32,
    #[serde(default)]
    pub landmarks:  Vec<Landmark>,
}

fn full_confidence() -> f32 { 1.0 }

/// One frame of detector output.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionMessage {
    #[serde(default)]
    pub timestamp_ms: Option<u64>,
    #[serde(default)]
    pub hands:        Vec<HandMessage>,
    /// Set by the detector when it could not process the frame.
    #[serde(default)]
    pub error:        Option<String>,
}

impl DetectionMessage {
    /// Convert to observations, dropping hands below `min_score` or with an
    /// unrecognised handedness label.  Detector order is preserved.
    pub fn observations(&self, min_score: f32) -> Vec<HandObservation> {
        self.hands
            .iter()
            .filter(|h| h.score >= min_score)
            .filter_map(|h| match Handedness::from_label(&h.handedness) {
                Some(handedness) => Some(HandObservation::new(handedness, h.landmarks.clone())),
                None => {
                    warn!("ignoring hand with unknown handedness {:?}", h.handedness);
                    None
                }
            })
            .collect()
    }
}

/// Parse a single detector line.
pub fn parse_detection(line: &str) -> Result<DetectionMessage, WireError> {
    let line = line.trim();
    if line.is_empty() {
        return Err(WireError::Empty);
    }
    Ok(serde_json::from_str(line)?)
}

/// Encode a detection request for the detector process.
pub fn encode_request(timestamp_ms: u64) -> String {
    serde_json::json!({ "timestamp_ms": timestamp_ms }).to_string()
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
