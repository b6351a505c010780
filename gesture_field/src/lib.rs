//! # gesture_field
//!
//! Interactive particle field steered by two hands: the pinch of the left
//! hand sets the **chaos** of the field, the pinch of the right hand its
//! **scale**.  Rendered live in a software framebuffer window.
//!
//! ## Gesture → Control mapping
//!
//! | Gesture | Hand | Control |
//! |---|---|---|
//! | Thumb–index pinch, opened | Left | Chaos ↑ (more jitter, faster spin, shorter trails) |
//! | Thumb–index pinch, closed | Left | Chaos ↓ |
//! | Thumb–index pinch, opened | Right | Scale ↑ (wider orbits) |
//! | Thumb–index pinch, closed | Right | Scale ↓ (field collapses to the centre) |
//! | No hands in view | - | Field keeps the last values; "NO HANDS DETECTED" |
//!
//! ## Detectors
//!
//! * `simulated` (default): keyboard-driven synthetic hands.
//! * `pipe`: an external landmark process speaking JSON lines, see
//!   [`detector::PipeDetector`].
//!
//! ### Keyboard
//!
//! | Key | Action |
//! |---|---|
//! | `1` / `2` | Show / hide the simulated left / right hand |
//! | `W` / `S` (hold) | Open / close the left pinch |
//! | `Up` / `Down` (hold) | Open / close the right pinch |
//! | `Space` | Request a field analysis |
//! | `Q` / `Escape` | Quit |

pub mod analyst;
pub mod app;
pub mod config;
pub mod detector;
pub mod error;
pub mod latest;
pub mod palette;
pub mod visualizer;
