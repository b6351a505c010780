//! Colours, trail fading and the animated HUD gauges.

use particle_field::ColorClass;

// ════════════════════════════════════════════════════════════════════════════
// Colour palette: ColorClass → ARGB
// ════════════════════════════════════════════════════════════════════════════

pub const BG_COLOR: u32 = 0xFF05050F;

/// Packed ARGB (0xAARRGGBB, A=0xFF) for a particle colour class.
pub fn class_color(class: ColorClass) -> u32 {
    match class {
        ColorClass::White  => 0xFFF5F5FF,
        ColorClass::Cyan   => 0xFF22D3EE,
        ColorClass::Violet => 0xFFA78BFA,
        ColorClass::Gold   => 0xFFFACC15,
    }
}

/// Alpha-blend two ARGB colours. `t` = 0.0 → all `a`, `t` = 1.0 → all `b`.
pub fn blend(a: u32, b: u32, t: f32) -> u32 {
    let t = t.clamp(0.0, 1.0);
    let lerp = |ca: u32, cb: u32| (ca as f32 * (1.0 - t) + cb as f32 * t).round() as u32;
    let ar = (a >> 16) & 0xFF; let br = (b >> 16) & 0xFF;
    let ag = (a >>  8) & 0xFF; let bg = (b >>  8) & 0xFF;
    let ab =  a        & 0xFF; let bb =  b        & 0xFF;
    0xFF000000 | (lerp(ar, br) << 16) | (lerp(ag, bg) << 8) | lerp(ab, bb)
}

// ════════════════════════════════════════════════════════════════════════════
// Trails
// ════════════════════════════════════════════════════════════════════════════

/// How much of the previous frame is wiped each frame.  Higher chaos means
/// shorter trails.
pub fn trail_fade(chaos: f32) -> f32 {
    0.25 + 0.5 * chaos.clamp(0.0, 1.0)
}

/// Fade every pixel of `buf` toward the background by `amount`.
/// Pixels that rounding would leave stuck snap to the background.
pub fn fade_buffer(buf: &mut [u32], amount: f32) {
    for px in buf.iter_mut() {
        if *px != BG_COLOR {
            let faded = blend(*px, BG_COLOR, amount);
            *px = if faded == *px { BG_COLOR } else { faded };
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Gauge: eased display value for the HUD bars
// ════════════════════════════════════════════════════════════════════════════

/// A bar value that eases toward its target so the HUD does not flicker with
/// detector noise.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Gauge {
    pub shown: f32,
}

impl Gauge {
    pub fn new(value: f32) -> Self { Gauge { shown: value } }

    /// Move a fifth of the way toward `target`; snap when close.
    pub fn tick(&mut self, target: f32) {
        self.shown += (target - self.shown) * 0.2;
        if (target - self.shown).abs() < 1e-3 { self.shown = target; }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
