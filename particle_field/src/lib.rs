//! # particle_field
//!
//! A fixed pool of orbital particles whose motion is steered by two
//! normalised control values:
//!
//! * **chaos**: orbital acceleration and positional jitter
//! * **scale**: how far the orbits spread out from the centre
//!
//! The pool is allocated once by [`ParticleField::new`] and never resized.
//! Each call to [`ParticleField::tick`] advances every particle by one frame;
//! the renderer reads the result through [`ParticleField::particles`].
//!
//! ## Quick start
//!
//! ```rust
//! use particle_field::{ControlSignal, FieldConfig, ParticleField};
//!
//! let mut field = ParticleField::new(&FieldConfig::default(), 800.0, 600.0, 7);
//! let signal = ControlSignal::new(0.3, 0.8, true);
//! for _ in 0..60 {
//!     field.tick(&signal, 800.0, 600.0);
//! }
//! assert!(field.particles().iter().all(|p| p.x().is_finite() && p.y().is_finite()));
//! ```

use std::f32::consts::TAU;

use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

// ════════════════════════════════════════════════════════════════════════════
// Tuning constants
// ════════════════════════════════════════════════════════════════════════════

/// Pool size used when no configuration overrides it.
pub const DEFAULT_PARTICLE_COUNT: usize = 800;

/// Orbit multiplier at `scale = 0` (near collapse).
pub const MIN_SPREAD: f32 = 0.1;

/// Additional orbit multiplier per unit of scale (`0.1 + 1.5 = 1.6` at full scale).
pub const SPREAD_PER_SCALE: f32 = 1.5;

/// Jitter amplitude in pixels at `chaos = 1`.
pub const JITTER_PER_CHAOS: f32 = 5.0;

/// Extra angular velocity per unit of chaos (3× nominal at full chaos).
pub const SPIN_PER_CHAOS: f32 = 2.0;

/// Fraction of the remaining distance to the orbital target covered per tick.
pub const SPRING: f32 = 0.1;

/// Orbital radii are drawn from `[0, min(width, height) / RADIUS_DIVISOR]`.
pub const RADIUS_DIVISOR: f32 = 3.0;

// ════════════════════════════════════════════════════════════════════════════
// ControlSignal
// ════════════════════════════════════════════════════════════════════════════

/// The per-frame control contract shared by gesture extraction and the
/// simulation.
///
/// Both scalars are clamped into `[0, 1]` on construction; a NaN input is
/// stored as `0.0`.  The fields are private so no caller can build an
/// out-of-range signal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ControlSignal {
    chaos:  f32,
    scale:  f32,
    active: bool,
}

impl ControlSignal {
    /// Initial chaos before any hand has been seen.
    pub const DEFAULT_CHAOS: f32 = 0.1;
    /// Initial scale before any hand has been seen.
    pub const DEFAULT_SCALE: f32 = 0.5;

    pub fn new(chaos: f32, scale: f32, active: bool) -> Self {
        ControlSignal {
            chaos: unit(chaos),
            scale: unit(scale),
            active,
        }
    }

    pub fn chaos(&self)     -> f32  { self.chaos }
    pub fn scale(&self)     -> f32  { self.scale }
    pub fn is_active(&self) -> bool { self.active }

    /// Same values, no hands present.
    pub fn idle(self) -> Self {
        ControlSignal { active: false, ..self }
    }
}

impl Default for ControlSignal {
    fn default() -> Self {
        ControlSignal::new(Self::DEFAULT_CHAOS, Self::DEFAULT_SCALE, false)
    }
}

fn unit(v: f32) -> f32 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

// ════════════════════════════════════════════════════════════════════════════
// Control mappings
// ════════════════════════════════════════════════════════════════════════════

/// Orbit radius the particle is pulled toward for the given scale.
pub fn target_radius(orbital_radius: f32, scale: f32) -> f32 {
    orbital_radius * (MIN_SPREAD + scale * SPREAD_PER_SCALE)
}

/// Full width (pixels) of the uniform jitter window for the given chaos.
pub fn jitter_magnitude(chaos: f32) -> f32 {
    chaos * JITTER_PER_CHAOS
}

/// Per-tick angle increment for a particle with `angular_speed`.
pub fn angular_step(angular_speed: f32, chaos: f32) -> f32 {
    angular_speed * (1.0 + chaos * SPIN_PER_CHAOS)
}

// ════════════════════════════════════════════════════════════════════════════
// ColorClass
// ════════════════════════════════════════════════════════════════════════════

/// Cosmetic colour family of a particle.  The renderer picks actual pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColorClass {
    White,
    Cyan,
    Violet,
    Gold,
}

impl ColorClass {
    pub fn all() -> [ColorClass; 4] {
        [ColorClass::White, ColorClass::Cyan, ColorClass::Violet, ColorClass::Gold]
    }

    pub fn name(self) -> &'static str {
        match self {
            ColorClass::White  => "white",
            ColorClass::Cyan   => "cyan",
            ColorClass::Violet => "violet",
            ColorClass::Gold   => "gold",
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Particle
// ════════════════════════════════════════════════════════════════════════════

/// One orbital entity.
///
/// Only the position and the orbital angle change after construction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle {
    x:             f32,
    y:             f32,
    angle:         f32,
    radius:        f32,
    angular_speed: f32,
    size:          f32,
    color:         ColorClass,
}

impl Particle {
    /// Build a particle sitting exactly on its nominal orbit around
    /// `(center_x, center_y)`.
    pub fn new(
        center_x:      f32,
        center_y:      f32,
        radius:        f32,
        angle:         f32,
        angular_speed: f32,
        size:          f32,
        color:         ColorClass,
    ) -> Self {
        Particle {
            x: center_x + angle.cos() * radius,
            y: center_y + angle.sin() * radius,
            angle,
            radius,
            angular_speed,
            size,
            color,
        }
    }

    /// Override the starting position (the orbit itself is unchanged).
    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn x(&self)              -> f32        { self.x }
    pub fn y(&self)              -> f32        { self.y }
    pub fn position(&self)       -> (f32, f32) { (self.x, self.y) }
    pub fn orbital_angle(&self)  -> f32        { self.angle }
    pub fn orbital_radius(&self) -> f32        { self.radius }
    pub fn angular_speed(&self)  -> f32        { self.angular_speed }
    pub fn size(&self)           -> f32        { self.size }
    pub fn color_class(&self)    -> ColorClass { self.color }

    /// Where this particle is being pulled to, given its current angle.
    pub fn orbital_target(&self, scale: f32, center_x: f32, center_y: f32) -> (f32, f32) {
        let r = target_radius(self.radius, scale);
        (center_x + self.angle.cos() * r, center_y + self.angle.sin() * r)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// FieldConfig
// ════════════════════════════════════════════════════════════════════════════

/// Parameters of the particle pool.  Loaded from the `[field]` table of the
/// application config.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    /// Number of particles in the pool.
    pub count:     usize,
    /// Smallest and largest particle size (pixels).
    pub min_size:  f32,
    pub max_size:  f32,
    /// Band for the magnitude of the angular speed (radians per tick).
    /// The sign is chosen at random per particle.
    pub min_speed: f32,
    pub max_speed: f32,
}

impl Default for FieldConfig {
    fn default() -> Self {
        FieldConfig {
            count:     DEFAULT_PARTICLE_COUNT,
            min_size:  0.5,
            max_size:  2.5,
            min_speed: 0.005,
            max_speed: 0.025,
        }
    }
}

impl FieldConfig {
    /// Returns a description of the first inconsistency found, if any.
    pub fn problem(&self) -> Option<String> {
        if self.count == 0 {
            return Some("field.count must be at least 1".to_string());
        }
        let finite = [self.min_size, self.max_size, self.min_speed, self.max_speed]
            .iter()
            .all(|v| v.is_finite());
        if !finite {
            return Some("field sizes and speeds must be finite".to_string());
        }
        if self.min_size < 0.0 || self.min_size > self.max_size {
            return Some(format!(
                "field size band [{}, {}] is empty or negative",
                self.min_size, self.max_size
            ));
        }
        if self.min_speed < 0.0 || self.min_speed > self.max_speed {
            return Some(format!(
                "field speed band [{}, {}] is empty or negative",
                self.min_speed, self.max_speed
            ));
        }
        None
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ParticleField: the simulator
// ════════════════════════════════════════════════════════════════════════════

/// Owns the particle pool and the jitter RNG.
#[derive(Debug)]
pub struct ParticleField {
    particles: Vec<Particle>,
    rng:       StdRng,
}

impl ParticleField {
    /// Create a pool of `config.count` particles for a `width` × `height`
    /// canvas.  The same seed always yields the same pool and jitter.
    pub fn new(config: &FieldConfig, width: f32, height: f32, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let (cx, cy) = (width * 0.5, height * 0.5);
        let max_radius = width.min(height).max(0.0) / RADIUS_DIVISOR;

        let particles = (0..config.count)
            .map(|_| {
                let radius = rng.gen::<f32>() * max_radius;
                let angle  = rng.gen::<f32>() * TAU;
                let speed  = sample(&mut rng, config.min_speed, config.max_speed);
                let speed  = if rng.gen_bool(0.5) { speed } else { -speed };
                let size   = sample(&mut rng, config.min_size, config.max_size);
                let color  = ColorClass::all()[rng.gen_range(0..4)];
                Particle::new(cx, cy, radius, angle, speed, size, color)
            })
            .collect::<Vec<_>>();

        debug!(
            "particle field: {} particles, max orbit {:.1}px, seed {}",
            particles.len(), max_radius, seed
        );

        ParticleField { particles, rng }
    }

    /// Wrap an explicit pool.  Mostly useful for tests and tooling.
    pub fn from_particles(particles: Vec<Particle>, seed: u64) -> Self {
        ParticleField { particles, rng: StdRng::seed_from_u64(seed) }
    }

    /// Advance every particle by one frame.
    ///
    /// # Panics
    ///
    /// If `width` or `height` is negative or not finite.  The control values
    /// are already guaranteed to be in range by [`ControlSignal`].
    pub fn tick(&mut self, signal: &ControlSignal, width: f32, height: f32) {
        assert!(
            width.is_finite() && height.is_finite() && width >= 0.0 && height >= 0.0,
            "canvas extent must be finite and non-negative, got {}×{}",
            width, height
        );
        let chaos = signal.chaos();
        let scale = signal.scale();
        debug_assert!((0.0..=1.0).contains(&chaos) && (0.0..=1.0).contains(&scale));

        let (cx, cy) = (width * 0.5, height * 0.5);
        let jitter   = jitter_magnitude(chaos);
        let rng      = &mut self.rng;

        for p in self.particles.iter_mut() {
            p.angle += angular_step(p.angular_speed, chaos);

            let r  = target_radius(p.radius, scale);
            let tx = cx + p.angle.cos() * r;
            let ty = cy + p.angle.sin() * r;

            p.x += (tx - p.x) * SPRING;
            p.y += (ty - p.y) * SPRING;

            if jitter > 0.0 {
                p.x += rng.gen_range(-0.5..=0.5) * jitter;
                p.y += rng.gen_range(-0.5..=0.5) * jitter;
            }
        }
    }

    /// Read-only view of the pool for the renderer.
    pub fn particles(&self) -> &[Particle] { &self.particles }

    pub fn len(&self)      -> usize { self.particles.len() }
    pub fn is_empty(&self) -> bool  { self.particles.is_empty() }

    /// Summary numbers used by tooling and tests.
    pub fn stats(&self, scale: f32, width: f32, height: f32) -> FieldStats {
        let (cx, cy) = (width * 0.5, height * 0.5);
        let n = self.particles.len().max(1) as f32;

        let mut sum_radius = 0.0_f32;
        let mut max_radius = 0.0_f32;
        let mut sum_lag    = 0.0_f32;
        let mut finite     = true;

        for p in &self.particles {
            finite &= p.x.is_finite() && p.y.is_finite();
            let r = (p.x - cx).hypot(p.y - cy);
            sum_radius += r;
            max_radius = max_radius.max(r);
            let (tx, ty) = p.orbital_target(scale, cx, cy);
            sum_lag += (tx - p.x).hypot(ty - p.y);
        }

        FieldStats {
            mean_radius: sum_radius / n,
            max_radius,
            mean_lag:    sum_lag / n,
            all_finite:  finite,
        }
    }
}

/// Aggregate state of the field at one instant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FieldStats {
    /// Mean distance of particles from the canvas centre.
    pub mean_radius: f32,
    pub max_radius:  f32,
    /// Mean distance between particles and their orbital targets.
    pub mean_lag:    f32,
    pub all_finite:  bool,
}

fn sample(rng: &mut StdRng, lo: f32, hi: f32) -> f32 {
    if hi > lo { rng.gen_range(lo..hi) } else { lo }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-4;

    fn one(radius: f32, speed: f32) -> ParticleField {
        let p = Particle::new(200.0, 150.0, radius, 0.0, speed, 1.0, ColorClass::Cyan);
        ParticleField::from_particles(vec![p], 1)
    }

    #[test]
    fn signal_clamps_and_scrubs_nan() {
        let s = ControlSignal::new(1.7, -0.3, true);
        assert_eq!(s.chaos(), 1.0);
        assert_eq!(s.scale(), 0.0);
        let n = ControlSignal::new(f32::NAN, 0.4, false);
        assert_eq!(n.chaos(), 0.0);
        assert_eq!(n.scale(), 0.4);
    }

    #[test]
    fn signal_defaults() {
        let s = ControlSignal::default();
        assert_eq!(s.chaos(), 0.1);
        assert_eq!(s.scale(), 0.5);
        assert!(!s.is_active());
    }

    #[test]
    fn idle_keeps_values() {
        let s = ControlSignal::new(0.7, 0.2, true).idle();
        assert!(!s.is_active());
        assert_eq!((s.chaos(), s.scale()), (0.7, 0.2));
    }

    #[test]
    fn target_radius_endpoints() {
        assert!((target_radius(100.0, 0.0) - 10.0).abs() < EPS);
        assert!((target_radius(100.0, 1.0) - 160.0).abs() < EPS);
    }

    #[test]
    fn tick_uses_mapping_functions() {
        let mut f = one(100.0, 0.02);
        f.tick(&ControlSignal::new(0.0, 0.3, true), 400.0, 300.0);
        let p = f.particles()[0];
        let a = angular_step(0.02, 0.0);
        let r = target_radius(100.0, 0.3);
        assert!((p.orbital_angle() - a).abs() < 1e-6);
        assert!((p.x() - (300.0 + (200.0 + a.cos() * r - 300.0) * SPRING)).abs() < EPS);
        assert!((p.y() - (150.0 + (150.0 + a.sin() * r - 150.0) * SPRING)).abs() < EPS);

        let mut g = one(100.0, 0.02);
        g.tick(&ControlSignal::new(0.5, 0.3, true), 400.0, 300.0);
        assert!((g.particles()[0].orbital_angle() - angular_step(0.02, 0.5)).abs() < 1e-6);
    }

    #[test]
    fn target_radius_monotone_in_scale() {
        let mut prev = target_radius(80.0, 0.0);
        for i in 1..=100 {
            let r = target_radius(80.0, i as f32 / 100.0);
            assert!(r >= prev, "radius shrank at scale {}", i);
            prev = r;
        }
    }

    #[test]
    fn jitter_is_linear_in_chaos() {
        assert_eq!(jitter_magnitude(0.0), 0.0);
        assert!((jitter_magnitude(1.0) - 5.0).abs() < EPS);
        assert!((jitter_magnitude(0.5) - 2.5).abs() < EPS);
    }

    #[test]
    fn angular_step_scaling() {
        assert_eq!(angular_step(0.02, 0.0), 0.02);
        assert!((angular_step(0.02, 1.0) - 0.06).abs() < 1e-7);
    }

    #[test]
    fn tick_advances_angle_by_step() {
        let mut f = one(50.0, 0.01);
        f.tick(&ControlSignal::new(0.0, 0.5, true), 400.0, 300.0);
        assert!((f.particles()[0].orbital_angle() - 0.01).abs() < 1e-7);

        let mut f = one(50.0, -0.01);
        f.tick(&ControlSignal::new(1.0, 0.5, true), 400.0, 300.0);
        assert!((f.particles()[0].orbital_angle() + 0.03).abs() < 1e-6);
    }

    #[test]
    fn tick_moves_ten_percent_toward_target() {
        let p = Particle::new(200.0, 150.0, 50.0, 0.0, 0.0, 1.0, ColorClass::Gold)
            .at(200.0, 150.0);
        let mut f = ParticleField::from_particles(vec![p], 3);
        f.tick(&ControlSignal::new(0.0, 1.0, true), 400.0, 300.0);
        // target is (200 + 80, 150); 10% of 80 is 8
        let (x, y) = f.particles()[0].position();
        assert!((x - 208.0).abs() < EPS);
        assert!((y - 150.0).abs() < EPS);
    }

    #[test]
    fn immutable_attributes_survive_ticks() {
        let mut f = ParticleField::new(&FieldConfig::default(), 640.0, 480.0, 11);
        let before: Vec<_> = f.particles().iter()
            .map(|p| (p.orbital_radius(), p.angular_speed(), p.size(), p.color_class()))
            .collect();
        let s = ControlSignal::new(0.9, 0.9, true);
        for _ in 0..50 { f.tick(&s, 640.0, 480.0); }
        let after: Vec<_> = f.particles().iter()
            .map(|p| (p.orbital_radius(), p.angular_speed(), p.size(), p.color_class()))
            .collect();
        assert_eq!(before, after);
        assert_eq!(f.len(), 800);
    }

    #[test]
    fn pool_respects_config_bands() {
        let cfg = FieldConfig { count: 300, ..FieldConfig::default() };
        let f = ParticleField::new(&cfg, 900.0, 600.0, 5);
        assert_eq!(f.len(), 300);
        for p in f.particles() {
            assert!(p.orbital_radius() >= 0.0 && p.orbital_radius() <= 200.0);
            let s = p.angular_speed().abs();
            assert!(s >= cfg.min_speed && s <= cfg.max_speed);
            assert!(p.size() >= cfg.min_size && p.size() <= cfg.max_size);
        }
        assert!(f.particles().iter().any(|p| p.angular_speed() > 0.0));
        assert!(f.particles().iter().any(|p| p.angular_speed() < 0.0));
    }

    #[test]
    fn same_seed_same_pool() {
        let a = ParticleField::new(&FieldConfig::default(), 500.0, 500.0, 42);
        let b = ParticleField::new(&FieldConfig::default(), 500.0, 500.0, 42);
        assert_eq!(a.particles(), b.particles());
    }

    #[test]
    fn jitter_stays_within_half_window() {
        let p = Particle::new(200.0, 150.0, 0.0, 0.0, 0.0, 1.0, ColorClass::White);
        let mut f = ParticleField::from_particles(vec![p], 9);
        // zero radius: target is the centre, spring step is 0 from there
        for _ in 0..200 {
            let (x0, y0) = f.particles()[0].position();
            f.tick(&ControlSignal::new(1.0, 0.5, true), 400.0, 300.0);
            let (x1, y1) = f.particles()[0].position();
            let ex = x0 + (200.0 - x0) * SPRING;
            let ey = y0 + (150.0 - y0) * SPRING;
            assert!((x1 - ex).abs() <= 2.5 + EPS);
            assert!((y1 - ey).abs() <= 2.5 + EPS);
        }
    }

    #[test]
    fn config_problem_detection() {
        assert!(FieldConfig::default().problem().is_none());
        assert!(FieldConfig { count: 0, ..FieldConfig::default() }.problem().is_some());
        assert!(FieldConfig { min_size: 3.0, max_size: 1.0, ..FieldConfig::default() }
            .problem().is_some());
        assert!(FieldConfig { max_speed: f32::INFINITY, ..FieldConfig::default() }
            .problem().is_some());
    }

    #[test]
    #[should_panic]
    fn negative_extent_is_fatal() {
        let mut f = one(10.0, 0.01);
        f.tick(&ControlSignal::default(), -1.0, 300.0);
    }
}
