//! Software-rendered visualizer using `minifb`.
//!
//! Layout:
//!
//! ```text
//! ┌──────────────────────┬──────────────────────────┬──────────────────┐
//! │ CHAOS [█████░░░] 42% │                          │  FIELD ANALYSIS  │
//! │ SCALE [███░░░░░] 31% │    NO HANDS DETECTED     │  wrapped text…   │
//! ├──────────────────────┘     (only while idle)    └──────────────────┤
//! │                                                                    │
//! │                   particles with fading trails                     │
//! │                                                                    │
//! │  status bar                                                        │
//! │  key legend                                                        │
//! └────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Drawing goes through [`Canvas`], a plain pixel buffer, so everything but
//! the window itself can be exercised without a display.

use std::sync::mpsc::Sender;
use std::time::Duration;

use minifb::{Key, KeyRepeat, Window, WindowOptions};
use particle_field::Particle;

use crate::app::AppState;
use crate::config::WindowConfig;
use crate::detector::{SimInput, SimKey};
use crate::error::AppError;
use crate::palette::{blend, class_color, fade_buffer, trail_fade, BG_COLOR};

// ════════════════════════════════════════════════════════════════════════════
// Layout constants
// ════════════════════════════════════════════════════════════════════════════

const MARGIN:        usize = 12;
const HUD_W:         usize = 236;
const HUD_H:         usize = 64;
const BAR_X:         usize = MARGIN + 70;
const BAR_W:         usize = 110;
const BAR_H:         usize = 10;
const PANEL_MAX_W:   usize = 380;
const STATUS_H:      usize = 24;
const HUD_BG:        u32   = 0xFF11112A;
const BAR_BG:        u32   = 0xFF2A2A48;
const CHAOS_COLOR:   u32   = 0xFFF472B6;
const SCALE_COLOR:   u32   = 0xFF22D3EE;
const BANNER_COLOR:  u32   = 0xFFFACC15;
const TEXT_BG:       u32   = 0xFF0F1A3C;
const TEXT_COLOR:    u32   = 0xFFEEEEEE;
const DIM_COLOR:     u32   = 0xFF888888;

const LEGEND: &str = "1/2=show hand  W/S=left pinch  Up/Down=right pinch  Space=analyze  Q/Esc=quit";

// ════════════════════════════════════════════════════════════════════════════
// FrameInput: what the window asked for this frame
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameInput {
    pub quit:    bool,
    pub analyze: bool,
}

// ════════════════════════════════════════════════════════════════════════════
// Visualizer
// ════════════════════════════════════════════════════════════════════════════

pub struct Visualizer {
    window: Window,
    canvas: Canvas,
    /// Keyboard events for the simulated detector; `None` with a real one.
    sim_tx: Option<Sender<SimInput>>,
}

impl Visualizer {
    pub fn new(cfg: &WindowConfig, sim_tx: Option<Sender<SimInput>>) -> Result<Self, AppError> {
        let mut window = Window::new(
            "Gesture Field",
            cfg.width, cfg.height,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        )?;

        window.limit_update_rate(Some(Duration::from_micros(1_000_000 / cfg.fps.max(1) as u64)));

        Ok(Visualizer {
            window,
            canvas: Canvas::new(cfg.width, cfg.height),
            sim_tx,
        })
    }

    pub fn is_open(&self) -> bool { self.window.is_open() }

    /// Read the keyboard.  Hand keys go to the simulated detector.
    pub fn poll_input(&mut self) -> FrameInput {
        let mut input = FrameInput::default();
        if !self.window.is_open() {
            input.quit = true;
            return input;
        }

        let one_shot = |k: Key| self.window.is_key_pressed(k, KeyRepeat::No);
        let held     = |k: Key| self.window.is_key_pressed(k, KeyRepeat::Yes);

        if one_shot(Key::Q) || one_shot(Key::Escape) {
            input.quit = true;
        }
        if one_shot(Key::Space) {
            input.analyze = true;
        }

        let mut keys = Vec::new();
        if one_shot(Key::Key1) { keys.push(SimKey::ToggleLeft);  }
        if one_shot(Key::Key2) { keys.push(SimKey::ToggleRight); }
        if held(Key::W)        { keys.push(SimKey::OpenLeft);    }
        if held(Key::S)        { keys.push(SimKey::CloseLeft);   }
        if held(Key::Up)       { keys.push(SimKey::OpenRight);   }
        if held(Key::Down)     { keys.push(SimKey::CloseRight);  }

        if let Some(tx) = &self.sim_tx {
            for key in keys {
                let _ = tx.send(SimInput::KeyDown(key));
            }
        }

        input
    }

    /// Render one frame.
    pub fn render(&mut self, app: &AppState) -> Result<(), AppError> {
        self.canvas.draw_frame(app);
        self.window
            .update_with_buffer(&self.canvas.buf, self.canvas.width, self.canvas.height)?;
        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Canvas: the pixel buffer and everything drawn into it
// ════════════════════════════════════════════════════════════════════════════

pub struct Canvas {
    pub buf:    Vec<u32>,
    pub width:  usize,
    pub height: usize,
}

impl Canvas {
    pub fn new(width: usize, height: usize) -> Self {
        Canvas { buf: vec![BG_COLOR; width * height], width, height }
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<u32> {
        (x < self.width && y < self.height).then(|| self.buf[y * self.width + x])
    }

    /// Everything for one frame, on top of the faded previous one.
    pub fn draw_frame(&mut self, app: &AppState) {
        let signal = app.signal();

        fade_buffer(&mut self.buf, trail_fade(signal.chaos()));
        self.draw_particles(app.particles());

        // ── HUD ───────────────────────────────────────────────────────────
        self.draw_gauges(app.chaos_gauge(), app.scale_gauge());
        if !signal.is_active() {
            self.draw_banner("NO HANDS DETECTED");
        }
        if app.analysis_pending() || app.analysis().is_some() {
            let text = match (app.analysis(), app.analysis_pending()) {
                (_, true)        => "ANALYZING...",
                (Some(t), false) => t,
                (None, false)    => "",
            };
            self.draw_analysis_panel(text);
        }

        // ── Status bar ────────────────────────────────────────────────────
        let status_y = self.height.saturating_sub(STATUS_H + 16);
        self.fill_rect(0, status_y, self.width, STATUS_H, TEXT_BG);
        self.draw_label(app.status(), MARGIN, status_y + 7, TEXT_COLOR, 2);

        // ── Key legend ────────────────────────────────────────────────────
        let legend_y = self.height.saturating_sub(11);
        self.fill_rect(0, legend_y.saturating_sub(3), self.width, 14, BG_COLOR);
        self.draw_label(LEGEND, MARGIN, legend_y, DIM_COLOR, 1);
    }

    // ── Particles ─────────────────────────────────────────────────────────

    pub fn draw_particles(&mut self, particles: &[Particle]) {
        for p in particles {
            let (x, y) = p.position();
            if !(x.is_finite() && y.is_finite()) { continue; }
            let side = p.size().round().max(1.0) as isize;
            let x0 = x.round() as isize - side / 2;
            let y0 = y.round() as isize - side / 2;
            if x0 + side <= 0 || y0 + side <= 0 { continue; }
            if x0 >= self.width as isize || y0 >= self.height as isize { continue; }
            let color = class_color(p.color_class());
            for dy in 0..side {
                for dx in 0..side {
                    let (px, py) = (x0 + dx, y0 + dy);
                    if px >= 0 && py >= 0 {
                        self.set_pixel(px as usize, py as usize, color);
                    }
                }
            }
        }
    }

    // ── HUD pieces ────────────────────────────────────────────────────────

    fn draw_gauges(&mut self, chaos: f32, scale: f32) {
        self.fill_rect(MARGIN, MARGIN, HUD_W, HUD_H, HUD_BG);
        self.draw_border(MARGIN, MARGIN, HUD_W, HUD_H, BAR_BG);
        self.draw_bar("CHAOS", chaos, MARGIN + 14, CHAOS_COLOR);
        self.draw_bar("SCALE", scale, MARGIN + 38, SCALE_COLOR);
    }

    fn draw_bar(&mut self, label: &str, value: f32, y: usize, color: u32) {
        let value = value.clamp(0.0, 1.0);
        self.draw_label(label, MARGIN + 10, y, TEXT_COLOR, 2);
        self.fill_rect(BAR_X, y, BAR_W, BAR_H, BAR_BG);
        let filled = (BAR_W as f32 * value).round() as usize;
        self.fill_rect(BAR_X, y, filled, BAR_H, color);
        let pct = format!("{:>3}%", (value * 100.0).round() as u32);
        self.draw_label(&pct, BAR_X + BAR_W + 8, y + 2, TEXT_COLOR, 1);
    }

    fn draw_banner(&mut self, text: &str) {
        let scale = 3;
        let w = text_width(text, scale);
        let x = self.width.saturating_sub(w) / 2;
        let y = MARGIN + HUD_H + 24;
        self.fill_rect(x.saturating_sub(10), y.saturating_sub(8), w + 20, 15 + 16, HUD_BG);
        self.draw_label(text, x, y, BANNER_COLOR, scale);
    }

    fn draw_analysis_panel(&mut self, text: &str) {
        let panel_w = PANEL_MAX_W.min(self.width / 2);
        let cols    = panel_w.saturating_sub(20) / 8;
        let lines   = wrap_text(text, cols.max(1));
        let panel_h = 32 + lines.len() * 14;
        let x = self.width.saturating_sub(panel_w + MARGIN);

        self.fill_rect(x, MARGIN, panel_w, panel_h, HUD_BG);
        self.draw_border(x, MARGIN, panel_w, panel_h, blend(HUD_BG, TEXT_COLOR, 0.3));
        self.draw_label("FIELD ANALYSIS", x + 10, MARGIN + 8, BANNER_COLOR, 2);
        for (i, line) in lines.iter().enumerate() {
            self.draw_label(line, x + 10, MARGIN + 28 + i * 14, TEXT_COLOR, 2);
        }
    }

    // ── Primitive drawing helpers ─────────────────────────────────────────

    pub fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        for row in y..(y + h).min(self.height) {
            for col in x..(x + w).min(self.width) {
                self.buf[row * self.width + col] = color;
            }
        }
    }

    fn draw_border(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        if w == 0 || h == 0 { return; }
        for col in x..(x + w).min(self.width) {
            self.set_pixel(col, y, color);
            self.set_pixel(col, y + h - 1, color);
        }
        for row in y..(y + h).min(self.height) {
            self.set_pixel(x, row, color);
            self.set_pixel(x + w - 1, row, color);
        }
    }

    fn set_pixel(&mut self, x: usize, y: usize, color: u32) {
        if x < self.width && y < self.height {
            self.buf[y * self.width + x] = color;
        }
    }

    /// 3×5 bitmap font, each dot drawn as a `scale`×`scale` block.
    pub fn draw_label(&mut self, text: &str, x: usize, y: usize, color: u32, scale: usize) {
        let mut cx = x;
        for ch in text.chars() {
            if cx + 3 * scale > self.width { break; }
            let glyph = char_glyph(ch);
            for (row, &bits) in glyph.iter().enumerate() {
                for col in 0..3usize {
                    if bits & (1 << (2 - col)) != 0 {
                        self.fill_rect(cx + col * scale, y + row * scale, scale, scale, color);
                    }
                }
            }
            cx += 4 * scale;
        }
    }
}

/// Pixel width of `text` at `scale`.
pub fn text_width(text: &str, scale: usize) -> usize {
    (text.chars().count() * 4 * scale).saturating_sub(scale)
}

/// Greedy word wrap to `cols` characters.  Words longer than a line are cut.
pub fn wrap_text(text: &str, cols: usize) -> Vec<String> {
    let cols = cols.max(1);
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();
            while word.len() > cols {
                if !line.is_empty() { lines.push(std::mem::take(&mut line)); }
                lines.push(word.drain(..cols).collect());
            }
            let len = line.chars().count();
            if len > 0 && len + 1 + word.len() > cols {
                lines.push(std::mem::take(&mut line));
            }
            if !line.is_empty() { line.push(' '); }
            line.extend(word);
        }
        if !line.is_empty() { lines.push(line); }
    }
    lines
}

// ────────────────────────────────────────────────────────────────────────────
// Minimal 3×5 bitmap font
// ────────────────────────────────────────────────────────────────────────────

fn char_glyph(c: char) -> [u8; 5] {
    match c {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        'a' | 'A' => [0b111, 0b101, 0b111, 0b101, 0b101],
        'b' | 'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'c' | 'C' => [0b111, 0b100, 0b100, 0b100, 0b111],
        'd' | 'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'e' | 'E' => [0b111, 0b100, 0b111, 0b100, 0b111],
        'f' | 'F' => [0b111, 0b100, 0b111, 0b100, 0b100],
        'g' | 'G' => [0b111, 0b100, 0b101, 0b101, 0b111],
        'h' | 'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'i' | 'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'j' | 'J' => [0b001, 0b001, 0b001, 0b101, 0b111],
        'k' | 'K' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'l' | 'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'm' | 'M' => [0b101, 0b111, 0b101, 0b101, 0b101],
        'n' | 'N' => [0b111, 0b101, 0b101, 0b101, 0b101],
        'o' | 'O' => [0b111, 0b101, 0b101, 0b101, 0b111],
        'p' | 'P' => [0b111, 0b101, 0b111, 0b100, 0b100],
        'q' | 'Q' => [0b111, 0b101, 0b101, 0b111, 0b001],
        'r' | 'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        's' | 'S' => [0b111, 0b100, 0b111, 0b001, 0b111],
        't' | 'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'u' | 'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'v' | 'V' => [0b101, 0b101, 0b101, 0b010, 0b010],
        'w' | 'W' => [0b101, 0b101, 0b101, 0b111, 0b101],
        'x' | 'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'y' | 'Y' => [0b101, 0b101, 0b111, 0b010, 0b010],
        'z' | 'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ',' => [0b000, 0b000, 0b000, 0b010, 0b100],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '=' => [0b000, 0b111, 0b000, 0b111, 0b000],
        '+' => [0b000, 0b010, 0b111, 0b010, 0b000],
        '%' => [0b101, 0b001, 0b010, 0b100, 0b101],
        '(' => [0b010, 0b100, 0b100, 0b100, 0b010],
        ')' => [0b010, 0b001, 0b001, 0b001, 0b010],
        '[' => [0b110, 0b100, 0b100, 0b100, 0b110],
        ']' => [0b011, 0b001, 0b001, 0b001, 0b011],
        '<' => [0b001, 0b010, 0b100, 0b010, 0b001],
        '>' => [0b100, 0b010, 0b001, 0b010, 0b100],
        '!' => [0b010, 0b010, 0b010, 0b000, 0b010],
        '?' => [0b111, 0b001, 0b011, 0b000, 0b010],
        '"' => [0b101, 0b101, 0b000, 0b000, 0b000],
        '\'' => [0b010, 0b010, 0b000, 0b000, 0b000],
        '_' => [0b000, 0b000, 0b000, 0b000, 0b111],
        '*' => [0b101, 0b010, 0b111, 0b010, 0b101],
        ' ' => [0b000, 0b000, 0b000, 0b000, 0b000],
        _   => [0b000, 0b000, 0b010, 0b000, 0b000], // fallback dot
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use particle_field::ColorClass;

    #[test]
    fn wrap_respects_width() {
        let lines = wrap_text("STATE: MAELSTROM / EXPANSE. Entropy at 95%", 12);
        assert!(lines.iter().all(|l| l.chars().count() <= 12));
        assert_eq!(lines.join(" "), "STATE: MAELSTROM / EXPANSE. Entropy at 95%");
    }

    #[test]
    fn wrap_cuts_long_words() {
        let lines = wrap_text("ABCDEFGHIJ", 4);
        assert_eq!(lines, vec!["ABCD", "EFGH", "IJ"]);
    }

    #[test]
    fn wrap_keeps_paragraphs() {
        assert_eq!(wrap_text("a b\nc", 40), vec!["a b", "c"]);
        assert!(wrap_text("", 10).is_empty());
    }

    #[test]
    fn text_width_counts_gaps() {
        assert_eq!(text_width("AB", 1), 7);
        assert_eq!(text_width("AB", 2), 14);
        assert_eq!(text_width("", 2), 0);
    }

    #[test]
    fn particle_drawn_in_its_class_color() {
        let mut c = Canvas::new(32, 32);
        let p = Particle::new(16.0, 16.0, 0.0, 0.0, 0.0, 1.0, ColorClass::Gold).at(10.0, 12.0);
        c.draw_particles(&[p]);
        assert_eq!(c.pixel(10, 12), Some(class_color(ColorClass::Gold)));
        assert_eq!(c.pixel(0, 0), Some(BG_COLOR));
    }

    #[test]
    fn offscreen_particles_are_skipped() {
        let mut c = Canvas::new(16, 16);
        let p = Particle::new(8.0, 8.0, 0.0, 0.0, 0.0, 2.5, ColorClass::Cyan).at(-40.0, 500.0);
        c.draw_particles(&[p]);
        assert!(c.buf.iter().all(|&px| px == BG_COLOR));
    }

    #[test]
    fn label_clips_at_edges() {
        let mut c = Canvas::new(20, 8);
        c.draw_label("WIDE LABEL TEXT", 2, 4, TEXT_COLOR, 2);
        assert_eq!(c.buf.len(), 20 * 8);
        assert!(c.buf.iter().any(|&px| px == TEXT_COLOR));
    }
}
