mod dragon;
mod tree;
mod triangle;

pub use dragon::{DragonCurve, FoldPhase};
pub use tree::TreeFractal;
pub use triangle::SierpinskiTriangle;

use crate::camera::CameraState;
use crate::mapper::FractalParams;
use crate::signal::Conditioned;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn rotated_around(self, pivot: Vec2, angle: f32) -> Self {
        let (sin, cos) = angle.sin_cos();
        let dx = self.x - pivot.x;
        let dy = self.y - pivot.y;
        Self {
            x: pivot.x + dx * cos - dy * sin,
            y: pivot.y + dx * sin + dy * cos,
        }
    }
}

/// Hue/saturation/brightness/alpha color (ranges 360/100/100/100).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsba {
    pub h: f32,
    pub s: f32,
    pub b: f32,
    pub a: f32,
}

impl Hsba {
    pub fn new(h: f32, s: f32, b: f32, a: f32) -> Self {
        Self {
            h: h.rem_euclid(360.0),
            s: s.clamp(0.0, 100.0),
            b: b.clamp(0.0, 100.0),
            a: a.clamp(0.0, 100.0),
        }
    }

    /// HSB -> RGB, 8-bit channels. Alpha is returned as 0..255 separately.
    pub fn to_rgba8(self) -> (u8, u8, u8, u8) {
        let h = self.h.rem_euclid(360.0) / 60.0;
        let s = self.s / 100.0;
        let v = self.b / 100.0;

        let c = v * s;
        let x = c * (1.0 - (h % 2.0 - 1.0).abs());
        let m = v - c;
        let (r, g, b) = match h as u32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };
        (
            ((r + m) * 255.0).round() as u8,
            ((g + m) * 255.0).round() as u8,
            ((b + m) * 255.0).round() as u8,
            (self.a / 100.0 * 255.0).round() as u8,
        )
    }
}

/// Drawing collaborator seam. The pixel canvas rasterizes these calls;
/// tests substitute a recording target.
pub trait DrawTarget {
    fn line(&mut self, a: Vec2, b: Vec2, color: Hsba, weight: f32);
    fn fill_triangle(&mut self, a: Vec2, b: Vec2, c: Vec2, color: Hsba);
    fn ellipse(&mut self, center: Vec2, rx: f32, ry: f32, color: Hsba);

    fn polyline(&mut self, pts: &[Vec2], color: Hsba, weight: f32) {
        for pair in pts.windows(2) {
            self.line(pair[0], pair[1], color, weight);
        }
    }
}

/// Screen rectangle expanded by a margin; geometry whose transformed
/// vertices all fall outside is culled before recursing.
#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    pub w: f32,
    pub h: f32,
    pub margin: f32,
}

impl Viewport {
    pub fn new(w: f32, h: f32) -> Self {
        Self { w, h, margin: 150.0 }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.w * 0.5, self.h * 0.5)
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= -self.margin
            && p.x <= self.w + self.margin
            && p.y >= -self.margin
            && p.y <= self.h + self.margin
    }

    pub fn all_outside(&self, pts: &[Vec2]) -> bool {
        pts.iter().all(|&p| !self.contains(p))
    }
}

/// Everything an engine needs for one frame. Built by the frame loop; the
/// single mutable state object never crosses threads.
pub struct FrameInput {
    pub now: Instant,
    pub dt: f32,
    pub params: FractalParams,
    pub camera: CameraState,
    pub signal: Conditioned,
    pub viewport: Viewport,
    pub color_boost: bool,
}

pub trait Geometry {
    fn name(&self) -> &'static str;
    /// Advance internal state (dragon fold machine; no-op for the
    /// analytic shapes).
    fn update(&mut self, input: &FrameInput);
    fn render(&mut self, input: &FrameInput, out: &mut dyn DrawTarget);
    /// Restore documented defaults; runs at a frame boundary.
    fn reset(&mut self);
    /// Depth or iteration count for the HUD.
    fn detail(&self) -> u32;
}

/// Depth-graded stroke color: saturation 30->100, brightness 80->60,
/// alpha 100->80 as depth runs 0->max.
pub(crate) fn depth_color(hue: f32, depth: u32, max_depth: u32, boost: bool) -> Hsba {
    use crate::signal::map;
    let d = depth as f32;
    let m = max_depth.max(1) as f32;
    let s = map(d, 0.0, m, 30.0, 100.0, true);
    let b = map(d, 0.0, m, 80.0, 60.0, true);
    let a = map(d, 0.0, m, 100.0, 80.0, true);
    let s = if boost { (s + 20.0).min(100.0) } else { s };
    Hsba::new(hue, s, b, a)
}
