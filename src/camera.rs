use crate::fractal::Vec2;

pub const ZOOM_FLOOR: f32 = 0.1;

/// Smoothed camera/depth state. The mapper writes the `target_*` fields;
/// `step` advances the non-target fields toward them each frame.
#[derive(Debug, Clone, Copy)]
pub struct CameraState {
    pub zoom: f32,
    pub target_zoom: f32,
    pub offset: Vec2,
    pub target_offset: Vec2,
    pub depth: f32,
    pub target_depth: f32,
}

impl Default for CameraState {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            target_zoom: 1.0,
            offset: Vec2::ZERO,
            target_offset: Vec2::ZERO,
            depth: 0.0,
            target_depth: 0.0,
        }
    }
}

fn lerp_toward(current: f32, target: f32, rate: f32) -> f32 {
    current + (target - current) * rate
}

impl CameraState {
    /// Advance every field one smoothing step. `rate` is the base rate in
    /// (0,1]; `speed_factor` scales it up with signal strength but the
    /// effective rate never exceeds 1, so interpolation cannot overshoot.
    pub fn step(&mut self, rate: f32, speed_factor: f32) {
        let k = (rate * speed_factor.max(0.0)).clamp(0.0, 1.0);
        if k <= 0.0 {
            return;
        }
        self.zoom = lerp_toward(self.zoom, self.target_zoom, k).max(ZOOM_FLOOR);
        self.offset.x = lerp_toward(self.offset.x, self.target_offset.x, k);
        self.offset.y = lerp_toward(self.offset.y, self.target_offset.y, k);
        self.depth = lerp_toward(self.depth, self.target_depth, k);
    }

    /// Effective smoothing rate for a given signal level: stronger signal,
    /// faster convergence.
    pub fn rate_for_level(base_rate: f32, level: f32) -> f32 {
        (base_rate * (1.0 + 2.0 * level.clamp(0.0, 1.0))).clamp(0.0, 1.0)
    }

    /// Restore documented defaults exactly; targets follow so the
    /// interpolator is a no-op until the mapper writes new ones.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Screen-space transform: world point through zoom and pan around the
    /// given pivot (usually the canvas center).
    pub fn to_screen(&self, p: Vec2, pivot: Vec2) -> Vec2 {
        Vec2 {
            x: (p.x - pivot.x - self.offset.x) * self.zoom + pivot.x,
            y: (p.y - pivot.y - self.offset.y) * self.zoom + pivot.y,
        }
    }
}
