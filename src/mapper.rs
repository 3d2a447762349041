use crate::camera::CameraState;
use crate::config::Policy;
use crate::fractal::Vec2;
use crate::signal::{map, Conditioned};
use std::f32::consts::PI;
use std::time::{Duration, Instant};

/// Immediate fractal control parameters, recomputed every frame from the
/// conditioned signal. Not accumulated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FractalParams {
    pub depth: u32,
    pub angle: f32,
    pub length: f32,
    pub hue: f32,
}

impl Default for FractalParams {
    fn default() -> Self {
        Self {
            depth: 0,
            angle: PI / 6.0,
            length: 120.0,
            hue: 0.0,
        }
    }
}

/// Per-variant numeric knobs. The shapes want different ranges for most
/// of these, so every one is configuration rather than law.
#[derive(Debug, Clone, Copy)]
pub struct Tuning {
    pub depth_min: f32,
    pub depth_max: f32,
    pub angle_min: f32,
    pub angle_max: f32,
    pub length_min: f32,
    pub length_max: f32,
    pub hue_rate: f32,
    pub zoom_gain: f32,
    pub zoom_floor: f32,
    pub zoom_ceiling: f32,
    pub idle_decay: f32,
    pub step_growth: f32,
    pub step_initial_threshold: f32,
    pub step_debounce: Duration,
    pub inside_zoom: f32,
    pub inside_offset: Vec2,
    pub neutral_depth: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            depth_min: 3.0,
            depth_max: 10.0,
            angle_min: PI / 12.0,
            angle_max: PI / 3.0,
            length_min: 60.0,
            length_max: 180.0,
            hue_rate: 2.4,
            zoom_gain: 0.05,
            zoom_floor: 1.0,
            zoom_ceiling: 64.0,
            idle_decay: 0.01,
            step_growth: 1.8,
            step_initial_threshold: 1.8,
            step_debounce: Duration::from_millis(900),
            inside_zoom: 24.0,
            inside_offset: Vec2 { x: 40.0, y: -30.0 },
            neutral_depth: 3.0,
        }
    }
}

/// Maps conditioned signals onto fractal parameters and camera targets,
/// according to the selected navigation policy.
pub struct ParamMapper {
    policy: Policy,
    tuning: Tuning,
    params: FractalParams,
    hue_target: f32,
    color_boost: bool,
    was_active: bool,
    zoom_avg: f32,
    step_threshold: f32,
    last_step: Option<Instant>,
}

impl ParamMapper {
    pub fn new(policy: Policy, tuning: Tuning) -> Self {
        Self {
            policy,
            step_threshold: tuning.step_initial_threshold,
            tuning,
            params: FractalParams::default(),
            hue_target: 0.0,
            color_boost: false,
            was_active: false,
            zoom_avg: 1.0,
            last_step: None,
        }
    }

    pub fn policy(&self) -> Policy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: Policy) {
        self.policy = policy;
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn params(&self) -> FractalParams {
        self.params
    }

    pub fn color_boost(&self) -> bool {
        self.color_boost
    }

    pub fn reset(&mut self) {
        self.params = FractalParams::default();
        self.hue_target = 0.0;
        self.color_boost = false;
        self.was_active = false;
        self.zoom_avg = 1.0;
        self.step_threshold = self.tuning.step_initial_threshold;
        self.last_step = None;
    }

    pub fn update(&mut self, sig: &Conditioned, camera: &mut CameraState, now: Instant) {
        let t = self.tuning;

        // Color boost follows the activity edges, no smoothing.
        if sig.active != self.was_active {
            self.color_boost = sig.active;
            self.was_active = sig.active;
        }

        // Immediate parameters; depth truncates rather than rounds.
        self.params.depth = map(sig.level, 0.0, 1.0, t.depth_min, t.depth_max, true) as u32;
        self.params.angle = map(sig.bands[0], 0.0, 1.0, t.angle_min, t.angle_max, true);
        self.params.length = map(sig.bands[1], 0.0, 1.0, t.length_min, t.length_max, true);
        if sig.active {
            let inc = t.hue_rate * (0.25 + sig.level);
            self.hue_target = (self.hue_target + inc).rem_euclid(360.0);
        }
        self.params.hue = self.hue_target;

        match self.policy {
            Policy::Continuous => self.drive_continuous(sig, camera),
            Policy::Stepped => self.drive_stepped(sig, camera, now),
            Policy::Bidirectional => self.drive_bidirectional(sig, camera),
        }

        // Targets are always clamped before the interpolator sees them.
        camera.target_zoom = camera.target_zoom.clamp(t.zoom_floor, t.zoom_ceiling);
        camera.target_depth = camera.target_depth.clamp(0.0, t.depth_max);
    }

    fn drive_continuous(&mut self, sig: &Conditioned, camera: &mut CameraState) {
        let t = &self.tuning;
        if sig.active {
            camera.target_zoom += t.zoom_gain * sig.level;
        } else {
            camera.target_zoom += (t.zoom_floor - camera.target_zoom) * t.idle_decay;
        }
        camera.target_depth = map(sig.level, 0.0, 1.0, t.depth_min, t.depth_max, true);
    }

    fn drive_stepped(&mut self, sig: &Conditioned, camera: &mut CameraState, now: Instant) {
        let t = &self.tuning;
        if sig.active {
            camera.target_zoom += t.zoom_gain * sig.level;
        }

        self.zoom_avg = self.zoom_avg * 0.9 + camera.zoom * 0.1;

        let debounced = match self.last_step {
            Some(prev) => now.duration_since(prev) >= t.step_debounce,
            None => true,
        };
        if self.zoom_avg > self.step_threshold && debounced {
            camera.target_depth = (camera.target_depth + 1.0).min(t.depth_max);
            // Geometrically spaced level-up events.
            self.step_threshold *= t.step_growth;
            self.last_step = Some(now);
        }
    }

    fn drive_bidirectional(&mut self, sig: &Conditioned, camera: &mut CameraState) {
        let t = &self.tuning;
        if sig.active {
            camera.target_zoom = t.inside_zoom;
            camera.target_offset = t.inside_offset;
            camera.target_depth = t.depth_max;
        } else {
            camera.target_zoom = t.zoom_floor;
            camera.target_offset = Vec2::ZERO;
            camera.target_depth = t.neutral_depth;
        }
    }
}
