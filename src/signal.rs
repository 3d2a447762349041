use crate::audio::AudioSample;
use std::time::{Duration, Instant};

/// Linear range map. With `clamp` the output saturates at the
/// endpoints instead of extrapolating; a degenerate input range maps to
/// `out_min`.
pub fn map(v: f32, in_min: f32, in_max: f32, out_min: f32, out_max: f32, clamp: bool) -> f32 {
    let span = in_max - in_min;
    if span.abs() < f32::EPSILON {
        return out_min;
    }
    let t = (v - in_min) / span;
    let t = if clamp { t.clamp(0.0, 1.0) } else { t };
    out_min + (out_max - out_min) * t
}

/// Conditioned per-frame signal snapshot handed to the parameter mapper.
#[derive(Debug, Clone, Copy)]
pub struct Conditioned {
    pub level: f32,
    pub bands: [f32; 3],
    pub smoothed_level: f32,
    pub active: bool,
}

impl Default for Conditioned {
    fn default() -> Self {
        Self {
            level: 0.0,
            bands: [0.0; 3],
            smoothed_level: 0.0,
            active: false,
        }
    }
}

const WINDOW: usize = 10;

/// Normalizes raw sensor scalars into [0,1] and derives the boolean
/// activity state with silence-timeout hysteresis.
pub struct SignalConditioner {
    threshold: f32,
    silence_timeout: Duration,
    last_exceeded: Option<Instant>,
    window: [f32; WINDOW],
    window_len: usize,
    window_pos: usize,
}

impl SignalConditioner {
    pub fn new(threshold: f32, silence_timeout: Duration) -> Self {
        Self {
            threshold,
            silence_timeout,
            last_exceeded: None,
            window: [0.0; WINDOW],
            window_len: 0,
            window_pos: 0,
        }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn set_threshold(&mut self, threshold: f32) {
        self.threshold = threshold.clamp(0.0, 1.0);
    }

    pub fn reset(&mut self) {
        self.last_exceeded = None;
        self.window = [0.0; WINDOW];
        self.window_len = 0;
        self.window_pos = 0;
    }

    /// A failed sensor read (`None`) degrades to the zero sample rather
    /// than an error.
    pub fn condition(&mut self, sample: Option<AudioSample>, now: Instant) -> Conditioned {
        let raw = sample.unwrap_or_default();

        // Amplitude rarely exceeds ~0.5 on speech/music; treat that as
        // full scale, matching the sensor's useful range.
        let level = map(raw.level, 0.0, 0.5, 0.0, 1.0, true);
        let bands = [
            map(raw.bands[0], 0.0, 1.0, 0.0, 1.0, true),
            map(raw.bands[1], 0.0, 1.0, 0.0, 1.0, true),
            map(raw.bands[2], 0.0, 1.0, 0.0, 1.0, true),
        ];

        // Exactly at threshold counts as inactive.
        if level > self.threshold {
            self.last_exceeded = Some(now);
        }
        let active = match self.last_exceeded {
            Some(t) => now.duration_since(t) <= self.silence_timeout,
            None => false,
        };

        self.window[self.window_pos] = level;
        self.window_pos = (self.window_pos + 1) % WINDOW;
        if self.window_len < WINDOW {
            self.window_len += 1;
        }
        let smoothed_level =
            self.window[..self.window_len].iter().sum::<f32>() / self.window_len as f32;

        Conditioned {
            level,
            bands,
            smoothed_level,
            active,
        }
    }
}
