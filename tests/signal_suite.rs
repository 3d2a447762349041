use fractal_visualizer::audio::AudioSample;
use fractal_visualizer::signal::{map, SignalConditioner};
use std::time::{Duration, Instant};

fn sample(level: f32) -> Option<AudioSample> {
    Some(AudioSample {
        level,
        bands: [0.1, 0.2, 0.3],
    })
}

fn conditioner() -> SignalConditioner {
    SignalConditioner::new(0.02, Duration::from_millis(800))
}

// ── map ─────────────────────────────────────────────────────────────────────

#[test]
fn map_is_linear_on_the_interior() {
    assert_eq!(map(0.5, 0.0, 1.0, 0.0, 100.0, false), 50.0);
    assert_eq!(map(0.25, 0.0, 1.0, 10.0, 20.0, false), 12.5);
}

#[test]
fn map_clamps_when_asked() {
    assert_eq!(map(2.0, 0.0, 1.0, 0.0, 10.0, true), 10.0);
    assert_eq!(map(-1.0, 0.0, 1.0, 0.0, 10.0, true), 0.0);
}

#[test]
fn map_extrapolates_when_unclamped() {
    assert_eq!(map(2.0, 0.0, 1.0, 0.0, 10.0, false), 20.0);
    assert_eq!(map(-1.0, 0.0, 1.0, 0.0, 10.0, false), -10.0);
}

#[test]
fn map_handles_reversed_output_range() {
    // Depth-graded brightness runs 80 -> 60.
    assert_eq!(map(0.0, 0.0, 1.0, 80.0, 60.0, true), 80.0);
    assert_eq!(map(1.0, 0.0, 1.0, 80.0, 60.0, true), 60.0);
    assert_eq!(map(0.5, 0.0, 1.0, 80.0, 60.0, true), 70.0);
}

#[test]
fn map_degenerate_input_range_yields_out_min() {
    assert_eq!(map(5.0, 3.0, 3.0, 7.0, 9.0, true), 7.0);
    assert_eq!(map(5.0, 3.0, 3.0, 7.0, 9.0, false), 7.0);
}

// ── level normalization ─────────────────────────────────────────────────────

#[test]
fn half_scale_amplitude_maps_to_full_level() {
    let mut c = conditioner();
    let sig = c.condition(sample(0.5), Instant::now());
    assert_eq!(sig.level, 1.0);
}

#[test]
fn level_saturates_above_half_scale() {
    let mut c = conditioner();
    let sig = c.condition(sample(0.9), Instant::now());
    assert_eq!(sig.level, 1.0);
}

#[test]
fn level_stays_within_unit_range() {
    let mut c = conditioner();
    for raw in [-0.2f32, 0.0, 0.01, 0.25, 0.5, 3.0] {
        let sig = c.condition(sample(raw), Instant::now());
        assert!((0.0..=1.0).contains(&sig.level), "raw {raw} -> {}", sig.level);
    }
}

#[test]
fn missing_sample_degrades_to_silence() {
    let mut c = conditioner();
    let sig = c.condition(None, Instant::now());
    assert_eq!(sig.level, 0.0);
    assert_eq!(sig.bands, [0.0; 3]);
    assert!(!sig.active);
}

// ── activity threshold ──────────────────────────────────────────────────────

#[test]
fn level_exactly_at_threshold_is_inactive() {
    let mut c = SignalConditioner::new(0.5, Duration::from_millis(800));
    // raw 0.25 normalizes to exactly 0.5.
    let sig = c.condition(sample(0.25), Instant::now());
    assert_eq!(sig.level, 0.5);
    assert!(!sig.active);
}

#[test]
fn level_above_threshold_is_active() {
    let mut c = SignalConditioner::new(0.5, Duration::from_millis(800));
    let sig = c.condition(sample(0.3), Instant::now());
    assert!(sig.active);
}

#[test]
fn activity_persists_through_the_silence_timeout() {
    let mut c = conditioner();
    let t0 = Instant::now();
    assert!(c.condition(sample(0.3), t0).active);

    let quiet = c.condition(sample(0.0), t0 + Duration::from_millis(500));
    assert!(quiet.active, "still inside the grace period");

    let lapsed = c.condition(sample(0.0), t0 + Duration::from_millis(801));
    assert!(!lapsed.active, "grace period over");
}

#[test]
fn renewed_sound_restarts_the_timeout() {
    let mut c = conditioner();
    let t0 = Instant::now();
    c.condition(sample(0.3), t0);
    c.condition(sample(0.3), t0 + Duration::from_millis(700));
    let sig = c.condition(sample(0.0), t0 + Duration::from_millis(1400));
    assert!(sig.active, "timeout counts from the most recent exceedance");
}

#[test]
fn set_threshold_clamps_to_unit_range() {
    let mut c = conditioner();
    c.set_threshold(1.5);
    assert_eq!(c.threshold(), 1.0);
    c.set_threshold(-0.1);
    assert_eq!(c.threshold(), 0.0);
}

// ── rolling smoothing window ────────────────────────────────────────────────

#[test]
fn smoothed_level_averages_only_seen_frames() {
    let mut c = conditioner();
    let now = Instant::now();
    // raw 0.1 normalizes to 0.2.
    let first = c.condition(sample(0.1), now);
    assert!((first.smoothed_level - 0.2).abs() < 1e-6);

    // raw 0.2 normalizes to 0.4; mean of [0.2, 0.4] is 0.3.
    let second = c.condition(sample(0.2), now);
    assert!((second.smoothed_level - 0.3).abs() < 1e-6);
}

#[test]
fn window_drops_samples_older_than_ten_frames() {
    let mut c = conditioner();
    let now = Instant::now();
    c.condition(sample(0.5), now); // level 1.0, should age out
    let mut last = 0.0;
    for _ in 0..10 {
        last = c.condition(sample(0.0), now).smoothed_level;
    }
    assert_eq!(last, 0.0, "spike fell out of the ten-frame window");
}

#[test]
fn reset_clears_activity_and_window() {
    let mut c = conditioner();
    let t0 = Instant::now();
    c.condition(sample(0.5), t0);
    c.reset();
    let sig = c.condition(sample(0.0), t0 + Duration::from_millis(1));
    assert!(!sig.active);
    assert_eq!(sig.smoothed_level, 0.0);
}
