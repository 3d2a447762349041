use fractal_visualizer::camera::CameraState;
use fractal_visualizer::config::Policy;
use fractal_visualizer::fractal::Vec2;
use fractal_visualizer::mapper::{FractalParams, ParamMapper, Tuning};
use fractal_visualizer::signal::Conditioned;
use std::time::{Duration, Instant};

fn sig(level: f32, active: bool) -> Conditioned {
    Conditioned {
        level,
        bands: [level; 3],
        smoothed_level: level,
        active,
    }
}

fn mapper(policy: Policy) -> ParamMapper {
    ParamMapper::new(policy, Tuning::default())
}

// ── immediate parameters ────────────────────────────────────────────────────

#[test]
fn depth_maps_level_with_truncation() {
    let mut m = mapper(Policy::Continuous);
    let mut cam = CameraState::default();
    let now = Instant::now();

    m.update(&sig(0.0, false), &mut cam, now);
    assert_eq!(m.params().depth, 3);

    m.update(&sig(0.5, true), &mut cam, now);
    // 3 + 0.5 * 7 = 6.5, truncated.
    assert_eq!(m.params().depth, 6);

    m.update(&sig(1.0, true), &mut cam, now);
    assert_eq!(m.params().depth, 10);
}

#[test]
fn hue_advances_only_while_active() {
    let mut m = mapper(Policy::Continuous);
    let mut cam = CameraState::default();
    let now = Instant::now();

    let mut prev = m.params().hue;
    for _ in 0..5 {
        m.update(&sig(0.4, true), &mut cam, now);
        let hue = m.params().hue;
        assert!(hue > prev, "hue must strictly increase while active");
        prev = hue;
    }

    m.update(&sig(0.0, false), &mut cam, now);
    assert_eq!(m.params().hue, prev, "hue freezes when inactive");
}

#[test]
fn hue_wraps_within_the_color_wheel() {
    let mut m = mapper(Policy::Continuous);
    let mut cam = CameraState::default();
    let now = Instant::now();
    for _ in 0..500 {
        m.update(&sig(1.0, true), &mut cam, now);
        let hue = m.params().hue;
        assert!((0.0..360.0).contains(&hue), "hue {hue} out of range");
    }
}

#[test]
fn color_boost_follows_activity_edges() {
    let mut m = mapper(Policy::Continuous);
    let mut cam = CameraState::default();
    let now = Instant::now();

    assert!(!m.color_boost());
    m.update(&sig(0.5, true), &mut cam, now);
    assert!(m.color_boost(), "set on the rising edge");
    m.update(&sig(0.5, true), &mut cam, now);
    assert!(m.color_boost(), "held while activity persists");
    m.update(&sig(0.0, false), &mut cam, now);
    assert!(!m.color_boost(), "cleared on the falling edge");
}

// ── continuous policy ───────────────────────────────────────────────────────

#[test]
fn continuous_activity_pushes_zoom_deeper() {
    let mut m = mapper(Policy::Continuous);
    let mut cam = CameraState::default();
    m.update(&sig(0.5, true), &mut cam, Instant::now());
    assert!(cam.target_zoom > 1.0);
}

#[test]
fn continuous_zoom_saturates_at_the_ceiling() {
    let mut m = mapper(Policy::Continuous);
    let mut cam = CameraState::default();
    let now = Instant::now();
    for _ in 0..5000 {
        m.update(&sig(1.0, true), &mut cam, now);
    }
    assert_eq!(cam.target_zoom, Tuning::default().zoom_ceiling);
}

#[test]
fn continuous_idle_decays_toward_the_floor() {
    let mut m = mapper(Policy::Continuous);
    let mut cam = CameraState::default();
    cam.target_zoom = 10.0;
    let now = Instant::now();

    m.update(&sig(0.0, false), &mut cam, now);
    assert!(cam.target_zoom < 10.0);

    for _ in 0..5000 {
        m.update(&sig(0.0, false), &mut cam, now);
    }
    assert!(
        (cam.target_zoom - Tuning::default().zoom_floor).abs() < 1e-2,
        "long silence settles at the floor, got {}",
        cam.target_zoom
    );
}

#[test]
fn continuous_clamps_an_out_of_range_target() {
    let mut m = mapper(Policy::Continuous);
    let mut cam = CameraState::default();
    cam.target_zoom = 1000.0;
    m.update(&sig(1.0, true), &mut cam, Instant::now());
    assert!(cam.target_zoom <= Tuning::default().zoom_ceiling);
}

// ── stepped policy ──────────────────────────────────────────────────────────

#[test]
fn stepped_levels_up_when_smoothed_zoom_crosses_threshold() {
    let mut m = mapper(Policy::Stepped);
    let mut cam = CameraState::default();
    cam.zoom = 10.0;
    m.update(&sig(0.5, true), &mut cam, Instant::now());
    assert_eq!(cam.target_depth, 1.0);
}

#[test]
fn stepped_debounce_blocks_an_immediate_second_step() {
    let mut m = mapper(Policy::Stepped);
    let mut cam = CameraState::default();
    cam.zoom = 1000.0;
    let now = Instant::now();
    for _ in 0..10 {
        m.update(&sig(0.5, true), &mut cam, now);
    }
    assert_eq!(cam.target_depth, 1.0, "one step per debounce interval");
}

#[test]
fn stepped_threshold_escalates_geometrically() {
    let mut m = mapper(Policy::Stepped);
    let mut cam = CameraState::default();
    cam.zoom = 10.0;
    let t0 = Instant::now();

    for i in 0..200u64 {
        m.update(&sig(0.5, true), &mut cam, t0 + Duration::from_secs(i));
    }
    // Thresholds 1.8, 3.24, 5.83 are reachable with the smoothed zoom
    // converging on 10; the next, 10.5, is not.
    assert_eq!(cam.target_depth, 3.0);
}

#[test]
fn stepped_depth_caps_at_the_maximum() {
    let mut m = mapper(Policy::Stepped);
    let mut cam = CameraState::default();
    cam.zoom = 1.0e7;
    let t0 = Instant::now();
    for i in 0..50u64 {
        m.update(&sig(0.5, true), &mut cam, t0 + Duration::from_secs(i));
    }
    assert_eq!(cam.target_depth, Tuning::default().depth_max);
}

#[test]
fn stepped_silence_does_not_grow_zoom() {
    let mut m = mapper(Policy::Stepped);
    let mut cam = CameraState::default();
    m.update(&sig(0.0, false), &mut cam, Instant::now());
    assert_eq!(cam.target_zoom, 1.0);
}

// ── bidirectional policy ────────────────────────────────────────────────────

#[test]
fn bidirectional_activity_targets_the_inside_pose() {
    let mut m = mapper(Policy::Bidirectional);
    let mut cam = CameraState::default();
    let t = Tuning::default();
    m.update(&sig(0.5, true), &mut cam, Instant::now());
    assert_eq!(cam.target_zoom, t.inside_zoom);
    assert_eq!(cam.target_offset, t.inside_offset);
    assert_eq!(cam.target_depth, t.depth_max);
}

#[test]
fn bidirectional_silence_retreats_to_the_neutral_pose() {
    let mut m = mapper(Policy::Bidirectional);
    let mut cam = CameraState::default();
    let t = Tuning::default();

    m.update(&sig(0.5, true), &mut cam, Instant::now());
    m.update(&sig(0.0, false), &mut cam, Instant::now());
    assert_eq!(cam.target_zoom, t.zoom_floor);
    assert_eq!(cam.target_offset, Vec2::ZERO);
    assert_eq!(cam.target_depth, t.neutral_depth);
}

// ── policy switching and reset ──────────────────────────────────────────────

#[test]
fn set_policy_takes_effect_on_the_next_update() {
    let mut m = mapper(Policy::Continuous);
    let mut cam = CameraState::default();
    m.set_policy(Policy::Bidirectional);
    m.update(&sig(0.5, true), &mut cam, Instant::now());
    assert_eq!(cam.target_zoom, Tuning::default().inside_zoom);
}

#[test]
fn reset_restores_default_parameters() {
    let mut m = mapper(Policy::Stepped);
    let mut cam = CameraState::default();
    cam.zoom = 10.0;
    let t0 = Instant::now();
    for i in 0..20u64 {
        m.update(&sig(0.8, true), &mut cam, t0 + Duration::from_secs(i));
    }
    m.reset();
    assert_eq!(m.params(), FractalParams::default());
    assert!(!m.color_boost());

    // The escalated step threshold is back at its initial value: a fresh
    // camera steps again on the first crossing.
    let mut cam2 = CameraState::default();
    cam2.zoom = 10.0;
    m.update(&sig(0.5, true), &mut cam2, t0 + Duration::from_secs(100));
    assert_eq!(cam2.target_depth, 1.0);
}
