use crate::fractal::{DrawTarget, FrameInput, Geometry, Hsba, Vec2};
use std::f32::consts::FRAC_PI_2;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoldPhase {
    Idle,
    Generating,
    Animating,
}

impl FoldPhase {
    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Generating => "Generating",
            Self::Animating => "Animating",
        }
    }
}

struct FoldAnimation {
    progress: f32,
    pivot: Vec2,
    snapshot: Vec<Vec2>,
    direction: f32,
}

const SEED_HALF_SPAN: f32 = 60.0;

fn seed_points() -> Vec<Vec2> {
    vec![
        Vec2::new(-SEED_HALF_SPAN, 0.0),
        Vec2::new(SEED_HALF_SPAN, 0.0),
    ]
}

/// Dragon curve built by repeatedly rotating the accumulated point
/// sequence 90 degrees about its endpoint, alternating direction each
/// iteration. Geometry accumulates across iterations instead of being
/// recomputed per frame.
pub struct DragonCurve {
    points: Vec<Vec2>,
    iterations: u32,
    max_iterations: u32,
    phase: FoldPhase,
    anim: Option<FoldAnimation>,
    last_fold: Option<Instant>,
    min_interval: Duration,
}

impl DragonCurve {
    pub fn new(max_iterations: u32) -> Self {
        Self {
            points: seed_points(),
            iterations: 0,
            max_iterations: max_iterations.max(1),
            phase: FoldPhase::Idle,
            anim: None,
            last_fold: None,
            min_interval: Duration::from_millis(600),
        }
    }

    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub fn phase(&self) -> FoldPhase {
        self.phase
    }

    fn fold_direction(&self) -> f32 {
        if self.iterations % 2 == 0 { 1.0 } else { -1.0 }
    }

    fn try_start_fold(&mut self, now: Instant) {
        if self.anim.is_some() || self.iterations >= self.max_iterations {
            return;
        }
        if let Some(prev) = self.last_fold {
            if now.duration_since(prev) < self.min_interval {
                return;
            }
        }
        let pivot = match self.points.last() {
            Some(&p) => p,
            None => return,
        };
        self.anim = Some(FoldAnimation {
            progress: 0.0,
            pivot,
            snapshot: self.points.clone(),
            direction: self.fold_direction(),
        });
        self.phase = FoldPhase::Animating;
    }

    fn merge_fold(&mut self, now: Instant) {
        let Some(anim) = self.anim.take() else {
            return;
        };
        let angle = anim.direction * FRAC_PI_2;
        // Walk the rotated copy backwards so the appended run continues
        // from the pivot; the rotated pivot itself would be a duplicate.
        for p in anim.snapshot.iter().rev().skip(1) {
            self.points.push(p.rotated_around(anim.pivot, angle));
        }
        self.iterations += 1;
        self.last_fold = Some(now);
    }
}

impl Geometry for DragonCurve {
    fn name(&self) -> &'static str {
        "Dragon"
    }

    fn update(&mut self, input: &FrameInput) {
        let active = input.signal.active;
        match self.phase {
            FoldPhase::Idle => {
                if active {
                    self.phase = FoldPhase::Generating;
                }
            }
            FoldPhase::Generating => {
                if !active {
                    self.phase = FoldPhase::Idle;
                } else {
                    self.try_start_fold(input.now);
                }
            }
            FoldPhase::Animating => {
                let done = match self.anim.as_mut() {
                    Some(anim) => {
                        anim.progress += input.dt * (0.8 + 1.6 * input.signal.level);
                        anim.progress >= 1.0
                    }
                    None => true,
                };
                if done {
                    self.merge_fold(input.now);
                    self.phase = if active {
                        FoldPhase::Generating
                    } else {
                        FoldPhase::Idle
                    };
                }
            }
        }
    }

    fn render(&mut self, input: &FrameInput, out: &mut dyn DrawTarget) {
        let center = input.viewport.center();
        let to_screen = |p: Vec2| {
            input
                .camera
                .to_screen(Vec2::new(center.x + p.x, center.y + p.y), center)
        };

        let main: Vec<Vec2> = self.points.iter().map(|&p| to_screen(p)).collect();
        let body = Hsba::new(input.params.hue, 85.0, 95.0, 95.0);
        out.polyline(&main, body, 2.0);

        if let Some(anim) = &self.anim {
            let eased = anim.progress.clamp(0.0, 1.0);
            let angle = anim.direction * FRAC_PI_2 * eased;
            let copy: Vec<Vec2> = anim
                .snapshot
                .iter()
                .map(|&p| to_screen(p.rotated_around(anim.pivot, angle)))
                .collect();
            let ghost = Hsba::new(input.params.hue + 40.0, 70.0, 90.0, 55.0);
            out.polyline(&copy, ghost, 1.5);

            if let Some(&far) = copy.first() {
                let guide = Hsba::new(input.params.hue + 40.0, 40.0, 100.0, 30.0);
                out.line(to_screen(anim.pivot), far, guide, 1.0);
            }
        }
    }

    fn reset(&mut self) {
        self.points = seed_points();
        self.iterations = 0;
        self.phase = FoldPhase::Idle;
        self.anim = None;
        self.last_fold = None;
    }

    fn detail(&self) -> u32 {
        self.iterations
    }
}
