use crate::fractal::{depth_color, DrawTarget, FrameInput, Geometry, Hsba, Vec2};
use crate::signal::map;
use std::f32::consts::FRAC_PI_2;

/// Binary branching tree anchored at the bottom-center of the canvas.
/// Audio level sets the recursion depth, the low band opens the branch
/// angle, the mid band stretches the branch length.
pub struct TreeFractal {
    rng: fastrand::Rng,
    max_depth: u32,
    last_depth: u32,
}

impl TreeFractal {
    pub fn new(seed: Option<u64>, max_depth: u32) -> Self {
        let rng = match seed {
            Some(s) => fastrand::Rng::with_seed(s),
            None => fastrand::Rng::new(),
        };
        Self {
            rng,
            max_depth: max_depth.max(1),
            last_depth: 0,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn branch(
        &mut self,
        from: Vec2,
        heading: f32,
        len: f32,
        depth: u32,
        total: u32,
        input: &FrameInput,
        out: &mut dyn DrawTarget,
    ) {
        if depth == 0 {
            return;
        }

        let (sin, cos) = heading.sin_cos();
        let to = Vec2::new(from.x + cos * len, from.y + sin * len);

        let center = input.viewport.center();
        let color = depth_color(input.params.hue, depth, total, input.color_boost);
        let weight = map(depth as f32, 0.0, total as f32, 1.0, 8.0, true);
        out.line(
            input.camera.to_screen(from, center),
            input.camera.to_screen(to, center),
            color,
            weight,
        );

        if depth > 1 {
            let next = len * 0.7;
            let spread = input.params.angle;
            self.branch(to, heading - spread, next, depth - 1, total, input, out);
            self.branch(to, heading + spread, next, depth - 1, total, input, out);

            // Occasional near-straight extra branch, more likely when loud.
            let p = map(input.signal.level, 0.0, 1.0, 0.0, 0.3, true);
            if self.rng.f32() < p {
                let tilt = self.rng.f32() * 0.2 - 0.1;
                self.branch(to, heading + tilt, next * 0.8, depth - 1, total, input, out);
            }
        }

        if depth == 1 {
            let leaf = Hsba::new(input.params.hue, 70.0, 80.0, 60.0);
            out.ellipse(input.camera.to_screen(to, center), 4.0, 4.0, leaf);
        }
    }
}

impl Geometry for TreeFractal {
    fn name(&self) -> &'static str {
        "Tree"
    }

    fn update(&mut self, _input: &FrameInput) {}

    fn render(&mut self, input: &FrameInput, out: &mut dyn DrawTarget) {
        let depth = input.params.depth.min(self.max_depth);
        self.last_depth = depth;
        if depth == 0 {
            return;
        }

        let anchor = Vec2::new(input.viewport.w * 0.5, input.viewport.h * 0.85);
        self.branch(
            anchor,
            -FRAC_PI_2,
            input.params.length,
            depth,
            depth,
            input,
            out,
        );
    }

    fn reset(&mut self) {
        self.last_depth = 0;
    }

    fn detail(&self) -> u32 {
        self.last_depth
    }
}
