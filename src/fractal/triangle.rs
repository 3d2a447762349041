use crate::fractal::{depth_color, DrawTarget, FrameInput, Geometry, Vec2};

/// Hard recursion ceiling; rendering cost is otherwise unbounded relative
/// to screen resolution as zoom grows.
const DEPTH_CEILING: u32 = 12;

/// Sierpinski triangle explorer. The camera's continuous depth selects the
/// subdivision bound; off-screen subtrees are culled before recursing.
pub struct SierpinskiTriangle {
    max_depth: u32,
    last_depth: u32,
}

impl SierpinskiTriangle {
    pub fn new(max_depth: u32) -> Self {
        Self {
            max_depth: max_depth.clamp(1, DEPTH_CEILING),
            last_depth: 0,
        }
    }

    fn base_vertices(input: &FrameInput) -> [Vec2; 3] {
        let c = input.viewport.center();
        let r = input.viewport.w.min(input.viewport.h) * 0.46;
        [
            Vec2::new(c.x, c.y - r),
            Vec2::new(c.x - r * 0.866, c.y + r * 0.5),
            Vec2::new(c.x + r * 0.866, c.y + r * 0.5),
        ]
    }

    fn subdivide(
        &self,
        tri: [Vec2; 3],
        depth: u32,
        total: u32,
        input: &FrameInput,
        out: &mut dyn DrawTarget,
    ) {
        let center = input.viewport.center();
        let screen = [
            input.camera.to_screen(tri[0], center),
            input.camera.to_screen(tri[1], center),
            input.camera.to_screen(tri[2], center),
        ];
        if input.viewport.all_outside(&screen) {
            return;
        }

        if depth == 0 {
            let color = depth_color(input.params.hue, total, self.max_depth, input.color_boost);
            out.fill_triangle(screen[0], screen[1], screen[2], color);
            return;
        }

        let [a, b, c] = tri;
        let ab = midpoint(a, b);
        let bc = midpoint(b, c);
        let ca = midpoint(c, a);
        self.subdivide([a, ab, ca], depth - 1, total, input, out);
        self.subdivide([ab, b, bc], depth - 1, total, input, out);
        self.subdivide([ca, bc, c], depth - 1, total, input, out);
    }
}

fn midpoint(a: Vec2, b: Vec2) -> Vec2 {
    Vec2::new((a.x + b.x) * 0.5, (a.y + b.y) * 0.5)
}

impl Geometry for SierpinskiTriangle {
    fn name(&self) -> &'static str {
        "Triangle"
    }

    fn update(&mut self, _input: &FrameInput) {}

    fn render(&mut self, input: &FrameInput, out: &mut dyn DrawTarget) {
        let depth = (input.camera.depth.round().max(0.0) as u32).min(self.max_depth);
        self.last_depth = depth;
        self.subdivide(Self::base_vertices(input), depth, depth, input, out);
    }

    fn reset(&mut self) {
        self.last_depth = 0;
    }

    fn detail(&self) -> u32 {
        self.last_depth
    }
}
