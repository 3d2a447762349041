use crate::fractal::{DrawTarget, Hsba, Vec2};

/// RGBA framebuffer the geometry engines draw into and the terminal
/// renderers read back.
pub struct PixelCanvas {
    w: usize,
    h: usize,
    pixels: Vec<u8>,
}

impl PixelCanvas {
    pub fn new(w: usize, h: usize) -> Self {
        Self {
            w,
            h,
            pixels: vec![0u8; w * h * 4],
        }
    }

    pub fn resize(&mut self, w: usize, h: usize) {
        self.w = w;
        self.h = h;
        self.pixels.clear();
        self.pixels.resize(w * h * 4, 0);
    }

    pub fn width(&self) -> usize {
        self.w
    }

    pub fn height(&self) -> usize {
        self.h
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Motion-blur trail: blend a translucent background over the whole
    /// buffer instead of clearing it.
    pub fn fade(&mut self, bg: Hsba) {
        let (r, g, b, a) = bg.to_rgba8();
        let alpha = a as u32;
        let inv = 255 - alpha;
        for px in self.pixels.chunks_exact_mut(4) {
            px[0] = ((r as u32 * alpha + px[0] as u32 * inv) / 255) as u8;
            px[1] = ((g as u32 * alpha + px[1] as u32 * inv) / 255) as u8;
            px[2] = ((b as u32 * alpha + px[2] as u32 * inv) / 255) as u8;
            px[3] = 255;
        }
    }

    pub fn clear(&mut self, bg: Hsba) {
        let (r, g, b, _) = bg.to_rgba8();
        for px in self.pixels.chunks_exact_mut(4) {
            px[0] = r;
            px[1] = g;
            px[2] = b;
            px[3] = 255;
        }
    }

    pub fn pixel(&self, x: usize, y: usize) -> (u8, u8, u8) {
        let i = (y * self.w + x) * 4;
        (self.pixels[i], self.pixels[i + 1], self.pixels[i + 2])
    }

    fn blend(&mut self, x: i32, y: i32, rgb: (u8, u8, u8), alpha: u32) {
        if x < 0 || y < 0 || x as usize >= self.w || y as usize >= self.h {
            return;
        }
        let i = (y as usize * self.w + x as usize) * 4;
        let inv = 255 - alpha;
        self.pixels[i] = ((rgb.0 as u32 * alpha + self.pixels[i] as u32 * inv) / 255) as u8;
        self.pixels[i + 1] = ((rgb.1 as u32 * alpha + self.pixels[i + 1] as u32 * inv) / 255) as u8;
        self.pixels[i + 2] = ((rgb.2 as u32 * alpha + self.pixels[i + 2] as u32 * inv) / 255) as u8;
        self.pixels[i + 3] = 255;
    }

    fn stamp(&mut self, cx: f32, cy: f32, radius: f32, rgb: (u8, u8, u8), alpha: u32) {
        if radius <= 0.5 {
            self.blend(cx.round() as i32, cy.round() as i32, rgb, alpha);
            return;
        }
        let r = radius.ceil() as i32;
        let r2 = radius * radius;
        for dy in -r..=r {
            for dx in -r..=r {
                if (dx * dx + dy * dy) as f32 <= r2 {
                    self.blend(cx.round() as i32 + dx, cy.round() as i32 + dy, rgb, alpha);
                }
            }
        }
    }
}

impl DrawTarget for PixelCanvas {
    fn line(&mut self, a: Vec2, b: Vec2, color: Hsba, weight: f32) {
        let (r, g, bl, al) = color.to_rgba8();
        let dx = b.x - a.x;
        let dy = b.y - a.y;
        let len = (dx * dx + dy * dy).sqrt();
        let steps = len.ceil().max(1.0) as usize;
        let radius = (weight * 0.5).max(0.5);
        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            self.stamp(a.x + dx * t, a.y + dy * t, radius, (r, g, bl), al as u32);
        }
    }

    fn fill_triangle(&mut self, a: Vec2, b: Vec2, c: Vec2, color: Hsba) {
        let (r, g, bl, al) = color.to_rgba8();
        let min_x = a.x.min(b.x).min(c.x).floor().max(0.0) as i32;
        let max_x = a.x.max(b.x).max(c.x).ceil().min(self.w as f32) as i32;
        let min_y = a.y.min(b.y).min(c.y).floor().max(0.0) as i32;
        let max_y = a.y.max(b.y).max(c.y).ceil().min(self.h as f32) as i32;

        let edge = |p: Vec2, q: Vec2, x: f32, y: f32| (q.x - p.x) * (y - p.y) - (q.y - p.y) * (x - p.x);
        let area = edge(a, b, c.x, c.y);
        if area.abs() < f32::EPSILON {
            return;
        }

        for y in min_y..max_y {
            for x in min_x..max_x {
                let px = x as f32 + 0.5;
                let py = y as f32 + 0.5;
                let w0 = edge(a, b, px, py) / area;
                let w1 = edge(b, c, px, py) / area;
                let w2 = edge(c, a, px, py) / area;
                if w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0 {
                    self.blend(x, y, (r, g, bl), al as u32);
                }
            }
        }
    }

    fn ellipse(&mut self, center: Vec2, rx: f32, ry: f32, color: Hsba) {
        let (r, g, bl, al) = color.to_rgba8();
        let min_x = (center.x - rx).floor().max(0.0) as i32;
        let max_x = (center.x + rx).ceil().min(self.w as f32) as i32;
        let min_y = (center.y - ry).floor().max(0.0) as i32;
        let max_y = (center.y + ry).ceil().min(self.h as f32) as i32;
        if rx <= 0.0 || ry <= 0.0 {
            return;
        }
        for y in min_y..max_y {
            for x in min_x..max_x {
                let nx = (x as f32 + 0.5 - center.x) / rx;
                let ny = (y as f32 + 0.5 - center.y) / ry;
                if nx * nx + ny * ny <= 1.0 {
                    self.blend(x, y, (r, g, bl), al as u32);
                }
            }
        }
    }
}
