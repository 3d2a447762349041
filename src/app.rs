use crate::audio::AudioSystem;
use crate::camera::CameraState;
use crate::canvas::PixelCanvas;
use crate::config::{Config, RendererMode, Shape};
use crate::fractal::{
    DragonCurve, FrameInput, Geometry, Hsba, SierpinskiTriangle, TreeFractal, Viewport,
};
use crate::mapper::{ParamMapper, Tuning};
use crate::render::{BrailleRenderer, Frame, HalfBlockRenderer, Renderer};
use crate::signal::SignalConditioner;
use crate::terminal::TerminalGuard;
use anyhow::Context;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use std::io::BufWriter;
use std::time::{Duration, Instant};

/// The single mutable state object owned by the frame loop. Reset and
/// shape switches land here, between frames, never mid-render.
struct VizState {
    shape: Shape,
    geometry: Box<dyn Geometry>,
    conditioner: SignalConditioner,
    mapper: ParamMapper,
    camera: CameraState,
}

impl VizState {
    fn new(cfg: &Config) -> Self {
        Self {
            shape: cfg.shape,
            geometry: make_geometry(cfg.shape, cfg),
            conditioner: SignalConditioner::new(
                cfg.threshold,
                Duration::from_millis(cfg.silence_timeout_ms),
            ),
            mapper: ParamMapper::new(cfg.policy, tuning_for_shape(cfg.shape)),
            camera: CameraState::default(),
        }
    }

    fn reset(&mut self) {
        self.geometry.reset();
        self.conditioner.reset();
        self.mapper.reset();
        self.camera.reset();
    }

    fn switch_shape(&mut self, shape: Shape, cfg: &Config) {
        if shape == self.shape {
            return;
        }
        let policy = self.mapper.policy();
        self.shape = shape;
        self.geometry = make_geometry(shape, cfg);
        self.mapper = ParamMapper::new(policy, tuning_for_shape(shape));
        self.camera.reset();
    }
}

fn make_geometry(shape: Shape, cfg: &Config) -> Box<dyn Geometry> {
    match shape {
        Shape::Tree => Box::new(TreeFractal::new(cfg.seed, cfg.max_depth)),
        Shape::Triangle => Box::new(SierpinskiTriangle::new(cfg.max_depth)),
        Shape::Dragon => Box::new(DragonCurve::new(cfg.max_iterations)),
    }
}

fn tuning_for_shape(shape: Shape) -> Tuning {
    let mut t = Tuning::default();
    if shape == Shape::Dragon {
        // The dragon camera may pull far back to fit the whole curve, and
        // it idles on the frame loop's slow zoom drift instead of decaying.
        t.zoom_floor = 0.1;
        t.inside_zoom = 2.5;
        t.idle_decay = 0.0;
    }
    t
}

pub fn run(cfg: Config) -> anyhow::Result<()> {
    let _term = TerminalGuard::new()?;
    let mut out = BufWriter::new(TerminalGuard::stdout());

    let mut renderer: Box<dyn Renderer> = match cfg.renderer {
        RendererMode::HalfBlock => Box::new(HalfBlockRenderer::new()),
        RendererMode::Braille => Box::new(BrailleRenderer::new()),
    };
    let (px_w_mul, px_h_mul) = match cfg.renderer {
        RendererMode::HalfBlock => (1usize, 2usize),
        RendererMode::Braille => (2usize, 4usize),
    };

    // A missing microphone is not fatal: the visualizer idles on the zero
    // sample instead.
    let audio = AudioSystem::new(cfg.device.as_deref()).ok();

    let mut last_size = crossterm::terminal::size().context("get terminal size")?;
    if last_size.1 < 2 || last_size.0 < 4 {
        return Err(anyhow::anyhow!(
            "terminal too small (need at least 4x2, got {}x{})",
            last_size.0,
            last_size.1
        ));
    }

    let mut state = VizState::new(&cfg);
    let mut canvas = PixelCanvas::new(0, 0);

    let mut show_hud = true;
    let mut show_help = false;
    let mut hud_rows = hud_rows_for_size(last_size, show_hud);
    resize_canvas(&mut canvas, last_size, px_w_mul, px_h_mul, hud_rows);

    let mut last_frame = Instant::now();
    let mut fps = FpsCounter::new();

    loop {
        let now = Instant::now();

        // Drain input events (non-blocking); reset lands on the frame
        // boundary, before any state advances.
        while event::poll(Duration::from_millis(0))? {
            match event::read()? {
                Event::Key(k) if k.kind != KeyEventKind::Release => {
                    if k.modifiers.contains(KeyModifiers::CONTROL)
                        && matches!(k.code, KeyCode::Char('c'))
                    {
                        return Ok(());
                    }
                    match k.code {
                        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => return Ok(()),
                        KeyCode::Char('r') | KeyCode::Char('R') => state.reset(),
                        KeyCode::Char('1') => state.switch_shape(Shape::Tree, &cfg),
                        KeyCode::Char('2') => state.switch_shape(Shape::Triangle, &cfg),
                        KeyCode::Char('3') => state.switch_shape(Shape::Dragon, &cfg),
                        KeyCode::Char('p') | KeyCode::Char('P') => {
                            let next = state.mapper.policy().next();
                            state.mapper.set_policy(next);
                        }
                        KeyCode::Char(']') => {
                            let t = state.conditioner.threshold() + 0.005;
                            state.conditioner.set_threshold(t);
                        }
                        KeyCode::Char('[') => {
                            let t = state.conditioner.threshold() - 0.005;
                            state.conditioner.set_threshold(t);
                        }
                        KeyCode::Char('i') | KeyCode::Char('I') => {
                            show_hud = !show_hud;
                            hud_rows = hud_rows_for_size(last_size, show_hud);
                            resize_canvas(&mut canvas, last_size, px_w_mul, px_h_mul, hud_rows);
                        }
                        KeyCode::Char('?') | KeyCode::Char('h') | KeyCode::Char('H') => {
                            show_help = !show_help;
                        }
                        _ => {}
                    }
                }
                Event::Resize(c, r) => {
                    last_size = (c, r);
                    hud_rows = hud_rows_for_size(last_size, show_hud);
                    resize_canvas(&mut canvas, last_size, px_w_mul, px_h_mul, hud_rows);
                }
                _ => {}
            }
        }

        // Resize events can be missed in some terminals.
        let sz = crossterm::terminal::size()?;
        if sz != last_size {
            last_size = sz;
            hud_rows = hud_rows_for_size(last_size, show_hud);
            resize_canvas(&mut canvas, last_size, px_w_mul, px_h_mul, hud_rows);
        }

        let dt = now.duration_since(last_frame).as_secs_f32().max(1e-6);
        last_frame = now;

        let raw = audio.as_ref().map(|a| a.sample());
        let sig = state.conditioner.condition(raw, now);
        state.mapper.update(&sig, &mut state.camera, now);

        // Dragon idles with a slow zoom-in drift rather than a retreat.
        if state.shape == Shape::Dragon && !sig.active {
            state.camera.target_zoom =
                (state.camera.target_zoom + 0.02 * dt).min(state.mapper.tuning().zoom_ceiling);
        }

        let rate = CameraState::rate_for_level(cfg.smoothing, sig.level);
        state.camera.step(rate, 1.0);

        let viewport = Viewport::new(canvas.width() as f32, canvas.height() as f32);
        let input = FrameInput {
            now,
            dt,
            params: state.mapper.params(),
            camera: state.camera,
            signal: sig,
            viewport,
            color_boost: state.mapper.color_boost(),
        };

        state.geometry.update(&input);
        canvas.fade(Hsba::new(230.0, 60.0, 16.0, 20.0));
        state.geometry.render(&input, &mut canvas);

        let (term_cols, term_rows) = last_size;
        let hud = if show_hud {
            build_wrapped_hud(
                term_cols as usize,
                state.shape.label(),
                state.mapper.policy().label(),
                state.geometry.detail(),
                state.camera.zoom,
                sig.level,
                state.conditioner.threshold(),
                sig.active,
                state.mapper.color_boost(),
                fps.fps(),
                renderer.name(),
            )
        } else {
            String::new()
        };

        let target_hud_rows = hud_rows_for_text(term_rows, show_hud, &hud);
        if target_hud_rows != hud_rows {
            hud_rows = target_hud_rows;
            resize_canvas(&mut canvas, last_size, px_w_mul, px_h_mul, hud_rows);
        }
        let visual_rows = term_rows.saturating_sub(hud_rows).max(1);

        let frame = Frame {
            term_cols,
            term_rows,
            visual_rows,
            pixel_width: canvas.width(),
            pixel_height: canvas.height(),
            pixels_rgba: canvas.pixels(),
            hud: &hud,
            hud_rows,
            overlay: show_help.then(help_popup_text),
            sync_updates: cfg.sync_updates,
        };
        renderer.render(&frame, &mut out)?;

        fps.tick();

        // Frame pacing.
        let target = Duration::from_secs_f32(1.0 / cfg.fps.max(1) as f32);
        let elapsed = now.elapsed();
        if elapsed < target {
            std::thread::sleep(target - elapsed);
        }
    }
}

fn resize_canvas(
    canvas: &mut PixelCanvas,
    size: (u16, u16),
    px_w_mul: usize,
    px_h_mul: usize,
    hud_rows: u16,
) {
    let (cols, rows) = size;
    let visual_rows = rows.saturating_sub(hud_rows).max(1);
    let w = (cols as usize).saturating_mul(px_w_mul);
    let h = (visual_rows as usize).saturating_mul(px_h_mul);
    canvas.resize(w, h);
}

fn hud_rows_for_size(size: (u16, u16), show_hud: bool) -> u16 {
    if !show_hud {
        return 0;
    }
    let rows = size.1;
    if rows <= 1 {
        return 0;
    }
    (rows - 1).min(3)
}

fn hud_rows_for_text(term_rows: u16, show_hud: bool, hud: &str) -> u16 {
    if !show_hud {
        return 0;
    }
    let max_rows = term_rows.saturating_sub(1);
    let wanted = hud.lines().count() as u16;
    wanted.min(max_rows)
}

#[allow(clippy::too_many_arguments)]
fn build_wrapped_hud(
    cols: usize,
    shape: &str,
    policy: &str,
    detail: u32,
    zoom: f32,
    level: f32,
    threshold: f32,
    active: bool,
    boost: bool,
    fps: f32,
    renderer_name: &str,
) -> String {
    let logical_lines = vec![
        format!(
            "Shape: {} | Policy: {} | Depth/Iter: {} | Zoom: {:>5.2}x | Level: {:>5.1}% | Thr: {:>4.1}% | {} | Boost: {} | FPS: {:>4.1} | Renderer: {}",
            shape,
            policy,
            detail,
            zoom,
            level * 100.0,
            threshold * 100.0,
            if active { "ACTIVE" } else { "idle" },
            if boost { "on" } else { "off" },
            fps,
            renderer_name,
        ),
        "Keys: 1/2/3 shape | p policy | [/ ] threshold | r reset | i HUD | ?/h help | q quit"
            .to_string(),
    ];

    wrap_hud_lines(cols, &logical_lines).join("\n")
}

fn wrap_hud_lines(cols: usize, lines: &[String]) -> Vec<String> {
    let width = cols.max(1);
    let mut out = Vec::new();
    for line in lines {
        out.extend(hard_wrap_line(line, width));
    }
    out
}

fn hard_wrap_line(line: &str, width: usize) -> Vec<String> {
    if line.is_empty() {
        return vec![String::new()];
    }

    let mut out = Vec::new();
    let mut cur = String::new();
    let mut cur_len = 0usize;
    for ch in line.chars() {
        cur.push(ch);
        cur_len += 1;
        if cur_len >= width {
            out.push(cur);
            cur = String::new();
            cur_len = 0;
        }
    }
    if !cur.is_empty() {
        out.push(cur);
    }
    if out.is_empty() {
        out.push(String::new());
    }
    out
}

fn help_popup_text() -> &'static str {
    "Fractal Visualizer Hotkeys\n\
1  audio-reactive branching tree\n\
2  zooming Sierpinski triangle\n\
3  dragon curve (fold on sound)\n\
p  cycle navigation policy: continuous/stepped/bidirectional\n\
[ / ]  lower / raise the activity threshold\n\
r  reset camera, parameters, and geometry\n\
i  show/hide HUD\n\
? or h  toggle this help\n\
q or esc  quit"
}

struct FpsCounter {
    last: Instant,
    frames: u32,
    fps: f32,
}

impl FpsCounter {
    fn new() -> Self {
        Self {
            last: Instant::now(),
            frames: 0,
            fps: 0.0,
        }
    }

    fn tick(&mut self) {
        self.frames += 1;
        let now = Instant::now();
        let dt = now.duration_since(self.last).as_secs_f32();
        if dt >= 0.5 {
            self.fps = (self.frames as f32) / dt;
            self.frames = 0;
            self.last = now;
        }
    }

    fn fps(&self) -> f32 {
        self.fps
    }
}
