use clap::{Parser, ValueEnum};

#[derive(Parser, Debug, Clone)]
#[command(name = "fractal-visualizer", version, about = "Audio-reactive recursive fractal explorer for the terminal")]
pub struct Config {
    /// Which fractal shape to drive with the microphone.
    #[arg(long, value_enum, default_value_t = Shape::Tree)]
    pub shape: Shape,

    /// How audio activity advances the camera/depth targets.
    #[arg(long, value_enum, default_value_t = Policy::Continuous)]
    pub policy: Policy,

    #[arg(long, value_enum, default_value_t = RendererMode::HalfBlock)]
    pub renderer: RendererMode,

    #[arg(long, default_value_t = 60)]
    pub fps: u32,

    /// Normalized level above which the signal counts as active (strict >).
    #[arg(long, default_value_t = 0.02)]
    pub threshold: f32,

    /// Grace period before activity lapses after the signal drops, in ms.
    #[arg(long, default_value_t = 800)]
    pub silence_timeout_ms: u64,

    /// Base exponential smoothing rate for camera/depth interpolation.
    #[arg(long, default_value_t = 0.08)]
    pub smoothing: f32,

    /// Recursion depth ceiling (tree/triangle) regardless of signal drive.
    #[arg(long, default_value_t = 12)]
    pub max_depth: u32,

    /// Fold iteration ceiling for the dragon curve.
    #[arg(long, default_value_t = 16)]
    pub max_iterations: u32,

    /// Seed for the stochastic tree branches. Random when omitted.
    #[arg(long)]
    pub seed: Option<u64>,

    #[arg(long, default_value_t = false)]
    pub list_devices: bool,

    /// Substring match against input device names.
    #[arg(long)]
    pub device: Option<String>,

    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub sync_updates: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Shape {
    Tree,
    #[value(alias = "sierpinski")]
    Triangle,
    Dragon,
}

impl Shape {
    pub fn label(self) -> &'static str {
        match self {
            Self::Tree => "Tree",
            Self::Triangle => "Triangle",
            Self::Dragon => "Dragon",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Self::Tree => Self::Triangle,
            Self::Triangle => Self::Dragon,
            Self::Dragon => Self::Tree,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Policy {
    Continuous,
    #[value(alias = "threshold-gated")]
    Stepped,
    #[value(alias = "advance-retreat")]
    Bidirectional,
}

impl Policy {
    pub fn label(self) -> &'static str {
        match self {
            Self::Continuous => "Continuous",
            Self::Stepped => "Stepped",
            Self::Bidirectional => "Bidirectional",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Self::Continuous => Self::Stepped,
            Self::Stepped => Self::Bidirectional,
            Self::Bidirectional => Self::Continuous,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RendererMode {
    #[value(name = "half-block", alias = "halfblock", alias = "half_block", alias = "hb")]
    HalfBlock,
    #[value(alias = "hires", alias = "dots")]
    Braille,
}
