use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cfg = fractal_visualizer::config::Config::parse();
    if cfg.list_devices {
        fractal_visualizer::audio::list_input_devices()?;
        return Ok(());
    }

    fractal_visualizer::app::run(cfg)
}
