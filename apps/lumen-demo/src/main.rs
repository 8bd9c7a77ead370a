use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use lumen_engine::EngineConfig;
use lumen_scene::{Demo, DemoSettings};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lumen-demo", about = "Multiple lighting demo")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Window width in pixels
    #[arg(long, default_value_t = 800)]
    width: u32,

    /// Window height in pixels
    #[arg(long, default_value_t = 600)]
    height: u32,

    /// Wait for vertical sync when presenting
    #[arg(long)]
    vsync: bool,

    /// Borderless fullscreen on the primary monitor
    #[arg(long)]
    fullscreen: bool,

    /// Directory containing shaders/ and textures/
    #[arg(long, default_value = "assets")]
    assets: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = EngineConfig {
        title: "Multiple Lighting Demo".into(),
        width: cli.width,
        height: cli.height,
        vsync: cli.vsync,
        fullscreen: cli.fullscreen,
    };
    let demo = Demo::new(DemoSettings {
        assets_dir: cli.assets,
        ..Default::default()
    });

    if let Err(e) = lumen_engine::start(config, demo) {
        let e = anyhow::Error::from(e);
        tracing::error!("{e:#}");
        std::process::exit(1);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn engine_errors_report_their_cause_chain() {
        let err = anyhow::Error::from(lumen_engine::EngineError::from(
            lumen_engine::ShaderError::Read {
                stage: lumen_engine::Stage::Fragment,
                path: PathBuf::from("assets/shaders/missing.wgsl"),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
            },
        ));
        assert_eq!(
            format!("{err:#}"),
            "failed to read fragment shader assets/shaders/missing.wgsl: not found"
        );
    }

    #[test]
    fn defaults_match_the_demo_window() {
        let cli = Cli::parse_from(["lumen-demo"]);
        assert_eq!((cli.width, cli.height), (800, 600));
        assert!(!cli.vsync && !cli.fullscreen);
        assert_eq!(cli.assets, PathBuf::from("assets"));
    }
}
