use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lumen_engine::ShaderProgram;

#[derive(Parser)]
#[command(name = "xtask", about = "Workspace automation for lumen")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run all checks: fmt, clippy, shaders, tests, doc
    Check,
    /// Run cargo fmt --check on all crates
    Fmt,
    /// Run clippy on all crates
    Clippy,
    /// Run all tests
    Test,
    /// Build rustdoc for the workspace
    Doc,
    /// Build the entire workspace
    Build,
    /// Compile and link the demo shaders without opening a window
    Shaders {
        /// Directory containing shaders/
        #[arg(long, default_value = "assets")]
        assets: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check => {
            run_fmt()?;
            run_clippy()?;
            run_shaders(Path::new("assets"))?;
            run_tests()?;
            run_doc()?;
        }
        Commands::Fmt => run_fmt()?,
        Commands::Clippy => run_clippy()?,
        Commands::Test => run_tests()?,
        Commands::Doc => run_doc()?,
        Commands::Build => run_build()?,
        Commands::Shaders { assets } => run_shaders(&assets)?,
    }

    Ok(())
}

fn cargo(args: &[&str], what: &str) -> Result<()> {
    let status = Command::new("cargo").args(args).status()?;
    if !status.success() {
        anyhow::bail!("{what} failed");
    }
    Ok(())
}

fn run_fmt() -> Result<()> {
    println!("==> Running cargo fmt --check");
    cargo(&["fmt", "--all", "--", "--check"], "cargo fmt check")
}

fn run_clippy() -> Result<()> {
    println!("==> Running cargo clippy");
    cargo(
        &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"],
        "cargo clippy",
    )
}

fn run_tests() -> Result<()> {
    println!("==> Running cargo test");
    cargo(&["test", "--workspace"], "cargo test")
}

fn run_doc() -> Result<()> {
    println!("==> Running cargo doc");
    cargo(&["doc", "--workspace", "--no-deps"], "cargo doc")
}

fn run_build() -> Result<()> {
    println!("==> Running cargo build");
    cargo(&["build", "--workspace"], "cargo build")
}

fn run_shaders(assets: &Path) -> Result<()> {
    println!("==> Linking shaders under {}", assets.display());
    let vertex = assets.join(lumen_scene::VERTEX_SHADER);
    let fragment = assets.join(lumen_scene::FRAGMENT_SHADER);
    let program = ShaderProgram::build(&vertex, &fragment, None)
        .with_context(|| format!("shader program in {}", assets.display()))?;
    for name in ["frame", "object"] {
        let block = program.uniform_block(name)?;
        println!(
            "    {name}: group {} binding {}, {} bytes",
            block.group(),
            block.binding(),
            block.size()
        );
    }
    Ok(())
}
