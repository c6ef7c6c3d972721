//! generate-crosstool — writes the CROSSTOOL text proto describing the host
//! and cross-compilation GCC toolchains.

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::Context;
use clap::builder::NonEmptyStringValueParser;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crosstool::{build_release, load_config, write_release_file, GeneratorConfig};

#[derive(Parser, Debug)]
#[command(
    name = "generate-crosstool",
    version,
    about = "Generate the CROSSTOOL text proto for host and cross GCC toolchains"
)]
struct Cli {
    /// Filename for the CROSSTOOL text proto to write
    #[arg(long, value_parser = NonEmptyStringValueParser::new())]
    out: String,
    /// File containing a boilerplate header, copied verbatim to the top of the output
    #[arg(long)]
    boilerplate: Option<String>,
    /// TOML file listing the targets to generate (default: built-in target set)
    #[arg(long)]
    targets: Option<PathBuf>,
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

/// Filter used when `RUST_LOG` is unset. A successful run prints nothing.
const DEFAULT_LOG_FILTER: &str = "warn";

/// Log to stderr, filtered by `RUST_LOG`. Colour only when stderr is a terminal.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .init();
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = match &cli.targets {
        Some(path) => load_config(path)
            .with_context(|| format!("loading targets from {}", path.display()))?,
        None => GeneratorConfig::default(),
    };

    let release =
        build_release(&config.release, &config.targets).context("building toolchains")?;

    let boilerplate = cli
        .boilerplate
        .as_deref()
        .filter(|p| !p.is_empty())
        .map(Path::new);
    write_release_file(&release, Path::new(&cli.out), boilerplate)?;
    Ok(())
}
