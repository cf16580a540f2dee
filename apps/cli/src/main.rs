use anyhow::Result;
use clap::Parser;
use model::Series;
use paddock_cli::config::{self, Overrides};
use paddock_cli::pipeline;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "paddock")]
#[command(about = "Normalizes raw race results and derives per-entrant features")]
#[command(version)]
struct Args {
    /// TOML config file
    #[arg(short, long, env = "PADDOCK_CONFIG")]
    config: Option<PathBuf>,

    /// f1, f2 or f3
    #[arg(short, long, value_parser = config::parse_series)]
    series: Option<Series>,

    /// Raw result archive
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Section headers for unlabelled tables
    #[arg(long)]
    headers: Option<PathBuf>,

    #[arg(short, long)]
    output_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let cfg = config::load(args.config.as_deref())?.with_overrides(Overrides {
        series: args.series,
        input: args.input,
        headers: args.headers,
        output_dir: args.output_dir,
    });

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.log_level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    pipeline::run(&cfg)?;
    Ok(())
}
