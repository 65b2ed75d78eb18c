use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::LevelFilter;
use scriptpack::{config::Config, orchestrator::Orchestrator, store::DirectoryStore};

#[derive(Debug, Parser)]
#[command(name = "scriptpack", version, about)]
struct Cli {
    /// Script to bundle, by name without extension. Omit to list the
    /// scripts eligible for bundling and exit without writing anything.
    script: Option<String>,

    /// Directory holding the host's flat script namespace.
    #[arg(short = 'd', long, default_value = ".")]
    directory: PathBuf,

    /// Name for the bundle output, without extension. Defaults to the
    /// script name with the configured bundle suffix appended.
    #[arg(short, long)]
    output: Option<String>,

    /// Explicit config file, bypassing project and user discovery.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// List the scripts eligible for bundling and exit.
    #[arg(long, conflicts_with = "script")]
    list: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::discover(&cli.directory, cli.config.as_deref())
        .context("failed to resolve configuration")?;
    let store = DirectoryStore::new(&cli.directory);
    let orchestrator = Orchestrator::new(&store, &config);

    match &cli.script {
        Some(script) if !cli.list => {
            let out_file = orchestrator
                .bundle_as(script, cli.output.as_deref())
                .with_context(|| format!("failed to bundle `{script}`"))?;
            println!("{out_file}");
        }
        _ => {
            for name in orchestrator
                .candidates()
                .context("failed to list bundleable scripts")?
            {
                println!("{name}");
            }
        }
    }
    Ok(())
}
