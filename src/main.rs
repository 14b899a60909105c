use clap::Parser;
use tracing_subscriber::EnvFilter;

mod catalog;
mod cli;
mod core;
mod dataset;
mod io;
mod utils;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    // Initialize logging based on verbosity flag
    let filter = if cli.verbose {
        EnvFilter::new("em_dataprep=debug,info")
    } else {
        EnvFilter::new("em_dataprep=warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    match cli.command {
        cli::Commands::Catalog(args) => {
            cli::catalog::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::Load(args) => {
            cli::load::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::Geometry(args) => {
            cli::geometry::run(args, cli.format, cli.verbose)?;
        }
    }

    Ok(())
}
