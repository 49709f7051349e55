use anyhow::{Context, Result};
use biocontrol::manager::Manager;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(version, about)]
struct CLI {
    #[arg(long)]
    sim_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    Simulate {
        /// Simulate the populations missing from the last Bayes evaluation.
        #[arg(long)]
        missing: bool,
    },

    Bayes,

    Show {
        #[arg(long)]
        log: PathBuf,

        #[arg(long, value_delimiter = ',', required = true)]
        columns: Vec<String>,
    },

    Clean,
}

fn main() {
    env_logger::Builder::new()
        .format_timestamp_millis()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    if let Err(error) = run_cli() {
        log::error!("{error:#?}");
        std::process::exit(1);
    }
}

fn run_cli() -> Result<()> {
    let args = CLI::parse();
    log::info!("{args:#?}");

    let mgr = Manager::new(args.sim_dir).context("failed to construct mgr")?;

    match args.command {
        Command::Simulate { missing } => mgr.simulate(missing)?,
        Command::Bayes => mgr.evaluate_bayes()?,
        Command::Show { log, columns } => mgr.show(log, &columns)?,
        Command::Clean => mgr.clean()?,
    }

    Ok(())
}
