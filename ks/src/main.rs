use std::process::ExitCode;

use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;

use keystore::cli::{Cli, Command};
use keystore::config::Config;
use keystore::{FileStore, KeyValueStore};

fn run(cli: Cli) -> Result<ExitCode> {
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    let store_path = cli.store.unwrap_or(config.store_path);

    info!("ks: store at {}", store_path.display());
    let store = FileStore::open(&store_path)?;

    match cli.command {
        Command::Get { key } => {
            let Some(value) = store.get(&key)? else {
                eprintln!("{} {} has no value", "✗".red(), key.yellow());
                return Ok(ExitCode::FAILURE);
            };
            println!("{}", value);
        }
        Command::Set { key, value } => {
            store.set(&key, &value)?;
            println!("{} {} written", "✓".green(), key.cyan());
        }
        Command::Rm { key } => {
            store.remove(&key)?;
            println!("{} {} removed", "✓".green(), key.cyan());
        }
        Command::List => {
            let keys = store.keys()?;
            if keys.is_empty() {
                println!("{}", "(empty store)".dimmed());
            }
            keys.iter().for_each(|key| println!("{}", key));
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn main() -> Result<ExitCode> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Warn)
        .init();

    run(Cli::parse())
}
