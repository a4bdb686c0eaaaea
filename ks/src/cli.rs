//! `ks` command line

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Inspect or edit the records behind a cadence data directory
#[derive(Parser, Debug)]
#[command(name = "ks", version, about, long_about = None)]
pub struct Cli {
    /// YAML config naming the store directory
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Store directory; wins over the config file
    #[arg(short, long)]
    pub store: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print a record
    Get { key: String },

    /// Overwrite a record with a raw string
    Set { key: String, value: String },

    /// Delete a record
    Rm { key: String },

    /// Print every key, one per line
    #[command(alias = "ls")]
    List,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_store_override_and_alias() {
        let cli = Cli::try_parse_from(["ks", "--store", "/tmp/s", "ls"]).unwrap();
        assert_eq!(cli.store, Some(PathBuf::from("/tmp/s")));
        assert!(matches!(cli.command, Command::List));
    }
}
