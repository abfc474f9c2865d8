//! Minefleet CLI
//!
//! Command-line interface for a running minefleet runner's control server.

mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;

#[derive(Parser)]
#[command(name = "minefleet")]
#[command(about = "Inspect and control a minefleet runner", long_about = None)]
struct Cli {
    /// Runner control server URL
    #[arg(
        long,
        env = "MINEFLEET_RUNNER_URL",
        default_value = "http://127.0.0.1:8787"
    )]
    runner_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config {
        runner_url: cli.runner_url,
    };

    handle_command(cli.command, &config).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::SlotCommands;

    #[test]
    fn test_parse_slot_pause() {
        let cli = Cli::try_parse_from([
            "minefleet",
            "--runner-url",
            "http://rig:9000",
            "slot",
            "pause",
            "2",
        ])
        .unwrap();
        assert_eq!(cli.runner_url, "http://rig:9000");
        assert!(matches!(
            cli.command,
            Commands::Slot {
                command: SlotCommands::Pause { index: 2 }
            }
        ));
    }

    #[test]
    fn test_parse_stats_json() {
        let cli = Cli::try_parse_from(["minefleet", "stats", "--json"]).unwrap();
        assert!(matches!(cli.command, Commands::Stats { json: true }));
    }

    #[test]
    fn test_slot_index_must_be_numeric() {
        assert!(Cli::try_parse_from(["minefleet", "slot", "resume", "first"]).is_err());
    }
}
