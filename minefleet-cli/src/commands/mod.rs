//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod kill;
mod slot;
mod stats;

pub use slot::SlotCommands;

use anyhow::Result;
use clap::Subcommand;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Show fleet hashrate and per-slot state
    Stats {
        /// Print the raw JSON document
        #[arg(long)]
        json: bool,
    },
    /// Pause or resume a slot
    Slot {
        #[command(subcommand)]
        command: SlotCommands,
    },
    /// Terminate the runner
    Kill,
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Stats { json } => stats::show_stats(config, json).await,
        Commands::Slot { command } => slot::handle_slot_command(command, config).await,
        Commands::Kill => kill::kill_runner(config).await,
    }
}
