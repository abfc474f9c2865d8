//! Slot command handlers

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use minefleet_client::ControlClient;

use crate::commands::stats::print_slot_summary;
use crate::config::Config;

/// Slot subcommands
#[derive(Subcommand)]
pub enum SlotCommands {
    /// Stop the slot from drawing new tasks after its current cycle
    Pause {
        /// Slot index as shown by `stats`
        index: usize,
    },
    /// Let the slot draw tasks again
    Resume {
        /// Slot index as shown by `stats`
        index: usize,
    },
}

/// Handle slot commands
pub async fn handle_slot_command(command: SlotCommands, config: &Config) -> Result<()> {
    let client = ControlClient::new(&config.runner_url);

    let slot = match command {
        SlotCommands::Pause { index } => client
            .pause_slot(index)
            .await
            .with_context(|| format!("Failed to pause slot {}", index))?,
        SlotCommands::Resume { index } => client
            .resume_slot(index)
            .await
            .with_context(|| format!("Failed to resume slot {}", index))?,
    };

    let verb = if slot.keep_alive { "resumed" } else { "paused" };
    println!("{}", format!("Slot {} {}", slot.index, verb).green().bold());
    println!();
    print_slot_summary(&slot);

    Ok(())
}
