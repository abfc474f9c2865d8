//! Stats command handler
//!
//! Renders the runner's fleet view.

use anyhow::{Context, Result};
use colored::*;
use minefleet_client::ControlClient;
use minefleet_core::domain::stats::{FleetStats, SlotState, SlotStats, format_hashrate};

use crate::config::Config;

/// Fetch and print the fleet statistics
pub async fn show_stats(config: &Config, json: bool) -> Result<()> {
    let client = ControlClient::new(&config.runner_url);
    let stats = client
        .stats()
        .await
        .with_context(|| format!("Failed to reach runner at {}", client.base_url()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        print_fleet(&stats);
    }

    Ok(())
}

fn print_fleet(stats: &FleetStats) {
    println!(
        "{} {}",
        "Total hashrate:".bold(),
        format_hashrate(stats.total_hashrate).green().bold()
    );
    println!(
        "  Shares:       {} accepted, {} rejected",
        stats.accepted_shares.to_string().green(),
        stats.rejected_shares.to_string().red()
    );
    println!("  Tasks:        {}", stats.tasks_available);
    if let Some(refreshed) = stats.last_refresh {
        println!(
            "  Refreshed:    {}",
            refreshed.format("%Y-%m-%d %H:%M:%S").to_string().dimmed()
        );
    }
    println!("  Uptime:       {}s", stats.uptime_secs);
    println!();

    if stats.slots.is_empty() {
        println!("{}", "No slots running.".yellow());
        return;
    }

    for slot in &stats.slots {
        print_slot_summary(slot);
    }
}

/// Print a slot summary
pub fn print_slot_summary(slot: &SlotStats) {
    println!(
        "  {} Slot {} {} #{} ({})",
        "▸".cyan(),
        slot.index.to_string().bold(),
        slot.model,
        slot.device_id,
        slot.backend
    );
    println!("    State:        {}", colorize_state(slot.state));
    println!(
        "    Keep-alive:   {}",
        if slot.keep_alive {
            "on".green()
        } else {
            "paused".yellow()
        }
    );
    println!("    Hashrate:     {}", format_hashrate(slot.hashrate));
    if let Some(task_id) = slot.task_id {
        println!("    Task:         {}", task_id);
    }
    if let Some(pid) = slot.pid {
        println!("    PID:          {}", pid.to_string().dimmed());
    }
    println!("    Cycles:       {}", slot.cycles);
    println!();
}

/// Colorize slot state for display
fn colorize_state(state: SlotState) -> ColoredString {
    let state_str = state.to_string();
    match state {
        SlotState::Running => state_str.green(),
        SlotState::Assigned | SlotState::Completed => state_str.cyan(),
        SlotState::KilledStale => state_str.yellow(),
        SlotState::Idle => state_str.dimmed(),
    }
}
