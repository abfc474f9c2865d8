//! Kill command handler

use anyhow::Result;
use colored::*;
use minefleet_client::{ClientError, ControlClient};

use crate::config::Config;

/// Ask the runner to terminate
pub async fn kill_runner(config: &Config) -> Result<()> {
    let client = ControlClient::new(&config.runner_url);

    match client.kill().await {
        Ok(()) => {
            println!("{}", "Runner is shutting down.".green());
            Ok(())
        }
        Err(ClientError::ApiError { status: 403, .. }) => {
            println!(
                "{}",
                "Runner does not accept kill requests (HANDLE_KILL is off).".yellow()
            );
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
