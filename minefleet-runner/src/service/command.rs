//! Compute process command line

use minefleet_core::domain::device::DeviceDescriptor;
use minefleet_core::domain::task::Task;
use minefleet_core::numeric::hex_to_decimal;
use std::path::PathBuf;
use thiserror::Error;

use crate::config::Config;

/// Launch parameters shared by every cycle
#[derive(Debug, Clone)]
pub struct MinerSettings {
    /// Pool wallet address the proof is mined for
    pub pool_address: String,
    pub boost_factor: u32,
    pub timeout_secs: u32,
    pub iterations: String,
}

impl MinerSettings {
    pub fn from_config(config: &Config, pool_address: String) -> Self {
        Self {
            pool_address,
            boost_factor: config.boost_factor,
            timeout_secs: config.miner_timeout,
            iterations: config.iterations.clone(),
        }
    }
}

/// A task field that cannot be handed to the compute process
#[derive(Debug, Error)]
#[error("task {task_id}: {field} is not a hex number: {value:?}")]
pub struct TaskFormatError {
    pub task_id: i64,
    pub field: &'static str,
    pub value: String,
}

/// Fully resolved compute process invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinerCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl MinerCommand {
    /// Builds `-g<dev> -p<plat> -F<boost> -t<timeout> <pool> <seed> <complexity> <iterations>`
    ///
    /// Seed and complexity are converted from hex to decimal.
    pub fn build(
        device: &DeviceDescriptor,
        task: &Task,
        settings: &MinerSettings,
    ) -> Result<Self, TaskFormatError> {
        let seed = hex_to_decimal(&task.seed).ok_or_else(|| TaskFormatError {
            task_id: task.id,
            field: "seed",
            value: task.seed.clone(),
        })?;
        let complexity = hex_to_decimal(&task.complexity).ok_or_else(|| TaskFormatError {
            task_id: task.id,
            field: "complexity",
            value: task.complexity.clone(),
        })?;

        Ok(Self {
            program: device.executable_path.clone(),
            args: vec![
                format!("-g{}", device.device_id),
                format!("-p{}", device.platform_id),
                format!("-F{}", settings.boost_factor),
                format!("-t{}", settings.timeout_secs),
                settings.pool_address.clone(),
                seed,
                complexity,
                settings.iterations.clone(),
            ],
        })
    }

    /// Command line as a single string, for logs
    pub fn display(&self) -> String {
        let mut line = self.program.display().to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

#[cfg(test)]
pub(crate) fn test_settings() -> MinerSettings {
    MinerSettings {
        pool_address: "EQpool".to_string(),
        boost_factor: 16,
        timeout_secs: 5,
        iterations: "1000".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::test_task;
    use crate::slot::test_device;

    #[test]
    fn test_build_arguments() {
        let mut task = test_task(7, 100);
        task.seed = "ff".to_string();
        task.complexity = "0x0100".to_string();

        let command = MinerCommand::build(&test_device(), &task, &test_settings()).unwrap();
        assert_eq!(command.program, PathBuf::from("/bin/true"));
        assert_eq!(
            command.args,
            vec!["-g1", "-p0", "-F16", "-t5", "EQpool", "255", "256", "1000"]
        );
        assert!(command.display().starts_with("/bin/true -g1 -p0"));
    }

    #[test]
    fn test_invalid_seed_is_rejected() {
        let mut task = test_task(9, 100);
        task.seed = "not-hex".to_string();

        let err = MinerCommand::build(&test_device(), &task, &test_settings()).unwrap_err();
        assert_eq!(err.task_id, 9);
        assert_eq!(err.field, "seed");
    }
}
