//! Runner configuration
//!
//! Defines all configurable parameters for the runner: pool connection,
//! compute executable locations and tuning, loop intervals, and the
//! optional stats surfaces.

use std::path::PathBuf;
use std::time::Duration;

/// Default pool API endpoint
pub const DEFAULT_POOL_URL: &str = "https://ninja.tonlens.com";

/// Runner configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Pool access token
    pub pool_token: String,

    /// Pool API base URL
    pub pool_url: String,

    /// Directory holding the compute executables
    pub miner_dir: PathBuf,

    /// CUDA compute executable file name, if this platform has one
    pub cuda_executable: Option<String>,

    /// OpenCL compute executable file name, if this platform has one
    pub opencl_executable: Option<String>,

    /// Boost factor passed to the compute process (`-F`)
    pub boost_factor: u32,

    /// Compute process timeout in seconds (`-t`)
    pub miner_timeout: u32,

    /// Iteration count passed to the compute process
    pub iterations: String,

    /// How often the task pool is refreshed from the pool API
    pub refresh_interval: Duration,

    /// How often a running cycle checks whether its task went stale
    pub stale_check_interval: Duration,

    /// How often slot throughput is sampled
    pub hashrate_interval: Duration,

    /// JSON stats file rewritten on every hashrate sample
    pub stats_file: Option<PathBuf>,

    /// Run the HTTP stats/control server
    pub serve_stats: bool,

    /// Bind address of the stats/control server
    pub stats_bind_addr: String,

    /// Allow `/kill` to terminate the runner
    pub handle_kill: bool,
}

impl Config {
    /// Creates a new configuration with defaults
    pub fn new(pool_token: String) -> Self {
        let (cuda_executable, opencl_executable) = default_executables(std::env::consts::OS);
        Self {
            pool_token,
            pool_url: DEFAULT_POOL_URL.to_string(),
            miner_dir: PathBuf::from("miner"),
            cuda_executable,
            opencl_executable,
            boost_factor: 64,
            miner_timeout: 5,
            iterations: "100000000000".to_string(),
            refresh_interval: Duration::from_secs(1),
            stale_check_interval: Duration::from_millis(64),
            hashrate_interval: Duration::from_secs(1),
            stats_file: None,
            serve_stats: false,
            stats_bind_addr: "127.0.0.1:8787".to_string(),
            handle_kill: false,
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - POOL_ID (required)
    /// - POOL_URL (optional, default: https://ninja.tonlens.com)
    /// - MINER_DIR (optional, default: ./miner)
    /// - MINER_CUDA_EXEC / MINER_OPENCL_EXEC (optional, empty disables)
    /// - BOOST_FACTOR (optional, default: 64)
    /// - MINER_TIMEOUT (optional, seconds, default: 5)
    /// - ITERATIONS (optional, default: 100000000000)
    /// - REFRESH_INTERVAL_MS (optional, default: 1000)
    /// - STALE_CHECK_INTERVAL_MS (optional, default: 64)
    /// - HASHRATE_INTERVAL_MS (optional, default: 1000)
    /// - STATS_FILE (optional)
    /// - SERVE_STATS, HANDLE_KILL (optional, default: false)
    /// - STATS_BIND_ADDR (optional, default: 127.0.0.1:8787)
    pub fn from_env() -> anyhow::Result<Self> {
        let pool_token = std::env::var("POOL_ID")
            .map_err(|_| anyhow::anyhow!("POOL_ID environment variable not set"))?;

        let mut config = Self::new(pool_token);

        if let Ok(url) = std::env::var("POOL_URL") {
            config.pool_url = url;
        }

        if let Ok(dir) = std::env::var("MINER_DIR") {
            config.miner_dir = PathBuf::from(dir);
        }

        if let Ok(name) = std::env::var("MINER_CUDA_EXEC") {
            config.cuda_executable = non_empty(name);
        }

        if let Ok(name) = std::env::var("MINER_OPENCL_EXEC") {
            config.opencl_executable = non_empty(name);
        }

        config.boost_factor = env_parse("BOOST_FACTOR").unwrap_or(config.boost_factor);
        config.miner_timeout = env_parse("MINER_TIMEOUT").unwrap_or(config.miner_timeout);

        if let Ok(iterations) = std::env::var("ITERATIONS") {
            config.iterations = iterations;
        }

        config.refresh_interval = env_parse("REFRESH_INTERVAL_MS")
            .map(Duration::from_millis)
            .unwrap_or(config.refresh_interval);

        config.stale_check_interval = env_parse("STALE_CHECK_INTERVAL_MS")
            .map(Duration::from_millis)
            .unwrap_or(config.stale_check_interval);

        config.hashrate_interval = env_parse("HASHRATE_INTERVAL_MS")
            .map(Duration::from_millis)
            .unwrap_or(config.hashrate_interval);

        config.stats_file = std::env::var("STATS_FILE")
            .ok()
            .and_then(non_empty)
            .map(PathBuf::from);

        config.serve_stats = env_flag("SERVE_STATS");
        config.handle_kill = env_flag("HANDLE_KILL");

        if let Ok(addr) = std::env::var("STATS_BIND_ADDR") {
            config.stats_bind_addr = addr;
        }

        Ok(config)
    }

    /// Full paths of the configured compute executables
    pub fn cuda_path(&self) -> Option<PathBuf> {
        self.cuda_executable
            .as_ref()
            .map(|name| self.miner_dir.join(name))
    }

    pub fn opencl_path(&self) -> Option<PathBuf> {
        self.opencl_executable
            .as_ref()
            .map(|name| self.miner_dir.join(name))
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.pool_token.is_empty() {
            anyhow::bail!("pool token (POOL_ID) cannot be empty");
        }

        if !self.pool_url.starts_with("http://") && !self.pool_url.starts_with("https://") {
            anyhow::bail!("pool_url must start with http:// or https://");
        }

        if self.cuda_executable.is_none() && self.opencl_executable.is_none() {
            anyhow::bail!("at least one compute executable must be configured");
        }

        if self.iterations.is_empty() || !self.iterations.bytes().all(|b| b.is_ascii_digit()) {
            anyhow::bail!("iterations must be a decimal integer");
        }

        if self.refresh_interval.is_zero() {
            anyhow::bail!("refresh_interval must be greater than 0");
        }

        if self.stale_check_interval.is_zero() {
            anyhow::bail!("stale_check_interval must be greater than 0");
        }

        if self.hashrate_interval.is_zero() {
            anyhow::bail!("hashrate_interval must be greater than 0");
        }

        Ok(())
    }
}

/// Compute executable names shipped for each operating system
fn default_executables(os: &str) -> (Option<String>, Option<String>) {
    match os {
        "windows" => (
            Some("pow-miner-cuda.exe".to_string()),
            Some("pow-miner-opencl.exe".to_string()),
        ),
        "macos" => (None, Some("pow-miner-opencl".to_string())),
        _ => (
            Some("pow-miner-cuda".to_string()),
            Some("pow-miner-opencl".to_string()),
        ),
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.trim().parse().ok())
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| parse_flag(&v))
        .unwrap_or(false)
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::new("token".to_string());
        assert_eq!(config.refresh_interval, Duration::from_secs(1));
        assert_eq!(config.stale_check_interval, Duration::from_millis(64));
        assert_eq!(config.boost_factor, 64);
        assert!(!config.serve_stats);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::new("token".to_string());

        config.pool_token = String::new();
        assert!(config.validate().is_err());
        config.pool_token = "token".to_string();

        config.pool_url = "not-a-url".to_string();
        assert!(config.validate().is_err());
        config.pool_url = DEFAULT_POOL_URL.to_string();

        config.iterations = "1e9".to_string();
        assert!(config.validate().is_err());
        config.iterations = "1000".to_string();

        config.stale_check_interval = Duration::ZERO;
        assert!(config.validate().is_err());
        config.stale_check_interval = Duration::from_millis(10);

        config.cuda_executable = None;
        config.opencl_executable = None;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_executable_paths() {
        let mut config = Config::new("token".to_string());
        config.miner_dir = PathBuf::from("/opt/miner");
        config.cuda_executable = Some("cuda-bin".to_string());
        config.opencl_executable = None;

        assert_eq!(config.cuda_path(), Some(PathBuf::from("/opt/miner/cuda-bin")));
        assert_eq!(config.opencl_path(), None);
    }

    #[test]
    fn test_default_executables() {
        assert_eq!(default_executables("macos").0, None);
        assert_eq!(
            default_executables("windows").1.as_deref(),
            Some("pow-miner-opencl.exe")
        );
        assert!(default_executables("linux").0.is_some());
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("true"));
        assert!(parse_flag(" 1 "));
        assert!(parse_flag("YES"));
        assert!(!parse_flag("0"));
        assert!(!parse_flag(""));
    }
}
