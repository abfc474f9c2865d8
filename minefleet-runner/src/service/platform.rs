//! Supported platform check
//!
//! Compute executables are only shipped for a few OS and architecture
//! pairs; anything else cannot mine.

use anyhow::{Result, bail};

const SUPPORTED: [(&str, &str); 3] = [
    ("linux", "x86_64"),
    ("windows", "x86_64"),
    ("macos", "aarch64"),
];

/// Fails unless `(os, arch)` has compute executables
pub fn check_supported(os: &str, arch: &str) -> Result<()> {
    if SUPPORTED.iter().any(|(o, a)| *o == os && *a == arch) {
        return Ok(());
    }
    bail!("Unsupported platform {}/{}", os, arch)
}

/// Checks the platform this binary was built for
pub fn check_current() -> Result<()> {
    check_supported(std::env::consts::OS, std::env::consts::ARCH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_platforms() {
        assert!(check_supported("linux", "x86_64").is_ok());
        assert!(check_supported("windows", "x86_64").is_ok());
        assert!(check_supported("macos", "aarch64").is_ok());
    }

    #[test]
    fn test_unsupported_platforms() {
        assert!(check_supported("linux", "aarch64").is_err());
        assert!(check_supported("macos", "x86_64").is_err());
        let err = check_supported("freebsd", "x86_64").unwrap_err();
        assert!(err.to_string().contains("freebsd/x86_64"));
    }
}
