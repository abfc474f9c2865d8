//! Compute process output interpretation
//!
//! The compute executable reports only through its diagnostic stream. On
//! success its output ends with the marker line followed by the proof line:
//!
//! ```text
//! ...
//! FOUND!
//! <proof as hex>
//! ```
//!
//! The stream is split on `\n` (a trailing newline yields a final empty
//! piece), so the marker is looked for in piece `n-3` and the proof read from
//! piece `n-2`. Speed lines (`... speed: 12.5 Mhash/s`) feed the slot's
//! throughput sample while the process runs.

use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

/// Token the compute process prints right before the proof line
pub const SUCCESS_MARKER: &str = "FOUND!";

/// Hex characters of proof consumed from the proof line
pub const PROOF_HEX_LEN: usize = 246;

static SPEED_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)speed:\s*([0-9]+(?:\.[0-9]+)?)\s*([kmgt]?)hash/s")
        .expect("speed pattern is valid")
});

/// Why a proof line could not be turned into proof bytes
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProofError {
    #[error("proof line too short: {0} characters")]
    TooShort(usize),

    #[error("proof line is not valid hex ({len} characters): {reason}")]
    InvalidHex { len: usize, reason: String },
}

/// What a finished compute process reported
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MinerReport {
    /// Too little output to carry a result; a normal run without a share
    Nominal,
    /// Enough output but no success marker
    NoSolution,
    /// Success marker with a well-formed proof
    Found(Vec<u8>),
    /// Success marker but the proof line could not be decoded
    Malformed(ProofError),
}

/// Interprets the captured diagnostic stream
///
/// Pure function of its input, so evaluating the same buffer twice always
/// gives the same report.
pub fn interpret(output: &str) -> MinerReport {
    let lines: Vec<&str> = output.split('\n').collect();
    let n = lines.len();
    if n <= 3 {
        return MinerReport::Nominal;
    }

    if !lines[n - 3].contains(SUCCESS_MARKER) {
        return MinerReport::NoSolution;
    }

    match decode_proof(lines[n - 2]) {
        Ok(proof) => MinerReport::Found(proof),
        Err(e) => MinerReport::Malformed(e),
    }
}

fn decode_proof(line: &str) -> Result<Vec<u8>, ProofError> {
    if line.len() < PROOF_HEX_LEN {
        return Err(ProofError::TooShort(line.len()));
    }

    let hex_part = line.get(..PROOF_HEX_LEN).ok_or_else(|| ProofError::InvalidHex {
        len: line.len(),
        reason: "non-ASCII proof line".to_string(),
    })?;

    hex::decode(hex_part).map_err(|e| ProofError::InvalidHex {
        len: line.len(),
        reason: e.to_string(),
    })
}

/// Extracts a throughput sample in hashes per second from one output line
pub fn parse_speed(line: &str) -> Option<u64> {
    let caps = SPEED_LINE.captures(line)?;
    let value: f64 = caps.get(1)?.as_str().parse().ok()?;
    let scale = match caps.get(2).map(|m| m.as_str().to_ascii_lowercase()).as_deref() {
        Some("k") => 1e3,
        Some("m") => 1e6,
        Some("g") => 1e9,
        Some("t") => 1e12,
        _ => 1.0,
    };
    Some((value * scale).round() as u64)
}

#[cfg(test)]
pub(crate) fn sample_proof_hex() -> String {
    "ab".repeat(PROOF_HEX_LEN / 2)
}
