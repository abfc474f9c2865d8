//! Numeric helpers
//!
//! The compute executable takes the seed and complexity as decimal integers,
//! while the pool hands them out hex encoded. Both can be wider than 128 bits.

use num_bigint::BigUint;

/// Converts an arbitrary-width hex string (optional `0x` prefix) to decimal
///
/// Returns `None` for empty input or non-hex characters.
pub fn hex_to_decimal(hex: &str) -> Option<String> {
    let hex = hex.trim();
    let hex = hex
        .strip_prefix("0x")
        .or_else(|| hex.strip_prefix("0X"))
        .unwrap_or(hex);
    if hex.is_empty() || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }

    BigUint::parse_bytes(hex.as_bytes(), 16).map(|n| n.to_str_radix(10))
}
