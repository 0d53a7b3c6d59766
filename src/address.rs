//! BTC wallet address input validation.
//!
//! This is a pure shape check (legacy base58 or bech32 charset and length),
//! not a checksum or existence check.

use once_cell::sync::Lazy;
use regex::Regex;

static ADDRESS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([13][a-km-zA-HJ-NP-Z1-9]{26,33}|bc1[a-z0-9]{39,59})$").unwrap()
});

/// Validate raw user input as a wallet address. A `bitcoin:` URI prefix is
/// stripped before matching. Returns the normalized address, or `None` if
/// the input does not look like an address at all.
pub fn normalize_address(input: &str) -> Option<String> {
    let trimmed = input.trim();
    let address = trimmed.strip_prefix("bitcoin:").unwrap_or(trimmed);
    if ADDRESS_RE.is_match(address) {
        Some(address.to_string())
    } else {
        None
    }
}
