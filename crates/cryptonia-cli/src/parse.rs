//! Value parsers shared by the subcommands.

use cryptonia_core::{CredentialId, Timestamp, SECONDS_PER_DAY};

/// Parse a credential id. Ids start at 1.
pub fn credential_id(s: &str) -> Result<CredentialId, String> {
    let raw: u64 = s
        .trim()
        .parse()
        .map_err(|_| format!("not a credential id: {s:?}"))?;
    CredentialId::new(raw).ok_or_else(|| "credential ids start at 1".to_string())
}

/// Parse an instant: epoch seconds or RFC 3339.
pub fn timestamp(s: &str) -> Result<Timestamp, String> {
    Timestamp::parse(s).map_err(|e| e.to_string())
}

/// Parse a signed number of seconds with an optional unit suffix
/// (`s`, `m`, `h`, `d`, `w`).
///
/// Sign is preserved so the lifecycle service can reject negative values
/// with its own error.
pub fn seconds(s: &str) -> Result<i64, String> {
    let s = s.trim();
    let (digits, unit) = match s.char_indices().last() {
        Some((i, c)) if c.is_ascii_alphabetic() => (&s[..i], c),
        _ => (s, 's'),
    };
    let multiplier = match unit {
        's' => 1,
        'm' => 60,
        'h' => 60 * 60,
        'd' => SECONDS_PER_DAY,
        'w' => 7 * SECONDS_PER_DAY,
        other => return Err(format!("unknown duration unit {other:?} in {s:?}")),
    };
    let value: i64 = digits
        .parse()
        .map_err(|_| format!("not a duration: {s:?}"))?;
    value
        .checked_mul(multiplier)
        .ok_or_else(|| format!("duration out of range: {s:?}"))
}
