//! Hostname normalization.
//!
//! # Responsibilities
//! - Trim the raw Host header value
//! - Optionally strip a leading `www.` (case-insensitive check)
//! - Produce comparison keys (lowercase, no port) for store lookups
//!
//! # Design Decisions
//! - `normalize` preserves case; only comparison keys are lowercased
//! - Bracketed IPv6 literals keep their brackets in the key

const WWW_PREFIX: &str = "www.";

/// Normalize a raw hostname as received in the Host header.
///
/// Surrounding whitespace is trimmed. When `strip_www_prefix` is set and the
/// host begins with `www.` (in any case), those four characters are removed
/// from the original-cased string.
pub fn normalize(hostname: &str, strip_www_prefix: bool) -> String {
    let trimmed = hostname.trim();
    if strip_www_prefix
        && trimmed.len() >= WWW_PREFIX.len()
        && trimmed.is_char_boundary(WWW_PREFIX.len())
        && trimmed[..WWW_PREFIX.len()].eq_ignore_ascii_case(WWW_PREFIX)
    {
        return trimmed[WWW_PREFIX.len()..].to_string();
    }
    trimmed.to_string()
}

/// Comparison key for a hostname: lowercased with any port suffix removed.
pub fn host_key(hostname: &str) -> String {
    strip_port(hostname.trim()).to_ascii_lowercase()
}

/// Remove a trailing `:port` from a host, leaving IPv6 literals intact.
pub fn strip_port(hostname: &str) -> &str {
    if hostname.starts_with('[') {
        // [::1]:8080 → [::1]
        return match hostname.find(']') {
            Some(end) => &hostname[..=end],
            None => hostname,
        };
    }
    match hostname.rsplit_once(':') {
        Some((host, port))
            if !host.contains(':') && !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) =>
        {
            host
        }
        _ => hostname,
    }
}

/// Derive a machine identifier from a hostname or pattern.
///
/// Lowercases and replaces everything outside `[a-z0-9_]` with `_`.
pub fn machine_name(value: &str) -> String {
    value
        .trim()
        .to_ascii_lowercase()
        .chars()
        .map(|c| if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' { c } else { '_' })
        .collect()
}
