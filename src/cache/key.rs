//! Cache key normalization.

/// Separator between the normalized origin and destination.
pub const KEY_SEPARATOR: char = '|';

/// Build the cache key for an origin/destination pair.
///
/// Both names are lower-cased, trimmed, and have internal whitespace runs
/// collapsed to a single space. The key is order-sensitive: swapping origin
/// and destination yields a different key.
pub fn normalize_key(from_name: &str, to_name: &str) -> String {
  format!(
    "{}{}{}",
    normalize_name(from_name),
    KEY_SEPARATOR,
    normalize_name(to_name)
  )
}

fn normalize_name(name: &str) -> String {
  name
    .split_whitespace()
    .collect::<Vec<_>>()
    .join(" ")
    .to_lowercase()
}
