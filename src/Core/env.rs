// Environment variable helpers used by RuntimeConfig::from_env.

use std::str::FromStr;

/// Get environment variable parsed as type T, or return default.
///
/// Unset variables and values that fail to parse both fall back to `default`.
#[inline]
pub fn env_get<T>(key: &str, default: T) -> T
where
    T: FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
