//! Duration parsing utilities.

use anyhow::Context;
use chrono::TimeDelta;

/// Parse a duration string like "30d", "12h", "500ms" or "300".
/// Supports:
/// - Plain numbers (interpreted as seconds): "300"
/// - Weeks and days: "2w", "30d"
/// - Hours, minutes and seconds: "1h", "30m", "300s"
/// - Sub-second units: "500ms", "10us", "7ns"
pub fn parse_duration(s: &str) -> anyhow::Result<TimeDelta> {
    let s = s.trim();
    if s.is_empty() {
        anyhow::bail!("Empty duration string");
    }

    // Longer suffixes first so "ms" is not read as minutes
    let units: [(&str, fn(i64) -> Option<TimeDelta>); 8] = [
        ("ms", TimeDelta::try_milliseconds),
        ("us", |n| Some(TimeDelta::microseconds(n))),
        ("ns", |n| Some(TimeDelta::nanoseconds(n))),
        ("w", TimeDelta::try_weeks),
        ("d", TimeDelta::try_days),
        ("h", TimeDelta::try_hours),
        ("m", TimeDelta::try_minutes),
        ("s", TimeDelta::try_seconds),
    ];
    for (suffix, make) in units {
        if let Some(num_str) = s.strip_suffix(suffix) {
            let value: i64 = num_str
                .trim()
                .parse()
                .with_context(|| format!("Invalid {suffix} value: {num_str}"))?;
            return make(value).with_context(|| format!("Duration out of range: {s}"));
        }
    }

    // No suffix - treat as seconds
    let secs: i64 = s
        .parse()
        .with_context(|| format!("Invalid duration value: {s}"))?;
    TimeDelta::try_seconds(secs).with_context(|| format!("Duration out of range: {s}"))
}
