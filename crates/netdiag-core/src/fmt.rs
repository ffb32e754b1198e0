//! Shared formatting helpers.

use std::time::{SystemTime, UNIX_EPOCH};

/// Share of `part` in `total`, in percent. Zero when `total` is zero.
pub fn pct(part: i64, total: i64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

/// Fixed-width percentage: `" 62.5%"`, `"100.0%"`.
pub fn format_pct(value: f64) -> String {
    format!("{:5.1}%", value)
}

/// Current wall-clock time as fractional unix seconds.
pub fn now_unix() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}
