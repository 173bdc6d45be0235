//! Small formatting helpers for log output.

/// Formats a byte count human-readably (e.g. `1.50 Mb`).
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn humanize_bytes(num_bytes: u64) -> String {
    const KB: f64 = 1024.0;
    let bytes = num_bytes as f64;
    if bytes < KB {
        format!("{num_bytes} bytes")
    } else if bytes < KB.powi(2) {
        format!("{:.2} Kb", bytes / KB)
    } else if bytes < KB.powi(3) {
        format!("{:.2} Mb", bytes / KB.powi(2))
    } else if bytes < KB.powi(4) {
        format!("{:.2} Gb", bytes / KB.powi(3))
    } else {
        format!("{:.2} Tb", bytes / KB.powi(4))
    }
}

/// Formats a second count as `1h 10m 30s`, omitting zero components.
///
/// Zero seconds formats as `0s` rather than an empty string.
#[must_use]
pub fn humanize_seconds(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    let mut formatted = String::new();
    if hours > 0 {
        formatted.push_str(&format!("{hours}h "));
    }
    if minutes > 0 {
        formatted.push_str(&format!("{minutes}m "));
    }
    if secs > 0 || formatted.is_empty() {
        formatted.push_str(&format!("{secs}s"));
    }
    formatted.trim_end().to_string()
}
