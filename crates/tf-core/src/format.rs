//! Elapsed time rendering.

/// Formats milliseconds as `HH:MM:SS`.
///
/// Hours are not wrapped at 24 and grow past two digits when needed.
pub fn format_elapsed(elapsed_ms: u64) -> String {
    let total_seconds = elapsed_ms / 1000;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}
