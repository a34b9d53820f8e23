//! Human-readable time formatting for transport displays

/// Format a playback position as `m:ss`.
///
/// Minutes are unbounded (a 75 minute track shows `75:00`), seconds are
/// zero-padded and fractional seconds are floored so the display never runs
/// ahead of what the listener has heard. Negative and non-finite values
/// display as `0:00`.
///
/// # Examples
///
/// ```
/// use monotrack_common::human_time::format_clock;
///
/// assert_eq!(format_clock(0.0), "0:00");
/// assert_eq!(format_clock(4.9), "0:04");
/// assert_eq!(format_clock(125.0), "2:05");
/// ```
pub fn format_clock(seconds: f64) -> String {
    if !seconds.is_finite() || seconds <= 0.0 {
        return "0:00".to_string();
    }

    let whole = seconds.floor() as u64;
    let minutes = whole / 60;
    let secs = whole % 60;
    format!("{}:{:02}", minutes, secs)
}

/// Format `position / duration` as `m:ss / m:ss`.
pub fn format_progress(position_seconds: f64, duration_seconds: f64) -> String {
    format!(
        "{} / {}",
        format_clock(position_seconds),
        format_clock(duration_seconds)
    )
}
