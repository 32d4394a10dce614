//! Download-time calibration and per-frame duration prediction.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Local};

use crate::window::SessionWindow;

/// Measured download seconds per binning value, built once per session by
/// timing a synchronous zero-exposure bias frame at each binning in the plan.
#[derive(Debug, Clone, Default)]
pub struct DownloadTimeTable {
    times: HashMap<u32, f64>,
}

impl DownloadTimeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, binning: u32) -> bool {
        self.times.contains_key(&binning)
    }

    pub fn record(&mut self, binning: u32, seconds: f64) {
        self.times.insert(binning, seconds);
    }

    /// Measured download seconds for a binning; zero if never calibrated.
    pub fn download_seconds(&self, binning: u32) -> f64 {
        self.times.get(&binning).copied().unwrap_or(0.0)
    }
}

/// Seconds to wait before the session proper begins: the distance to
/// `start_at`, reduced by the Wake-on-LAN lead when one is configured,
/// clamped at zero. Zero when starting now. A reduction below zero just
/// means starting right away and running a little late after the wake.
pub fn start_wait_seconds(
    now: DateTime<Local>,
    window: &SessionWindow,
    wake_lead_seconds: Option<f64>,
) -> f64 {
    if window.start_now {
        return 0.0;
    }
    let mut wait = (window.start_at - now).num_milliseconds() as f64 / 1000.0;
    if let Some(lead) = wake_lead_seconds {
        wait -= lead;
    }
    wait.max(0.0)
}

/// Wall-clock instant at which a frame started now would be finished,
/// including its download.
pub fn predict_frame_finish(
    now: DateTime<Local>,
    exposure_seconds: f64,
    download_seconds: f64,
) -> DateTime<Local> {
    now + Duration::milliseconds(((exposure_seconds + download_seconds) * 1000.0).round() as i64)
}

/// Format a second count the way a person would say it, e.g.
/// "2 hours, 5 minutes, 3 seconds".
pub fn casual_interval_format(seconds: f64) -> String {
    let mut remainder = seconds.round().max(0.0) as u64;
    let mut parts: Vec<String> = Vec::new();

    let hours = remainder / 3600;
    if hours > 0 {
        parts.push(format!("{hours} hour{}", plural(hours)));
        remainder %= 3600;
    }
    let minutes = remainder / 60;
    if minutes > 0 {
        parts.push(format!("{minutes} minute{}", plural(minutes)));
        remainder %= 60;
    }
    if remainder > 0 || parts.is_empty() {
        parts.push(format!("{remainder} second{}", plural(remainder)));
    }
    parts.join(", ")
}

fn plural(count: u64) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window_starting_in(seconds: i64) -> SessionWindow {
        let now = Local::now();
        SessionWindow {
            start_now: false,
            start_at: now + Duration::seconds(seconds),
            stop_when_done: true,
            stop_at: now,
        }
    }

    #[test]
    fn test_start_now_waits_nothing() {
        let window = SessionWindow::immediate_until_done();
        assert_eq!(start_wait_seconds(Local::now(), &window, None), 0.0);
        assert_eq!(start_wait_seconds(Local::now(), &window, Some(300.0)), 0.0);
    }

    #[test]
    fn test_wake_lead_reduces_wait() {
        let now = Local::now();
        let window = window_starting_in(600);
        let plain = start_wait_seconds(now, &window, None);
        let reduced = start_wait_seconds(now, &window, Some(120.0));
        assert!((plain - 600.0).abs() < 1.0);
        assert!((reduced - 480.0).abs() < 1.0);
    }

    #[test]
    fn test_wait_clamps_at_zero() {
        let now = Local::now();
        let window = window_starting_in(30);
        assert_eq!(start_wait_seconds(now, &window, Some(300.0)), 0.0);
        let past = window_starting_in(-30);
        assert_eq!(start_wait_seconds(now, &past, None), 0.0);
    }

    #[test]
    fn test_predict_frame_finish_is_monotonic() {
        let now = Local::now();
        let base = predict_frame_finish(now, 10.0, 5.0);
        assert!(predict_frame_finish(now, 11.0, 5.0) > base);
        assert!(predict_frame_finish(now, 10.0, 6.0) > base);
        // Deterministic for identical inputs.
        assert_eq!(predict_frame_finish(now, 10.0, 5.0), base);
        assert_eq!(base - now, Duration::seconds(15));
    }

    #[test]
    fn test_download_table_defaults_to_zero() {
        let mut table = DownloadTimeTable::new();
        assert!(!table.contains(2));
        assert_eq!(table.download_seconds(2), 0.0);
        table.record(2, 7.5);
        assert!(table.contains(2));
        assert_eq!(table.download_seconds(2), 7.5);
    }

    #[test]
    fn test_casual_interval_format() {
        assert_eq!(casual_interval_format(0.0), "0 seconds");
        assert_eq!(casual_interval_format(1.0), "1 second");
        assert_eq!(casual_interval_format(45.0), "45 seconds");
        assert_eq!(casual_interval_format(60.0), "1 minute");
        assert_eq!(casual_interval_format(61.0), "1 minute, 1 second");
        assert_eq!(casual_interval_format(3600.0), "1 hour");
        assert_eq!(
            casual_interval_format(7323.0),
            "2 hours, 2 minutes, 3 seconds"
        );
    }
}
