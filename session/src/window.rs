//! When a session starts and when it must stop.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Immutable snapshot of a session's scheduling window.
///
/// With `stop_when_done` the session runs until every planned frame is
/// acquired and `stop_at` is ignored; otherwise `stop_at` is a hard deadline
/// past which no further exposure may be started.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionWindow {
    pub start_now: bool,
    pub start_at: DateTime<Local>,
    pub stop_when_done: bool,
    pub stop_at: DateTime<Local>,
}

impl SessionWindow {
    /// Start immediately, run until every planned frame is done.
    pub fn immediate_until_done() -> Self {
        let now = Local::now();
        Self {
            start_now: true,
            start_at: now,
            stop_when_done: true,
            stop_at: now,
        }
    }

    /// True once the hard deadline has passed. Never trips in
    /// run-until-done mode.
    pub fn deadline_passed(&self, now: DateTime<Local>) -> bool {
        !self.stop_when_done && now > self.stop_at
    }

    /// Whether a frame predicted to finish at `finish` would overrun the
    /// deadline. Never trips in run-until-done mode.
    pub fn would_overrun(&self, finish: DateTime<Local>) -> bool {
        !self.stop_when_done && finish > self.stop_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_run_until_done_never_expires() {
        let window = SessionWindow::immediate_until_done();
        let far_future = Local::now() + Duration::days(365);
        assert!(!window.deadline_passed(far_future));
        assert!(!window.would_overrun(far_future));
    }

    #[test]
    fn test_deadline_trips_after_stop_at() {
        let now = Local::now();
        let window = SessionWindow {
            start_now: true,
            start_at: now,
            stop_when_done: false,
            stop_at: now + Duration::seconds(10),
        };
        assert!(!window.deadline_passed(now));
        assert!(window.deadline_passed(now + Duration::seconds(11)));
        assert!(!window.would_overrun(now + Duration::seconds(9)));
        assert!(window.would_overrun(now + Duration::seconds(20)));
    }
}
