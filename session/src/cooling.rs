//! Cooling regulation policy for one session.

use serde::{Deserialize, Serialize};

/// Immutable snapshot of the cooling settings a session runs under.
///
/// The retry knobs exist because the ambient temperature usually drops as
/// night falls: an early cooling attempt that misses the target may succeed
/// after regulation is cycled off, a delay passes, and it is tried again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoolingPolicy {
    pub is_regulated: bool,
    pub target_temperature: f64,
    /// Close enough: `|temperature - target| <= tolerance` counts as reached.
    pub tolerance: f64,
    pub check_interval_seconds: f64,
    /// Per-attempt budget before the target is declared unreachable.
    pub max_wait_seconds: f64,
    pub retry_count: u32,
    pub retry_delay_seconds: f64,
    /// Abort the whole session if the sensor drifts above
    /// `target + abort_threshold` during acquisition.
    pub abort_on_rise: bool,
    pub abort_threshold: f64,
    pub warm_up_when_done: bool,
    pub warm_up_seconds: f64,
}

impl CoolingPolicy {
    /// Policy for an unregulated camera; every cooling stage auto-succeeds.
    pub fn unregulated() -> Self {
        Self {
            is_regulated: false,
            target_temperature: 0.0,
            tolerance: 0.0,
            check_interval_seconds: 10.0,
            max_wait_seconds: 0.0,
            retry_count: 0,
            retry_delay_seconds: 0.0,
            abort_on_rise: false,
            abort_threshold: 0.0,
            warm_up_when_done: false,
            warm_up_seconds: 0.0,
        }
    }

    /// How many cooling attempts the policy allows in total.
    pub fn total_attempts(&self) -> u32 {
        1 + self.retry_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_attempts() {
        let mut policy = CoolingPolicy::unregulated();
        assert_eq!(policy.total_attempts(), 1);
        policy.retry_count = 2;
        assert_eq!(policy.total_attempts(), 3);
    }
}
