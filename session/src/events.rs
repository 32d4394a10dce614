//! One-way notifications from a running session to its caller.
//!
//! Events carry immutable payloads over a broadcast channel; the consumer
//! side owns whatever locking it needs to apply them to its own state.

use serde::{Deserialize, Serialize};

/// Terminal result of a session. Exactly one `Finished` event carries it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SessionOutcome {
    /// All planned work done, or the deadline arrived and the remaining
    /// frame sets were skipped.
    Completed,
    /// The caller cancelled; not an error.
    Cancelled,
    /// Transport, protocol, cooling, or temperature failure.
    Failed(String),
}

/// Event emitted by the session task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SessionEvent {
    /// A console line with its indent level.
    Console { message: String, level: u8 },
    /// Work on the frame set at this row of the plan has begun.
    RowStarted { row: usize },
    /// A timed wait has begun; size a progress bar for this many seconds.
    ProgressStart { max_seconds: u64 },
    /// Progress toward the most recent `ProgressStart`.
    ProgressUpdate { elapsed_seconds: u64 },
    /// The camera's autosave path, fetched during the connectivity probe.
    AutosavePath { path: String },
    /// One frame finished; `frames_complete` on the set at `row` has been
    /// incremented and can be re-read (and persisted) by the caller.
    FrameAcquired { row: usize },
    CoolerStarted,
    CoolerStopped,
    /// Periodic cooler power readout from the independent poll task.
    CoolerPower { percent: f64 },
    /// The session is over; emitted exactly once regardless of exit path.
    Finished { outcome: SessionOutcome },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_serialize_round_trip() {
        let events = vec![
            SessionEvent::Console {
                message: "Starting session".to_string(),
                level: 1,
            },
            SessionEvent::RowStarted { row: 3 },
            SessionEvent::FrameAcquired { row: 3 },
            SessionEvent::Finished {
                outcome: SessionOutcome::Completed,
            },
        ];
        for event in events {
            let json = serde_json::to_string(&event).unwrap();
            let back: SessionEvent = serde_json::from_str(&json).unwrap();
            assert_eq!(back, event);
        }
    }

    #[test]
    fn test_failed_outcome_keeps_reason() {
        let outcome = SessionOutcome::Failed("cooling target not reached".to_string());
        let json = serde_json::to_string(&outcome).unwrap();
        assert!(json.contains("cooling target not reached"));
    }
}
