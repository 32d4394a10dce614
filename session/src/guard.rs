//! Cooperative cancellation shared between the session task and its caller.

use std::sync::atomic::{AtomicBool, Ordering};

/// Thread-safe "keep running" flag for one session.
///
/// The only session state mutated from outside the session's own task. Every
/// wait loop and multi-step operation consults it between chunks; a cancelled
/// guard means "stop work", never "an error occurred". The flag starts true
/// and flips to false at most once per session.
#[derive(Debug)]
pub struct SessionGuard {
    running: AtomicBool,
}

impl SessionGuard {
    pub fn new() -> Self {
        Self {
            running: AtomicBool::new(true),
        }
    }

    /// Ask the session to stop at its next suspension point. Idempotent.
    pub fn request_cancel(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn is_cancelled(&self) -> bool {
        !self.is_running()
    }
}

impl Default for SessionGuard {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_starts_running() {
        let guard = SessionGuard::new();
        assert!(guard.is_running());
        assert!(!guard.is_cancelled());
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let guard = SessionGuard::new();
        guard.request_cancel();
        assert!(guard.is_cancelled());
        guard.request_cancel();
        assert!(guard.is_cancelled());
        assert!(!guard.is_running());
    }
}
