//! Frame scheduling seam.
//!
//! The player never talks to a display loop directly. It asks its scheduler
//! for one more frame after each tick while playing and cancels when playback
//! stops. Hosts wire this to their refresh callback; tests use
//! [`ManualScheduler`] and deliver frames by hand.

/// Requests animation frames from the host.
///
/// At most one frame is outstanding at a time. `cancel` must be idempotent
/// and must drop any frame already requested.
pub trait FrameScheduler {
    /// Request a single frame.
    fn schedule(&mut self);

    /// Drop the outstanding frame, if any.
    fn cancel(&mut self);
}

/// Scheduler that records requests and lets the caller deliver them.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ManualScheduler {
    pending: bool,
    scheduled: u64,
    cancelled: u64,
}

impl ManualScheduler {
    /// Whether a frame is waiting to be delivered.
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Consume the outstanding frame. Returns false if none was requested.
    pub fn take_pending(&mut self) -> bool {
        std::mem::take(&mut self.pending)
    }

    /// Total number of frame requests.
    pub fn scheduled_count(&self) -> u64 {
        self.scheduled
    }

    /// Total number of cancel calls.
    pub fn cancel_count(&self) -> u64 {
        self.cancelled
    }
}

impl FrameScheduler for ManualScheduler {
    fn schedule(&mut self) {
        self.pending = true;
        self.scheduled += 1;
    }

    fn cancel(&mut self) {
        self.pending = false;
        self.cancelled += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_and_take() {
        let mut scheduler = ManualScheduler::default();
        assert!(!scheduler.take_pending());

        scheduler.schedule();
        assert!(scheduler.is_pending());
        assert!(scheduler.take_pending());
        assert!(!scheduler.is_pending());
        assert_eq!(scheduler.scheduled_count(), 1);
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let mut scheduler = ManualScheduler::default();
        scheduler.schedule();
        scheduler.cancel();
        scheduler.cancel();
        assert!(!scheduler.is_pending());
        assert_eq!(scheduler.cancel_count(), 2);
    }
}
