//! Process-local crawl run state
//!
//! Everything here is ephemeral: only the frontier store is durable, and a
//! crawl resumes correctly from the store alone. The run state exists for
//! the circuit breaker, the stats line, and fatal-error propagation from
//! workers back to the dispatcher.

use crate::QuarryError;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Instant;

/// Shared mutable state for one crawl run
///
/// Owned by the coordinator and handed to workers behind an `Arc`; all
/// counters are atomic, so workers never take a lock on the hot path.
pub struct RunState {
    /// URLs successfully parsed this run
    parsed: AtomicU64,

    /// Consecutive blocked (HTTP 403) responses; any 200 resets it
    block_errors: AtomicU32,

    /// Breaker threshold: exceeding this aborts the run
    max_block_errors: u32,

    running: AtomicBool,
    started: Instant,

    /// First fatal error recorded by any worker
    fatal: Mutex<Option<QuarryError>>,
}

impl RunState {
    pub fn new(max_block_errors: u32) -> Self {
        Self {
            parsed: AtomicU64::new(0),
            block_errors: AtomicU32::new(0),
            max_block_errors,
            running: AtomicBool::new(true),
            started: Instant::now(),
            fatal: Mutex::new(None),
        }
    }

    /// Counts one successfully parsed URL
    pub fn record_parsed(&self) {
        self.parsed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn parsed(&self) -> u64 {
        self.parsed.load(Ordering::Relaxed)
    }

    /// Counts one blocked response; trips the breaker at the threshold
    ///
    /// Returns the new consecutive-block count. When it reaches the
    /// configured maximum, the fatal slot is armed and the run winds down.
    pub fn record_block(&self) -> u32 {
        let count = self.block_errors.fetch_add(1, Ordering::Relaxed) + 1;
        if count >= self.max_block_errors {
            self.record_fatal(QuarryError::Blocked { count });
        }
        count
    }

    /// Resets the consecutive-block counter (called on any 200 response)
    pub fn reset_blocks(&self) {
        self.block_errors.store(0, Ordering::Relaxed);
    }

    pub fn block_errors(&self) -> u32 {
        self.block_errors.load(Ordering::Relaxed)
    }

    /// Records a fatal error; only the first one is kept
    pub fn record_fatal(&self, err: QuarryError) {
        let mut slot = self.fatal.lock().unwrap();
        if slot.is_none() {
            *slot = Some(err);
        }
        self.running.store(false, Ordering::Relaxed);
    }

    /// Takes the fatal error out of the slot, if one was recorded
    pub fn take_fatal(&self) -> Option<QuarryError> {
        self.fatal.lock().unwrap().take()
    }

    pub fn is_fatal(&self) -> bool {
        self.fatal.lock().unwrap().is_some()
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// URLs parsed per minute since the run started
    pub fn rate_per_minute(&self) -> u64 {
        let elapsed = self.started.elapsed().as_secs_f64();
        if elapsed <= 0.0 {
            return 0;
        }
        (60.0 * self.parsed() as f64 / elapsed).round() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parsed_counter() {
        let state = RunState::new(3);
        assert_eq!(state.parsed(), 0);
        state.record_parsed();
        state.record_parsed();
        assert_eq!(state.parsed(), 2);
    }

    #[test]
    fn test_breaker_trips_at_threshold() {
        let state = RunState::new(3);
        assert_eq!(state.record_block(), 1);
        assert_eq!(state.record_block(), 2);
        assert!(!state.is_fatal());

        assert_eq!(state.record_block(), 3);
        assert!(state.is_fatal());
        assert!(matches!(
            state.take_fatal(),
            Some(QuarryError::Blocked { count: 3 })
        ));
    }

    #[test]
    fn test_reset_disarms_breaker() {
        let state = RunState::new(3);
        state.record_block();
        state.record_block();
        state.reset_blocks();
        assert_eq!(state.block_errors(), 0);

        state.record_block();
        state.record_block();
        assert!(!state.is_fatal());
    }

    #[test]
    fn test_first_fatal_wins() {
        let state = RunState::new(1);
        state.record_fatal(QuarryError::Blocked { count: 7 });
        state.record_fatal(QuarryError::NoSettings);
        assert!(matches!(
            state.take_fatal(),
            Some(QuarryError::Blocked { count: 7 })
        ));
    }

    #[test]
    fn test_stop_clears_running() {
        let state = RunState::new(1);
        assert!(state.is_running());
        state.stop();
        assert!(!state.is_running());
    }
}
