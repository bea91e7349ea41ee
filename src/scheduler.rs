//! Round-robin scheduler.
//!
//! Owns the roster and the cursor into it. Each attempt visits
//! `roster[cursor]`, then the cursor advances by one modulo the roster length
//! whatever the outcome, then the loop sleeps for the pacing interval. There is
//! no reordering and no skipping of cameras that keep failing.

use std::time::Duration;

use crate::pipeline::AttemptOutcome;
use crate::roster::Roster;
use crate::CameraId;

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(2);

/// Anything that can run one attempt for a camera.
pub trait CameraProcessor {
    fn process(&mut self, camera_id: &CameraId) -> AttemptOutcome;
}

impl<F> CameraProcessor for F
where
    F: FnMut(&CameraId) -> AttemptOutcome,
{
    fn process(&mut self, camera_id: &CameraId) -> AttemptOutcome {
        self(camera_id)
    }
}

/// Counters since process start.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub attempts: u64,
    pub completed: u64,
    pub failed: u64,
    /// Number of times the cursor wrapped back to the first camera.
    pub passes: u64,
}

pub struct Scheduler {
    roster: Roster,
    cursor: usize,
    interval: Duration,
    stats: SchedulerStats,
}

impl Scheduler {
    pub fn new(roster: Roster, interval: Duration) -> Self {
        Self {
            roster,
            cursor: 0,
            interval,
            stats: SchedulerStats::default(),
        }
    }

    /// Current cursor; `None` when the roster is empty.
    pub fn cursor(&self) -> Option<usize> {
        if self.roster.is_empty() {
            None
        } else {
            Some(self.cursor)
        }
    }

    /// Camera the next attempt will visit.
    pub fn current(&self) -> Option<&CameraId> {
        self.roster.get(self.cursor)
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn stats(&self) -> SchedulerStats {
        self.stats
    }

    /// Run one attempt and advance the cursor. Does not sleep.
    ///
    /// Returns `None` without calling `processor` when the roster is empty.
    pub fn step<P: CameraProcessor + ?Sized>(&mut self, processor: &mut P) -> Option<AttemptOutcome> {
        let camera_id = self.roster.get(self.cursor)?.clone();
        log::info!("processing camera {}...", camera_id);

        let outcome = processor.process(&camera_id);

        self.stats.attempts += 1;
        if outcome.is_completed() {
            self.stats.completed += 1;
        } else {
            self.stats.failed += 1;
        }

        self.cursor = (self.cursor + 1) % self.roster.len();
        if self.cursor == 0 {
            self.stats.passes += 1;
            log::info!(
                "roster pass {} complete: cameras={} attempts={} completed={} failed={}",
                self.stats.passes,
                self.roster.len(),
                self.stats.attempts,
                self.stats.completed,
                self.stats.failed
            );
        }
        Some(outcome)
    }

    /// Poll forever. Returns only when the roster is empty.
    pub fn run<P: CameraProcessor + ?Sized>(&mut self, processor: &mut P) {
        if self.roster.is_empty() {
            log::warn!("no camera ids available to process; exiting");
            return;
        }
        loop {
            self.step(processor);
            self.pace();
        }
    }

    /// Run `attempts` attempts, pacing between consecutive ones. Returns the
    /// number of attempts made (zero for an empty roster).
    pub fn run_cycles<P: CameraProcessor + ?Sized>(
        &mut self,
        processor: &mut P,
        attempts: usize,
    ) -> usize {
        if self.roster.is_empty() {
            log::warn!("no camera ids available to process; exiting");
            return 0;
        }
        for done in 0..attempts {
            if done > 0 {
                self.pace();
            }
            self.step(processor);
        }
        attempts
    }

    fn pace(&self) {
        if !self.interval.is_zero() {
            std::thread::sleep(self.interval);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(_: &CameraId) -> AttemptOutcome {
        AttemptOutcome::Completed {
            result: serde_json::Value::Null,
        }
    }

    #[test]
    fn empty_roster_has_no_cursor() {
        let scheduler = Scheduler::new(Roster::default(), Duration::ZERO);
        assert_eq!(scheduler.cursor(), None);
        assert_eq!(scheduler.current(), None);
    }

    #[test]
    fn cursor_wraps_and_counts_passes() {
        let mut scheduler = Scheduler::new(["a", "b"].into_iter().collect(), Duration::ZERO);
        let mut processor = ok;
        scheduler.step(&mut processor);
        assert_eq!(scheduler.cursor(), Some(1));
        scheduler.step(&mut processor);
        assert_eq!(scheduler.cursor(), Some(0));
        assert_eq!(scheduler.stats().passes, 1);
        assert_eq!(scheduler.stats().completed, 2);
    }

    #[test]
    fn failures_are_counted_but_still_advance() {
        let mut scheduler = Scheduler::new(["a", "b", "c"].into_iter().collect(), Duration::ZERO);
        let mut failing = |_: &CameraId| AttemptOutcome::Failed {
            reason: "boom".to_string(),
        };
        scheduler.step(&mut failing);
        assert_eq!(scheduler.current().map(CameraId::as_str), Some("b"));
        assert_eq!(scheduler.stats().failed, 1);
    }
}
