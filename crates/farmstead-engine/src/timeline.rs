//! Periodic process cadence and the synthetic event timeline.
//!
//! Three processes run on fixed intervals: entity updates, worker updates and
//! task-assignment passes. The [`Cadence`] keeps, per process, how much time
//! has accumulated since its last event. Feeding it an elapsed duration
//! yields a [`Timeline`]: the ordered sequence of events that fall inside
//! that duration.
//!
//! Event `k` of a process sits at `k * interval - accumulated`. Events are
//! merged in ascending time; events at the same instant follow the fixed
//! [`Process`] order. The timeline is produced lazily, so an elapsed span of
//! several days never materialises more than one pending event per process.
//!
//! All arithmetic is on integer nanoseconds, which keeps live ticks and a
//! single offline jump on exactly the same grid.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use farmstead_engine::timeline::{Cadence, Process};
//!
//! let mut cadence = Cadence::from_secs(1.0, 1.0, 2.0);
//! let events: Vec<_> = cadence.timeline(Duration::from_secs(2)).collect();
//! let order: Vec<Process> = events.iter().map(|e| e.process).collect();
//! assert_eq!(order, vec![
//!     Process::EntityUpdate, Process::WorkerUpdate,
//!     Process::EntityUpdate, Process::WorkerUpdate, Process::TaskAssignment,
//! ]);
//! cadence.advance(Duration::from_secs(2));
//! ```

use std::time::Duration;

use farmstead_state::catalog::Tunables;

const NANOS_PER_SEC: f64 = 1_000_000_000.0;

// ---------------------------------------------------------------------------
// Process
// ---------------------------------------------------------------------------

/// A periodic simulation process, in tie-break order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Process {
    EntityUpdate,
    WorkerUpdate,
    TaskAssignment,
}

impl Process {
    pub const ALL: [Process; 3] = [
        Process::EntityUpdate,
        Process::WorkerUpdate,
        Process::TaskAssignment,
    ];

    fn index(self) -> usize {
        match self {
            Process::EntityUpdate => 0,
            Process::WorkerUpdate => 1,
            Process::TaskAssignment => 2,
        }
    }
}

/// One event of the synthetic timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimelineEvent {
    /// Offset from the start of the advanced span.
    pub at: Duration,
    pub process: Process,
}

// ---------------------------------------------------------------------------
// Cadence
// ---------------------------------------------------------------------------

/// Per-process accumulators. Not persisted: a loaded game starts at zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cadence {
    intervals: [u64; 3],
    accumulated: [u64; 3],
}

fn secs_to_nanos(secs: f64) -> u64 {
    // Intervals are validated to be at least a millisecond.
    ((secs * NANOS_PER_SEC).round() as u64).max(1)
}

pub(crate) fn duration_to_nanos(d: Duration) -> u64 {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}

impl Cadence {
    /// A cadence with the given intervals in seconds.
    pub fn from_secs(entity: f64, worker: f64, assignment: f64) -> Self {
        Self {
            intervals: [
                secs_to_nanos(entity),
                secs_to_nanos(worker),
                secs_to_nanos(assignment),
            ],
            accumulated: [0; 3],
        }
    }

    pub fn from_tunables(tunables: &Tunables) -> Self {
        Self::from_secs(
            tunables.entity_interval_secs,
            tunables.worker_interval_secs,
            tunables.assignment_interval_secs,
        )
    }

    /// Fixed interval of `process`.
    pub fn interval(&self, process: Process) -> Duration {
        Duration::from_nanos(self.intervals[process.index()])
    }

    /// Time accumulated towards the next event of `process`.
    pub fn accumulated(&self, process: Process) -> Duration {
        Duration::from_nanos(self.accumulated[process.index()])
    }

    /// Forget all accumulated time.
    pub fn reset(&mut self) {
        self.accumulated = [0; 3];
    }

    /// Events that fall within the next `span`, in replay order.
    ///
    /// Does not move the cadence; call [`advance`](Self::advance) with the
    /// same span once the events have been processed.
    pub fn timeline(&self, span: Duration) -> Timeline {
        let span = duration_to_nanos(span);
        Timeline {
            span,
            intervals: self.intervals,
            next: std::array::from_fn(|i| self.intervals[i] - self.accumulated[i]),
        }
    }

    /// Consume `span` of elapsed time.
    pub fn advance(&mut self, span: Duration) {
        let span = duration_to_nanos(span);
        for (acc, interval) in self.accumulated.iter_mut().zip(self.intervals) {
            *acc = ((u128::from(*acc) + u128::from(span)) % u128::from(interval)) as u64;
        }
    }
}

// ---------------------------------------------------------------------------
// Timeline
// ---------------------------------------------------------------------------

/// Lazy k-way merge of the three processes' event grids.
#[derive(Debug, Clone)]
pub struct Timeline {
    span: u64,
    intervals: [u64; 3],
    next: [u64; 3],
}

impl Timeline {
    /// Exact number of events remaining.
    pub fn remaining(&self) -> u64 {
        (0..3)
            .map(|i| {
                if self.next[i] > self.span {
                    0
                } else {
                    (self.span - self.next[i]) / self.intervals[i] + 1
                }
            })
            .sum()
    }
}

impl Iterator for Timeline {
    type Item = TimelineEvent;

    fn next(&mut self) -> Option<TimelineEvent> {
        let mut pick: Option<usize> = None;
        for i in 0..3 {
            if self.next[i] > self.span {
                continue;
            }
            // Strict comparison keeps ties in process order.
            if pick.map_or(true, |p| self.next[i] < self.next[p]) {
                pick = Some(i);
            }
        }
        let i = pick?;
        let at = self.next[i];
        self.next[i] = at.saturating_add(self.intervals[i]);
        Some(TimelineEvent {
            at: Duration::from_nanos(at),
            process: Process::ALL[i],
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = usize::try_from(self.remaining()).unwrap_or(usize::MAX);
        (n, Some(n))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
