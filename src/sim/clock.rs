/// Deferred execution: the recurring round clock and one-shot callbacks.
///
/// Neither owns a thread. The frame loop passes `now` in and receives
/// whatever has come due, so both are trivially cancellable: stopping the
/// clock clears its next deadline, and every scheduled callback carries the
/// session epoch it was scheduled under. A callback whose epoch no longer
/// matches is dropped on delivery.

use std::time::{Duration, Instant};

/// Recurring tick with a fixed period. Stopped until `start` is called.
#[derive(Clone, Debug)]
pub struct RoundClock {
    period: Duration,
    next_tick: Option<Instant>,
}

impl RoundClock {
    pub fn new(period: Duration) -> Self {
        RoundClock { period, next_tick: None }
    }

    /// (Re)arm the clock so the first tick lands one period after `now`.
    pub fn start(&mut self, now: Instant) {
        self.next_tick = Some(now + self.period);
    }

    pub fn stop(&mut self) {
        self.next_tick = None;
    }

    pub fn is_running(&self) -> bool {
        self.next_tick.is_some()
    }

    /// Number of ticks that came due up to `now`. Catches up after a stall
    /// rather than drifting.
    pub fn due(&mut self, now: Instant) -> u32 {
        let mut ticks = 0;
        while let Some(at) = self.next_tick {
            if at > now {
                break;
            }
            ticks += 1;
            self.next_tick = Some(at + self.period);
        }
        ticks
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Deferred {
    NextQuestion,
}

#[derive(Clone, Debug)]
struct Scheduled {
    due: Instant,
    epoch: u64,
    action: Deferred,
}

/// One-shot callbacks stamped with the epoch active when scheduled.
#[derive(Clone, Debug, Default)]
pub struct Scheduler {
    pending: Vec<Scheduled>,
}

impl Scheduler {
    pub fn new() -> Self {
        Scheduler { pending: Vec::new() }
    }

    pub fn schedule(&mut self, action: Deferred, due: Instant, epoch: u64) {
        self.pending.push(Scheduled { due, epoch, action });
    }

    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Remove and return every action due by `now`, in deadline order.
    /// Actions from any other epoch are discarded.
    pub fn take_due(&mut self, now: Instant, epoch: u64) -> Vec<Deferred> {
        let mut ready: Vec<Scheduled> = Vec::new();
        self.pending.retain(|s| {
            if s.due <= now {
                ready.push(s.clone());
                false
            } else {
                true
            }
        });
        ready.sort_by_key(|s| s.due);
        ready
            .into_iter()
            .filter(|s| {
                if s.epoch != epoch {
                    tracing::debug!(stale = s.epoch, current = epoch, "dropping stale callback");
                }
                s.epoch == epoch
            })
            .map(|s| s.action)
            .collect()
    }
}
