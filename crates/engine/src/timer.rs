use std::time::Duration;

/// Identifies one scheduling on a [`TimerSlot`]. Stale handles never match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerKind {
    Once,
    Repeating,
}

#[derive(Debug, Clone, Copy)]
struct PendingTimer {
    handle: TimerHandle,
    kind: TimerKind,
    interval: Duration,
    remaining: Duration,
}

/// Result of advancing a slot. `leftover` is the time that passed after the
/// last firing, for callers that chain a new timer off a one-shot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Elapsed {
    pub fires: u32,
    pub leftover: Duration,
}

impl Elapsed {
    pub fn fired(&self) -> bool {
        self.fires > 0
    }
}

/// Holds at most one pending timer. Scheduling always replaces the previous one.
#[derive(Debug, Clone, Default)]
pub struct TimerSlot {
    pending: Option<PendingTimer>,
    next_handle: u64,
}

impl TimerSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule_once(&mut self, delay: Duration) -> TimerHandle {
        self.schedule(TimerKind::Once, delay)
    }

    /// A zero interval is bumped to one nanosecond so `advance` terminates.
    pub fn schedule_repeating(&mut self, interval: Duration) -> TimerHandle {
        self.schedule(TimerKind::Repeating, interval.max(Duration::from_nanos(1)))
    }

    pub fn cancel(&mut self) -> Option<TimerHandle> {
        self.pending.take().map(|pending| pending.handle)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn handle(&self) -> Option<TimerHandle> {
        self.pending.map(|pending| pending.handle)
    }

    pub fn advance(&mut self, dt: Duration) -> Elapsed {
        let Some(pending) = self.pending.as_mut() else {
            return Elapsed::default();
        };
        if dt < pending.remaining {
            pending.remaining -= dt;
            return Elapsed::default();
        }

        let mut leftover = dt - pending.remaining;
        let kind = pending.kind;
        match kind {
            TimerKind::Once => {
                self.pending = None;
                Elapsed { fires: 1, leftover }
            }
            TimerKind::Repeating => {
                let mut fires = 1u32;
                while leftover >= pending.interval {
                    leftover -= pending.interval;
                    fires = fires.saturating_add(1);
                }
                pending.remaining = pending.interval - leftover;
                Elapsed {
                    fires,
                    leftover: Duration::ZERO,
                }
            }
        }
    }

    fn schedule(&mut self, kind: TimerKind, delay: Duration) -> TimerHandle {
        self.next_handle += 1;
        let handle = TimerHandle(self.next_handle);
        self.pending = Some(PendingTimer {
            handle,
            kind,
            interval: delay,
            remaining: delay,
        });
        handle
    }
}
