use std::time::{Duration, Instant};

/// A periodic deadline.
///
/// The ticker never fires on its own: the owner asks it with [`Ticker::fire`]
/// whether a tick is due. Cancelling is dropping the ticker, so once it is
/// gone no pending tick can be observed.
#[derive(Debug, Clone)]
pub struct Ticker {
    interval: Duration,
    deadline: Instant,
}

impl Ticker {
    /// Creates a ticker whose first tick is due one `interval` after `now`.
    pub fn new(interval: Duration, now: Instant) -> Self {
        Self {
            interval,
            deadline: now + interval,
        }
    }

    #[inline]
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Returns whether a tick is due at `now`, scheduling the next one if so.
    ///
    /// At most one tick is reported per call. If the host fell behind by more
    /// than one interval the missed ticks are dropped instead of replayed.
    pub fn fire(&mut self, now: Instant) -> bool {
        if now < self.deadline {
            return false;
        }
        let next = self.deadline + self.interval;
        self.deadline = if next <= now { now + self.interval } else { next };
        true
    }
}
