use super::EngineState;
use crate::Cell;
use std::collections::HashSet;

pub(super) type StateObserver = Box<dyn FnMut(&EngineState)>;
pub(super) type RedrawObserver = Box<dyn FnMut(&HashSet<Cell>)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// generation, population, run state or speed changed
    State,
    /// the living set changed
    Redraw,
}

/// Handle returned when subscribing, used to unsubscribe again.
///
/// A channel holds one subscriber at a time, so a handle goes stale as soon
/// as someone else subscribes to the same channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "dropping the handle makes it impossible to unsubscribe"]
pub struct Subscription {
    channel: Channel,
    id: u64,
}
impl Subscription {
    #[inline]
    pub fn channel(&self) -> Channel {
        self.channel
    }
}

struct Slot<F> {
    id: u64,
    observer: F,
}

#[derive(Default)]
pub(super) struct Notifier {
    next_id: u64,
    state: Option<Slot<StateObserver>>,
    redraw: Option<Slot<RedrawObserver>>,
}

impl Notifier {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn subscribe_state(&mut self, observer: StateObserver) -> Subscription {
        let id = self.next_id();
        self.state = Some(Slot { id, observer });
        Subscription {
            channel: Channel::State,
            id,
        }
    }

    pub fn subscribe_redraw(&mut self, observer: RedrawObserver) -> Subscription {
        let id = self.next_id();
        self.redraw = Some(Slot { id, observer });
        Subscription {
            channel: Channel::Redraw,
            id,
        }
    }

    /// Removes the subscriber `sub` refers to. Returns false if it was
    /// already replaced or removed.
    pub fn unsubscribe(&mut self, sub: Subscription) -> bool {
        fn take_if<F>(slot: &mut Option<Slot<F>>, id: u64) -> bool {
            let current = slot.as_ref().is_some_and(|s| s.id == id);
            if current {
                *slot = None;
            }
            current
        }
        match sub.channel {
            Channel::State => take_if(&mut self.state, sub.id),
            Channel::Redraw => take_if(&mut self.redraw, sub.id),
        }
    }

    pub fn has_subscriber(&self, channel: Channel) -> bool {
        match channel {
            Channel::State => self.state.is_some(),
            Channel::Redraw => self.redraw.is_some(),
        }
    }

    pub fn state_changed(&mut self, state: &EngineState) {
        if let Some(slot) = &mut self.state {
            (slot.observer)(state);
        }
    }

    pub fn redraw_needed(&mut self, alive: &HashSet<Cell>) {
        if let Some(slot) = &mut self.redraw {
            (slot.observer)(alive);
        }
    }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("state", &self.state.as_ref().map(|s| s.id))
            .field("redraw", &self.redraw.as_ref().map(|s| s.id))
            .finish()
    }
}
