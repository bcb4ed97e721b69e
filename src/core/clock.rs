//! Shared frame clock.
//!
//! One heartbeat per display refresh, fanned out to every live subscriber in
//! registration order. Subscriptions are RAII guards: dropping one removes the
//! callback synchronously, so a subscriber can never outlive its owner.
//!
//! The clock is single-threaded (`Rc`/`RefCell`). Hosts drive it from their
//! render loop with [`FrameClock::advance`] or [`FrameClock::tick_at`].

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::Duration;

#[cfg(feature = "std")]
use crate::time::Instant;

/// What each subscriber receives on a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameTick {
    /// 1-based count of ticks delivered since the clock was created.
    pub frame: u64,
    /// Time since the previous tick (zero for the first one after a start).
    pub elapsed: Duration,
}

type Callback = Rc<RefCell<Box<dyn FnMut(&FrameTick)>>>;

struct Entry {
    key: u64,
    label: String,
    callback: Callback,
}

#[derive(Default)]
struct ClockInner {
    running: bool,
    frame: u64,
    next_key: u64,
    entries: Vec<Entry>,
    #[cfg(feature = "std")]
    last_tick: Option<Instant>,
}

impl ClockInner {
    fn remove(&mut self, key: u64) -> Option<Entry> {
        let idx = self.entries.iter().position(|e| e.key == key)?;
        Some(self.entries.remove(idx))
    }
}

#[derive(Clone, Default)]
pub struct FrameClock {
    inner: Rc<RefCell<ClockInner>>,
}

impl fmt::Debug for FrameClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("FrameClock")
            .field("running", &inner.running)
            .field("frame", &inner.frame)
            .field("subscribers", &inner.entries.len())
            .finish()
    }
}

impl FrameClock {
    /// A stopped clock with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&self) {
        self.inner.borrow_mut().running = true;
    }

    /// Stop delivering ticks. Subscribers stay registered.
    pub fn stop(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.running = false;
        #[cfg(feature = "std")]
        {
            inner.last_tick = None;
        }
    }

    pub fn is_running(&self) -> bool {
        self.inner.borrow().running
    }

    /// Nothing to do: stopped, or nobody listening.
    pub fn is_idle(&self) -> bool {
        let inner = self.inner.borrow();
        !inner.running || inner.entries.is_empty()
    }

    pub fn frame(&self) -> u64 {
        self.inner.borrow().frame
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().entries.len()
    }

    pub fn has_subscriber(&self, label: &str) -> bool {
        self.inner.borrow().entries.iter().any(|e| e.label == label)
    }

    /// Labels of live subscribers in registration order.
    pub fn subscriber_labels(&self) -> Vec<String> {
        self.inner
            .borrow()
            .entries
            .iter()
            .map(|e| e.label.clone())
            .collect()
    }

    pub fn subscribe<F>(&self, label: impl Into<String>, callback: F) -> Subscription
    where
        F: FnMut(&FrameTick) + 'static,
    {
        let mut inner = self.inner.borrow_mut();
        let key = inner.next_key;
        inner.next_key += 1;
        inner.entries.push(Entry {
            key,
            label: label.into(),
            callback: Rc::new(RefCell::new(Box::new(callback))),
        });
        Subscription {
            key,
            clock: Rc::downgrade(&self.inner),
        }
    }

    /// Deliver one tick. Returns how many subscribers ran.
    ///
    /// Subscribers may subscribe, unsubscribe or drive the clock from inside
    /// their callback: anything removed mid-tick is skipped, and a callback
    /// that is already running is not re-entered.
    pub fn advance(&self, elapsed: Duration) -> usize {
        let (tick, callbacks) = {
            let mut inner = self.inner.borrow_mut();
            if !inner.running || inner.entries.is_empty() {
                return 0;
            }
            inner.frame += 1;
            let tick = FrameTick {
                frame: inner.frame,
                elapsed,
            };
            let callbacks: Vec<(u64, Callback)> = inner
                .entries
                .iter()
                .map(|e| (e.key, Rc::clone(&e.callback)))
                .collect();
            (tick, callbacks)
        };

        let mut ran = 0;
        for (key, callback) in callbacks {
            let live = self.inner.borrow().entries.iter().any(|e| e.key == key);
            if !live {
                continue;
            }
            if let Ok(mut cb) = callback.try_borrow_mut() {
                (*cb)(&tick);
                ran += 1;
            }
        }
        ran
    }

    /// Deliver one tick timed against the previous `tick_at` call.
    #[cfg(feature = "std")]
    pub fn tick_at(&self, now: Instant) -> usize {
        let elapsed = {
            let mut inner = self.inner.borrow_mut();
            if !inner.running {
                return 0;
            }
            let elapsed = inner
                .last_tick
                .map(|prev| now.saturating_duration_since(prev))
                .unwrap_or_default();
            inner.last_tick = Some(now);
            elapsed
        };
        self.advance(elapsed)
    }
}

/// Keeps a clock callback registered for as long as it lives.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    key: u64,
    clock: Weak<RefCell<ClockInner>>,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("key", &self.key)
            .field("active", &self.is_active())
            .finish()
    }
}

impl Subscription {
    /// Still registered with a clock that still exists.
    pub fn is_active(&self) -> bool {
        self.clock
            .upgrade()
            .is_some_and(|c| c.borrow().entries.iter().any(|e| e.key == self.key))
    }

    /// Unsubscribe now. Same as dropping the guard.
    pub fn cancel(self) {}

    fn release(&mut self) {
        let Some(clock) = self.clock.upgrade() else {
            return;
        };
        // The clock holds no borrow while callbacks run. The removed callback
        // is dropped after the borrow ends, since it may own subscriptions.
        let removed = clock.borrow_mut().remove(self.key);
        drop(removed);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}
