//! # Long-press timer
//!
//! Distinguishes a tap from a held press on keys that have a second action.
//!
//! Time is virtual: the host passes the current millisecond count to every
//! call, so the same input trace always resolves the same way. The timer is
//! armed on press and either fires once the delay has elapsed (`poll`) or is
//! cancelled by release. A fired press never also produces its tap action.

use tracing::trace;

use crate::key::{Function, Key, ModeRequest};

/// Milliseconds on the host's clock
pub type Millis = u64;

/// Identifies one armed press
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

/// Key to dispatch once a press resolves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressEvent {
    /// Released before the delay; carries the pressed key
    Tap(Key),
    /// Held past the delay; carries the long-press action
    Hold(Key),
}

impl PressEvent {
    pub fn key(&self) -> Key {
        match self {
            PressEvent::Tap(key) | PressEvent::Hold(key) => *key,
        }
    }
}

/// Second action of a key when held, if it has one
pub fn long_press_action(key: Key) -> Option<Key> {
    match key {
        Key::Function(Function::Tax) => Some(Key::EnterMode(ModeRequest::TaxRate)),
        Key::Function(Function::MemoryRecall) => Some(Key::Function(Function::MemoryClear)),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy)]
struct ArmedPress {
    handle: TimerHandle,
    key: Key,
    deadline: Millis,
}

/// Cancellable delayed action for held keys
#[derive(Debug, Clone)]
pub struct LongPressTimer {
    delay: Millis,
    armed: Option<ArmedPress>,
    /// Key whose long press already fired and is still held down
    fired: Option<Key>,
    next_handle: u64,
}

impl LongPressTimer {
    pub fn new(delay: Millis) -> Self {
        Self {
            delay,
            armed: None,
            fired: None,
            next_handle: 0,
        }
    }

    pub fn delay(&self) -> Millis {
        self.delay
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    /// Arms the timer for `key` if it has a long-press action
    ///
    /// Returns `None` for keys without one; the host dispatches those
    /// immediately. Pressing while another press is armed cancels it.
    pub fn press(&mut self, key: Key, now: Millis) -> Option<TimerHandle> {
        long_press_action(key)?;
        self.cancel();
        let handle = TimerHandle(self.next_handle);
        self.next_handle += 1;
        self.armed = Some(ArmedPress {
            handle,
            key,
            deadline: now.saturating_add(self.delay),
        });
        trace!(?key, deadline = now.saturating_add(self.delay), "long press armed");
        Some(handle)
    }

    /// Fires the armed press if its deadline has passed
    pub fn poll(&mut self, now: Millis) -> Option<PressEvent> {
        let armed = self.armed?;
        if now < armed.deadline {
            return None;
        }
        self.armed = None;
        self.fired = Some(armed.key);
        trace!(key = ?armed.key, "long press fired");
        long_press_action(armed.key).map(PressEvent::Hold)
    }

    /// Resolves the press of `key`
    ///
    /// Released early it is a tap; released late without an intervening
    /// `poll` it still resolves as a hold; already fired it resolves to
    /// nothing.
    pub fn release(&mut self, key: Key, now: Millis) -> Option<PressEvent> {
        if self.fired == Some(key) {
            self.fired = None;
            return None;
        }
        match self.armed {
            Some(armed) if armed.key == key => {
                if let Some(event) = self.poll(now) {
                    self.fired = None;
                    return Some(event);
                }
                self.armed = None;
                Some(PressEvent::Tap(key))
            }
            _ => None,
        }
    }

    /// Drops the armed press without any action (pointer left the key)
    pub fn cancel(&mut self) -> Option<TimerHandle> {
        self.fired = None;
        self.armed.take().map(|armed| armed.handle)
    }
}
