//! Wakeups for the watch loop: key actions and quit requests posted from the
//! keyboard monitor and the Ctrl+C handler.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::input::KeyAction;

#[derive(Default)]
struct Pending {
    actions: VecDeque<KeyAction>,
    quit: bool,
}

/// Mailbox the poll loop sleeps on between refreshes.
#[derive(Default)]
pub struct LoopControl {
    pending: Mutex<Pending>,
    wakeup: Condvar,
}

impl LoopControl {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Pending> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Hand an action to the loop, waking it if it is sleeping.
    ///
    /// `Quit` is sticky: once posted, every later wait returns it.
    pub fn post(&self, action: KeyAction) {
        let mut pending = self.lock();
        match action {
            KeyAction::Quit => pending.quit = true,
            other => pending.actions.push_back(other),
        }
        drop(pending);
        self.wakeup.notify_all();
    }

    pub fn quit(&self) {
        self.post(KeyAction::Quit);
    }

    pub fn is_quit(&self) -> bool {
        self.lock().quit
    }

    /// Sleep until an action arrives or `interval` passes.
    ///
    /// Returns `None` for a quiet interval. A pending quit wins over queued
    /// actions.
    pub fn next_action(&self, interval: Duration) -> Option<KeyAction> {
        let deadline = Instant::now() + interval;
        let mut pending = self.lock();
        loop {
            if pending.quit {
                return Some(KeyAction::Quit);
            }
            if let Some(action) = pending.actions.pop_front() {
                return Some(action);
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return None;
            }
            pending = match self.wakeup.wait_timeout(pending, remaining) {
                Ok((guard, _)) => guard,
                Err(poisoned) => poisoned.into_inner().0,
            };
        }
    }
}
