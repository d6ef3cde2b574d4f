use std::hint::spin_loop;
use std::sync::atomic::{AtomicU8, Ordering};

const UNINITIALIZED: u8 = 0;
const IN_PROGRESS: u8 = 1;
const SUCCEEDED: u8 = 2;
const FAILED: u8 = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InitState {
    Uninitialized,
    InProgress,
    Succeeded,
    Failed,
}

impl InitState {
    fn from_raw(raw: u8) -> Self {
        match raw {
            UNINITIALIZED => Self::Uninitialized,
            IN_PROGRESS => Self::InProgress,
            SUCCEEDED => Self::Succeeded,
            _ => Self::Failed,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

/// Runs an initialization exactly once, even under concurrent first use.
///
/// The first caller to arrive runs the initializer, everyone arriving
/// meanwhile spins until it publishes the outcome. The outcome is final:
/// a failed initialization is never retried.
pub struct InitGuard(AtomicU8);

impl InitGuard {
    pub const fn new() -> Self {
        Self(AtomicU8::new(UNINITIALIZED))
    }

    pub fn state(&self) -> InitState {
        InitState::from_raw(self.0.load(Ordering::Acquire))
    }

    /// Returns the outcome of the initialization, running `init` if no
    /// caller has started it yet.
    pub fn ensure<F>(&self, init: F) -> InitState
    where
        F: FnOnce() -> bool,
    {
        let state = self.state();
        if state.is_terminal() {
            return state;
        }

        let won = self
            .0
            .compare_exchange(UNINITIALIZED, IN_PROGRESS, Ordering::Acquire, Ordering::Acquire)
            .is_ok();
        if !won {
            return self.wait();
        }

        // Publishes a failure if `init` unwinds, so waiters never spin forever.
        let publish = Publish(&self.0);
        let raw = match init() {
            true => SUCCEEDED,
            false => FAILED,
        };
        publish.finish(raw)
    }

    fn wait(&self) -> InitState {
        loop {
            // Acquire pairs with the winner's release store, so its
            // side effects are visible once the state turns terminal.
            match self.state() {
                InitState::InProgress => spin_loop(),
                state => return state,
            }
        }
    }
}

impl Default for InitGuard {
    fn default() -> Self {
        Self::new()
    }
}

struct Publish<'a>(&'a AtomicU8);

impl Publish<'_> {
    fn finish(self, raw: u8) -> InitState {
        self.0.store(raw, Ordering::Release);
        std::mem::forget(self);
        InitState::from_raw(raw)
    }
}

impl Drop for Publish<'_> {
    fn drop(&mut self) {
        self.0.store(FAILED, Ordering::Release);
    }
}
