//! Wait policy for the handoff flags.
//!
//! The flags themselves are always atomics with acquire/release ordering; the
//! policy only decides how a thread passes time until a flag condition holds.
//!
//! - [`WaitPolicy::Spin`] busy-waits with `spin_loop`. Lowest handoff latency,
//!   burns a core while waiting. The default for a short-lived CLI process.
//! - [`WaitPolicy::Block`] parks on a `Mutex` + `Condvar` pair. Every flag store
//!   is followed by a notify, so a parked waiter re-checks its condition after
//!   each state change.

use std::sync::{Condvar, Mutex, PoisonError};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum WaitPolicy {
    #[default]
    Spin,
    Block,
}

pub(crate) struct Parker {
    policy: WaitPolicy,
    lock: Mutex<()>,
    cvar: Condvar,
}

impl Parker {
    pub(crate) fn new(policy: WaitPolicy) -> Self {
        Self {
            policy,
            lock: Mutex::new(()),
            cvar: Condvar::new(),
        }
    }

    /// Returns once `ready` reports `true`.
    ///
    /// `ready` must only read atomics; it is evaluated under the parker lock
    /// when blocking, which is what makes `notify` race-free.
    #[inline]
    pub(crate) fn wait_until(&self, mut ready: impl FnMut() -> bool) {
        if ready() {
            return;
        }
        match self.policy {
            WaitPolicy::Spin => {
                while !ready() {
                    std::hint::spin_loop();
                }
            }
            WaitPolicy::Block => {
                let mut guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
                while !ready() {
                    guard = self
                        .cvar
                        .wait(guard)
                        .unwrap_or_else(PoisonError::into_inner);
                }
            }
        }
    }

    /// Wakes any thread parked in [`wait_until`](Self::wait_until).
    ///
    /// Must be called after the flag store it announces.
    #[inline]
    pub(crate) fn notify(&self) {
        if self.policy == WaitPolicy::Block {
            // Taking the lock orders this wakeup after a waiter's condition
            // check, so the store above cannot be missed.
            drop(self.lock.lock().unwrap_or_else(PoisonError::into_inner));
            self.cvar.notify_all();
        }
    }

    /// Pause between retries of a would-block descriptor.
    #[inline]
    pub(crate) fn backoff(&self) {
        match self.policy {
            WaitPolicy::Spin => std::hint::spin_loop(),
            WaitPolicy::Block => std::thread::yield_now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;
    use std::time::Duration;

    fn wakes_waiter(policy: WaitPolicy) {
        let parker = Arc::new(Parker::new(policy));
        let flag = Arc::new(AtomicBool::new(false));

        let waiter = {
            let parker = Arc::clone(&parker);
            let flag = Arc::clone(&flag);
            thread::spawn(move || parker.wait_until(|| flag.load(Ordering::Acquire)))
        };

        thread::sleep(Duration::from_millis(20));
        flag.store(true, Ordering::Release);
        parker.notify();
        waiter.join().expect("waiter panicked");
    }

    #[test]
    fn spin_waiter_observes_flag() {
        wakes_waiter(WaitPolicy::Spin);
    }

    #[test]
    fn blocking_waiter_is_woken_by_notify() {
        wakes_waiter(WaitPolicy::Block);
    }

    #[test]
    fn ready_condition_returns_immediately() {
        let parker = Parker::new(WaitPolicy::Block);
        let mut calls = 0;
        parker.wait_until(|| {
            calls += 1;
            true
        });
        assert_eq!(calls, 1);
    }
}
