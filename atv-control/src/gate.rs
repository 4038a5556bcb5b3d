//! Single-permit gate around the device control channel
//!
//! The control interface cannot run two commands at once, so every call
//! (status fetch, key press, scan, seek) takes the gate first. Acquisition
//! waits at most a bounded time; a caller that cannot get the permit gets
//! [`GateError::Busy`] and its work is dropped, not queued.
//!
//! The gate is not reentrant: taking it again from inside a gated closure
//! waits for the timeout and fails with `Busy`.

use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::error::GateError;

/// Default time to wait for the gate
pub const DEFAULT_GATE_TIMEOUT: Duration = Duration::from_secs(10);

/// Capacity-1 mutual exclusion with a bounded wait
#[derive(Debug)]
pub struct CommandGate {
    permit: Mutex<()>,
    default_timeout: Duration,
}

impl CommandGate {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_GATE_TIMEOUT)
    }

    pub fn with_timeout(default_timeout: Duration) -> Self {
        Self {
            permit: Mutex::new(()),
            default_timeout,
        }
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Run `f` while holding the permit
    ///
    /// Returns `GateError::Busy` without running `f` if the permit is not
    /// available within `timeout`. The permit is released when `f` returns
    /// or unwinds.
    pub fn with_exclusive_access<T>(
        &self,
        timeout: Duration,
        f: impl FnOnce() -> T,
    ) -> Result<T, GateError> {
        let Some(_permit) = self.permit.try_lock_for(timeout) else {
            debug!("Command gate busy after {:?}", timeout);
            return Err(GateError::Busy { timeout });
        };
        trace!("Command gate acquired");
        Ok(f())
    }

    /// [`with_exclusive_access`](Self::with_exclusive_access) with the default timeout
    pub fn run<T>(&self, f: impl FnOnce() -> T) -> Result<T, GateError> {
        self.with_exclusive_access(self.default_timeout, f)
    }

    /// Whether someone currently holds the permit
    pub fn is_busy(&self) -> bool {
        self.permit.is_locked()
    }
}

impl Default for CommandGate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{self, AssertUnwindSafe};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{mpsc, Arc};
    use std::thread;

    #[test]
    fn test_runs_closure_and_returns_value() {
        let gate = CommandGate::new();
        assert_eq!(gate.run(|| 42), Ok(42));
        assert!(!gate.is_busy());
    }

    #[test]
    fn test_mutual_exclusion() {
        let gate = Arc::new(CommandGate::new());
        let in_flight = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let gate = Arc::clone(&gate);
                let in_flight = Arc::clone(&in_flight);
                let max_seen = Arc::clone(&max_seen);
                thread::spawn(move || {
                    for _ in 0..20 {
                        gate.run(|| {
                            let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                            max_seen.fetch_max(now, Ordering::SeqCst);
                            thread::sleep(Duration::from_micros(50));
                            in_flight.fetch_sub(1, Ordering::SeqCst);
                        })
                        .unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_busy_after_timeout_skips_closure() {
        let gate = Arc::new(CommandGate::new());
        let (held_tx, held_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();

        let holder = {
            let gate = Arc::clone(&gate);
            thread::spawn(move || {
                gate.run(|| {
                    held_tx.send(()).unwrap();
                    release_rx.recv().unwrap();
                })
                .unwrap();
            })
        };
        held_rx.recv().unwrap();

        let ran = AtomicUsize::new(0);
        let timeout = Duration::from_millis(20);
        let result = gate.with_exclusive_access(timeout, || ran.fetch_add(1, Ordering::SeqCst));
        assert_eq!(result, Err(GateError::Busy { timeout }));
        assert_eq!(ran.load(Ordering::SeqCst), 0);

        release_tx.send(()).unwrap();
        holder.join().unwrap();
        assert_eq!(gate.run(|| "free"), Ok("free"));
    }

    #[test]
    fn test_released_after_panic() {
        let gate = CommandGate::new();
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            gate.run(|| panic!("device call blew up")).ok();
        }));
        assert!(result.is_err());
        assert!(!gate.is_busy());
        assert_eq!(gate.with_exclusive_access(Duration::from_millis(10), || 1), Ok(1));
    }

    #[test]
    fn test_not_reentrant() {
        let gate = CommandGate::new();
        let timeout = Duration::from_millis(10);
        let inner = gate.run(|| gate.with_exclusive_access(timeout, || ()));
        assert_eq!(inner, Ok(Err(GateError::Busy { timeout })));
    }
}
