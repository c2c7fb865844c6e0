//! Cooperative, coarse-grained cancellation.
//!
//! The planner and the replay loop poll a [`CancelSignal`] before every
//! operation they emit. Cancellation never rolls anything back: operations
//! already emitted (or already sent to the surface) stand.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Polled at every emission checkpoint. `true` stops the run.
pub trait CancelSignal {
    fn is_cancelled(&self) -> bool;
}

/// Shared flag for interrupting a run from another thread.
///
/// Clones observe the same flag. Once cancelled, a token stays cancelled.
#[derive(Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }
}

impl CancelSignal for CancelToken {
    #[inline(always)]
    fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

impl<F: Fn() -> bool> CancelSignal for F {
    #[inline(always)]
    fn is_cancelled(&self) -> bool {
        self()
    }
}

/// A signal that never fires, for fire-and-forget conversions.
#[derive(Copy, Clone, Debug, Default)]
pub struct NeverCancel;

impl CancelSignal for NeverCancel {
    #[inline(always)]
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Hands out one active [`CancelToken`] at a time.
///
/// Starting a new conversion cancels the in-flight one, waits a grace period
/// so its loop can observe the flag at the next checkpoint, then issues a
/// fresh token. This interrupt-and-wait protocol is what keeps a single run
/// active without a lock around the whole pipeline.
pub struct Session {
    current: CancelToken,
    grace: Duration,
}

impl Session {
    /// Default grace period matching interactive surfaces comfortably
    pub const DEFAULT_GRACE: Duration = Duration::from_millis(50);

    #[must_use]
    pub fn new() -> Self {
        Self::with_grace(Self::DEFAULT_GRACE)
    }

    #[must_use]
    pub fn with_grace(grace: Duration) -> Self {
        Self { current: CancelToken::new(), grace }
    }

    /// Token gating the run currently considered active
    #[inline]
    #[must_use]
    pub fn token(&self) -> CancelToken {
        self.current.clone()
    }

    /// Cancel the in-flight run, sleep the grace period, and return the
    /// token for the next run.
    pub fn interrupt(&mut self) -> CancelToken {
        self.current.cancel();
        std::thread::sleep(self.grace);
        self.current = CancelToken::new();
        self.current.clone()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[test]
fn token_is_shared() {
    let t = CancelToken::new();
    let t2 = t.clone();
    assert!(!t2.is_cancelled());
    t.cancel();
    assert!(t2.is_cancelled());
}

#[test]
fn closures_are_signals() {
    fn poll(c: &impl CancelSignal) -> bool {
        c.is_cancelled()
    }
    assert!(!poll(&NeverCancel));
    assert!(poll(&|| true));
}

#[test]
fn interrupt_swaps_tokens() {
    let mut session = Session::with_grace(Duration::ZERO);
    let old = session.token();
    let fresh = session.interrupt();
    assert!(old.is_cancelled());
    assert!(!fresh.is_cancelled());
    assert!(!session.token().is_cancelled());
}
