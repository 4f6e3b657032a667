// Cooperative cancellation for the greedy loop

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

/// Signal polled once per greedy round.
///
/// When it reports `true` the engine stops selecting and returns what it has:
/// finished groups plus every still-live attestation untouched.
pub trait CancellationSignal {
    fn is_cancelled(&self) -> bool;
}

/// Signal that never fires.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverCancel;

impl CancellationSignal for NeverCancel {
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// A deadline fires once it is in the past.
impl CancellationSignal for Instant {
    fn is_cancelled(&self) -> bool {
        Instant::now() >= *self
    }
}

impl CancellationSignal for AtomicBool {
    fn is_cancelled(&self) -> bool {
        self.load(Ordering::Relaxed)
    }
}

impl<T: CancellationSignal + ?Sized> CancellationSignal for &T {
    fn is_cancelled(&self) -> bool {
        (**self).is_cancelled()
    }
}

impl<T: CancellationSignal + ?Sized> CancellationSignal for Arc<T> {
    fn is_cancelled(&self) -> bool {
        (**self).is_cancelled()
    }
}

impl<T: CancellationSignal> CancellationSignal for Option<T> {
    fn is_cancelled(&self) -> bool {
        self.as_ref().is_some_and(CancellationSignal::is_cancelled)
    }
}
