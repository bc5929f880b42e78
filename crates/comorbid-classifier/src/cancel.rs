//! Cooperative cancellation.
//!
//! The classifier polls a [`Cancellation`] once per row (or row block) from
//! its sequential control loop. Workers never poll it. When a poll returns
//! true the classifier stops dispatching and hands back the rows finished so
//! far, flagged as incomplete.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Something the classifier can ask "should I stop?".
pub trait Cancellation: Sync {
    /// Returns true once the caller wants classification to stop.
    fn is_cancelled(&self) -> bool;
}

/// A cancellation source that never fires.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverCancel;

impl Cancellation for NeverCancel {
    fn is_cancelled(&self) -> bool {
        false
    }
}

impl<F> Cancellation for F
where
    F: Fn() -> bool + Sync,
{
    fn is_cancelled(&self) -> bool {
        self()
    }
}

/// A shared abort flag.
///
/// Clones share the same flag, so one clone can be handed to a signal
/// handler or another thread while the classifier polls the other.
///
/// # Example
///
/// ```
/// use comorbid_classifier::{Cancellation, CancellationToken};
///
/// let token = CancellationToken::new();
/// let trigger = token.clone();
///
/// assert!(!token.is_cancelled());
/// trigger.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Creates a token that has not been cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Clears a previous cancellation request.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

impl Cancellation for CancellationToken {
    fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
