//! Interrupt flag for streaming writes.
//! Set from the Ctrl-C handler; `copy_into` checks it between chunks and the
//! session is aborted, so the target keeps its old content.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::errors::{ReplaceError, Result};

static REQUESTED: AtomicBool = AtomicBool::new(false);

/// Record an interrupt. Returns `true` if one had already been recorded.
/// Signal-handler safe.
#[inline]
pub fn request() -> bool {
    REQUESTED.swap(true, Ordering::Relaxed)
}

#[inline]
pub fn is_requested() -> bool {
    REQUESTED.load(Ordering::Relaxed)
}

/// `Err(ReplaceError::Interrupted)` once an interrupt has been recorded.
#[inline]
pub fn check() -> Result<()> {
    if is_requested() { Err(ReplaceError::Interrupted) } else { Ok(()) }
}

#[cfg(test)]
pub(crate) fn reset() {
    REQUESTED.store(false, Ordering::Relaxed);
}
