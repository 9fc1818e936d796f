//! Exclusive access to a form session and cooperative cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::error::WorkflowError;

/// At most one in-flight run per remote form session.
///
/// Clone it into every orchestrator that targets the same session.
#[derive(Debug, Clone, Default)]
pub struct FormSessionLock {
    busy: Arc<AtomicBool>,
}

impl FormSessionLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the session. A second claim fails until the guard is dropped.
    pub fn try_acquire(&self) -> Result<SessionGuard, WorkflowError> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| WorkflowError::SessionBusy)?;
        Ok(SessionGuard {
            busy: Arc::clone(&self.busy),
        })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Releases the session on drop.
#[derive(Debug)]
pub struct SessionGuard {
    busy: Arc<AtomicBool>,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

/// Stop request polled between field operations. Never interrupts a call
/// already in flight; fields filled before the stop stay filled.
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    stop: Arc<AtomicBool>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    pub(crate) fn reset(&self) {
        self.stop.store(false, Ordering::Relaxed);
    }
}
