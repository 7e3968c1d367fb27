//! Per-call context: deadline and cooperative cancellation.
//!
//! Every blocking sub-call (lookup, sequence increment, atomic persist,
//! publish) checks the context first. Once the atomic persist has committed,
//! only the publish step still observes cancellation; a cancelled publish is
//! treated as a publish failure and dead-lettered.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use crate::error::{LedgerError, LedgerResult};

/// Caller-supplied deadline/cancellation signal for one request.
#[derive(Debug, Clone)]
pub struct CallContext {
    deadline: Option<Instant>,
    cancelled: Arc<AtomicBool>,
}

impl CallContext {
    /// Context with no deadline and no external cancellation.
    pub fn background() -> Self {
        Self {
            deadline: None,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            ..Self::background()
        }
    }

    /// Handle the caller keeps to cancel the request from another thread.
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            flag: Arc::clone(&self.cancelled),
        }
    }

    /// Fail fast if the caller cancelled or the deadline expired.
    pub fn check(&self) -> LedgerResult<()> {
        if self.cancelled.load(Ordering::Acquire) {
            return Err(LedgerError::cancelled("cancelled by caller"));
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(LedgerError::cancelled("deadline expired"));
            }
        }
        Ok(())
    }
}

impl Default for CallContext {
    fn default() -> Self {
        Self::background()
    }
}

/// Cancels the associated [`CallContext`] when triggered.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }
}
