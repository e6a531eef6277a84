use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::domain::AppError;

/// Host-owned flag that asks in-flight resolution to stop.
///
/// Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Clear a previous cancellation so the next build can resolve again.
    pub fn reset(&self) {
        self.cancelled.store(false, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn check(&self) -> Result<(), AppError> {
        if self.is_cancelled() { Err(AppError::Interrupted) } else { Ok(()) }
    }
}
