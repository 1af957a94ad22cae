//! Cooperative cancellation for agent invocations.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::AgentError;

/// Shared flag checked after every awaited collaborator call.
///
/// Clones observe the same flag. A new user turn cancels the token of the
/// turn it supersedes.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// `Err(AgentError::Cancelled)` once cancelled.
    pub fn check(&self) -> Result<(), AgentError> {
        if self.is_cancelled() {
            Err(AgentError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Whether both handles refer to the same invocation.
    pub fn same_as(&self, other: &CancelToken) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}
