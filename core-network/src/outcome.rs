//! Request outcomes and the handle used to wait for them.

use crate::error::{NetworkError, Result};
use crate::operation::Operation;
use tokio::task::JoinHandle;

/// Result of a completed HTTP exchange.
///
/// A non-2xx response is a `Failure`, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Success(T),
    Failure { status: u16, message: String },
}

impl<T> Outcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn success(self) -> Option<T> {
        match self {
            Outcome::Success(value) => Some(value),
            Outcome::Failure { .. } => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Success(value) => Outcome::Success(f(value)),
            Outcome::Failure { status, message } => Outcome::Failure { status, message },
        }
    }
}

/// Handle to a request running on a background task.
///
/// Dropping it, or calling [`PendingCall::detach`], leaves the request
/// running to completion. Requests cannot be cancelled.
#[derive(Debug)]
pub struct PendingCall<T> {
    operation: Operation,
    handle: JoinHandle<Result<Outcome<T>>>,
}

impl<T> PendingCall<T> {
    pub(crate) fn new(operation: Operation, handle: JoinHandle<Result<Outcome<T>>>) -> Self {
        Self { operation, handle }
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// Whether the background task has finished
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the request to complete.
    pub async fn outcome(self) -> Result<Outcome<T>> {
        self.handle
            .await
            .map_err(|e| NetworkError::TaskFailed(e.to_string()))?
    }

    /// Let the request finish without observing its outcome.
    pub fn detach(self) {
        drop(self.handle);
    }
}
