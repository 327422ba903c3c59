//! Background execution of requests.
//!
//! A client created inside a Tokio runtime spawns onto that runtime, so its
//! requests may run in parallel on the shared worker pool. A client created
//! outside any runtime owns a runtime with a single worker thread. Its
//! requests run one after another in submission order: each holds the
//! only permit of a semaphore until its exchange has finished.

use crate::error::{NetworkError, Result};
use std::future::Future;
use std::sync::Arc;
use tokio::runtime::{Builder, Handle, Runtime};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::debug;

const WORKER_THREAD_NAME: &str = "request-client";

pub(crate) enum Dispatcher {
    Shared(Handle),
    Owned(OwnedRuntime),
}

impl Dispatcher {
    pub(crate) fn new() -> Result<Self> {
        if let Ok(handle) = Handle::try_current() {
            debug!("Dispatching requests on the current runtime");
            return Ok(Dispatcher::Shared(handle));
        }

        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name(WORKER_THREAD_NAME)
            .enable_all()
            .build()
            .map_err(|e| NetworkError::Dispatcher(e.to_string()))?;

        debug!("Dispatching requests on a dedicated worker thread");
        Ok(Dispatcher::Owned(OwnedRuntime {
            runtime: Some(runtime),
            turn: Arc::new(Semaphore::new(1)),
        }))
    }

    pub(crate) fn spawn<F>(&self, future: F) -> Result<JoinHandle<F::Output>>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        match self {
            Dispatcher::Shared(handle) => Ok(handle.spawn(future)),
            Dispatcher::Owned(owned) => {
                let runtime = owned.runtime.as_ref().ok_or_else(|| {
                    NetworkError::Dispatcher("dispatcher runtime has shut down".to_string())
                })?;
                let turn = Arc::clone(&owned.turn);

                Ok(runtime.spawn(async move {
                    // The semaphore is never closed, so acquiring cannot fail
                    let _permit = turn.acquire_owned().await;
                    future.await
                }))
            }
        }
    }

    /// Whether requests run one at a time
    pub(crate) fn is_serial(&self) -> bool {
        matches!(self, Dispatcher::Owned(_))
    }
}

/// Runtime owned by a client created outside Tokio.
///
/// Shut down without blocking, so the owning client may be dropped from
/// async code. Unfinished requests are abandoned.
pub(crate) struct OwnedRuntime {
    runtime: Option<Runtime>,
    turn: Arc<Semaphore>,
}

impl Drop for OwnedRuntime {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}
