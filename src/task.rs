//! Cancellable background task handle.
//!
//! Every timer-owning component (feeds, aggregator, rotation) runs as exactly
//! one spawned task bound to a [`CancellationToken`]. Stopping cancels the
//! token and joins the task; dropping the handle without stopping still
//! cancels it, so no timer outlives its owner.

use std::future::Future;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::debug;

#[derive(Error, Debug)]
pub enum TaskError {
    #[error("task '{name}' panicked: {source}")]
    Panicked {
        name: &'static str,
        #[source]
        source: tokio::task::JoinError,
    },

    #[error("task '{name}' was aborted before it could finish")]
    Aborted { name: &'static str },
}

/// Handle to a spawned task that yields `T` once cancelled.
#[derive(Debug)]
pub struct TaskHandle<T> {
    name: &'static str,
    cancel: CancellationToken,
    join: JoinHandle<T>,
    _guard: DropGuard,
}

impl<T: Send + 'static> TaskHandle<T> {
    /// Spawn `body` with its own token.
    ///
    /// `cancel` is typically a child of an application-wide token, so that
    /// cancelling the parent tears down every task at once.
    pub fn spawn<F, Fut>(name: &'static str, cancel: CancellationToken, body: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        debug!(task = name, "Spawning task");
        let join = tokio::spawn(body(cancel.clone()));
        let _guard = cancel.clone().drop_guard();
        Self {
            name,
            cancel,
            join,
            _guard,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Token observed by the task body.
    pub fn token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Cancel the task and wait for it to hand back its output.
    pub async fn stop(self) -> Result<T, TaskError> {
        let Self {
            name, join, _guard, ..
        } = self;
        drop(_guard);
        let out = join.await.map_err(|source| {
            if source.is_cancelled() {
                TaskError::Aborted { name }
            } else {
                TaskError::Panicked { name, source }
            }
        })?;
        debug!(task = name, "Task stopped");
        Ok(out)
    }
}
