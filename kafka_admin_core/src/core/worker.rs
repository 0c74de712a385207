use std::future::Future;
use std::sync::Arc;

use log::error;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use crate::core::errors::AdminError;

pub const DEFAULT_MAX_IN_FLIGHT: usize = 4;

/// Runs network-bound work (connect, fetch) off the foreground context.
///
/// At most `max_in_flight` submitted tasks run at once; the rest wait for a
/// permit. Must be used from within a tokio runtime.
#[derive(Clone)]
pub struct BackgroundWorker {
    permits: Arc<Semaphore>,
}

/// Completion of a submitted task, awaited by the foreground.
pub struct PendingTask<T> {
    handle: JoinHandle<Result<T, AdminError>>,
}

impl Default for BackgroundWorker {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_IN_FLIGHT)
    }
}

impl BackgroundWorker {
    pub fn new(max_in_flight: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(max_in_flight.max(1))),
        }
    }

    pub fn submit<F, T>(&self, task: F) -> PendingTask<T>
    where
        F: Future<Output = Result<T, AdminError>> + Send + 'static,
        T: Send + 'static,
    {
        let permits = self.permits.clone();
        let handle = tokio::spawn(async move {
            // The semaphore is never closed, so acquire only fails if it is.
            let _permit = permits
                .acquire_owned()
                .await
                .map_err(|e| AdminError::Operation {
                    operation: "background task",
                    message: e.to_string(),
                })?;
            task.await
        });
        PendingTask { handle }
    }
}

impl<T> PendingTask<T> {
    pub async fn wait(self) -> Result<T, AdminError> {
        match self.handle.await {
            Ok(result) => result,
            Err(join_err) => {
                error!("Background task ended abnormally: {join_err}");
                Err(AdminError::Operation {
                    operation: "background task",
                    message: join_err.to_string(),
                })
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}
