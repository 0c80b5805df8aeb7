use crate::error::{RelayError, Result};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, info};

/// Process-wide bound on in-flight word translations.
///
/// Cloning shares the same capacity. Once [`WorkerPool::shutdown`] is called,
/// waiting and future acquisitions fail with [`RelayError::PoolClosed`];
/// permits already handed out stay valid until dropped.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

impl WorkerPool {
    /// Create a pool with `capacity` slots. A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        debug!("Starting worker pool with {} slots", capacity);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Wait for a free slot.
    pub async fn acquire(&self) -> Result<OwnedSemaphorePermit> {
        self.semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| RelayError::PoolClosed)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    pub fn is_closed(&self) -> bool {
        self.semaphore.is_closed()
    }

    /// Stop handing out slots. Safe to call more than once.
    pub fn shutdown(&self) {
        if !self.semaphore.is_closed() {
            info!("Shutting down worker pool");
            self.semaphore.close();
        }
    }
}
