//! Bounded worker pool for fetch operations.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, warn};

pub const DEFAULT_WORKERS: usize = 4;

/// Runs independent fetches as tokio tasks, at most `size` at a time.
///
/// Results come back in submission order whatever the completion order, so
/// everything downstream sees a deterministic sequence. A task that panics
/// is logged and dropped; its siblings are unaffected.
#[derive(Debug, Clone)]
pub struct FetchPool {
    permits: Arc<Semaphore>,
    size: usize,
}

impl Default for FetchPool {
    fn default() -> Self {
        Self::new(DEFAULT_WORKERS)
    }
}

impl FetchPool {
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            permits: Arc::new(Semaphore::new(size)),
            size,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub async fn map<T, O, F, Fut>(&self, items: Vec<T>, f: F) -> Vec<O>
    where
        T: Send + 'static,
        O: Send + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = O> + Send + 'static,
    {
        let f = Arc::new(f);
        let mut handles = Vec::with_capacity(items.len());

        for item in items {
            let permits = Arc::clone(&self.permits);
            let f = Arc::clone(&f);
            handles.push(tokio::spawn(async move {
                let _permit = permits.acquire_owned().await.ok()?;
                Some(f(item).await)
            }));
        }

        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.await {
                Ok(Some(output)) => results.push(output),
                Ok(None) => warn!("fetch pool closed before task could run"),
                Err(e) => error!("fetch task failed: {e}"),
            }
        }
        results
    }
}
