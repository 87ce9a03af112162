// bounded fan-out of per-file work

use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::fmt::Display;
use std::future::Future;
use std::hash::Hash;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

pub const DEFAULT_CONCURRENCY: usize = 16;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BatchError {
    #[error("no results produced")]
    NoResults,
}

/// runs one unit of work per item with a cap on how many are in flight.
/// a failing (or timed out) item is logged and left out of the output, it
/// never aborts the rest of the batch.
#[derive(Debug, Clone)]
pub struct BatchRunner {
    concurrency: usize,
    item_timeout: Option<Duration>,
}

impl Default for BatchRunner {
    fn default() -> Self {
        Self::new(DEFAULT_CONCURRENCY)
    }
}

impl BatchRunner {
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency: concurrency.max(1),
            item_timeout: None,
        }
    }

    pub fn with_item_timeout(mut self, item_timeout: Option<Duration>) -> Self {
        self.item_timeout = item_timeout;
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// all futures are polled from the calling task, so `worker` may borrow
    /// from the caller. completion order is unspecified.
    pub async fn run<I, K, V, E, F, Fut>(
        &self,
        items: I,
        mut worker: F,
    ) -> Result<HashMap<K, V>, BatchError>
    where
        I: IntoIterator,
        I::Item: Display,
        K: Eq + Hash,
        E: Display,
        F: FnMut(I::Item) -> Fut,
        Fut: Future<Output = Result<(K, V), E>>,
    {
        let item_timeout = self.item_timeout;

        let results = stream::iter(items)
            .map(|item| {
                let label = item.to_string();
                let work = worker(item);
                async move {
                    let outcome = match item_timeout {
                        Some(limit) => match tokio::time::timeout(limit, work).await {
                            Ok(outcome) => outcome.map_err(|e| e.to_string()),
                            Err(_) => Err(format!("timed out after {limit:?}")),
                        },
                        None => work.await.map_err(|e| e.to_string()),
                    };
                    (label, outcome)
                }
            })
            .buffer_unordered(self.concurrency)
            .fold(HashMap::new(), |mut results, (label, outcome)| async move {
                match outcome {
                    Ok((key, value)) => {
                        results.insert(key, value);
                    }
                    Err(err) => warn!("skipping {}: {}", label, err),
                }
                results
            })
            .await;

        debug!("batch finished with {} results", results.len());

        if results.is_empty() {
            return Err(BatchError::NoResults);
        }
        Ok(results)
    }
}
