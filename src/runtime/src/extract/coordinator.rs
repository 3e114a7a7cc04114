//! Bounded-concurrency fan-out over model entries.

use std::collections::HashMap;
use std::sync::Arc;

use modelcar_core::config::ModelEntry;
use modelcar_core::manifest::ModelResult;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;

use super::worker::{ModelWorker, WorkerContext};

/// Runs one worker per entry with at most `max_concurrent` in flight.
pub struct Coordinator {
    worker: ModelWorker,
    semaphore: Arc<Semaphore>,
    max_concurrent: usize,
}

impl Coordinator {
    pub fn new(ctx: Arc<WorkerContext>) -> Self {
        let max_concurrent = ctx.config.effective_concurrency();
        Self {
            worker: ModelWorker::new(ctx),
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
        }
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Process every entry and return one result per entry, in completion order.
    pub async fn run(&self, entries: Vec<ModelEntry>) -> Vec<ModelResult> {
        let total = entries.len();
        tracing::info!(
            models = total,
            max_concurrent = self.max_concurrent,
            "Starting extraction"
        );

        let (tx, mut rx) = mpsc::channel::<ModelResult>(total.max(1));
        let mut tasks = JoinSet::new();
        let mut outstanding: HashMap<String, usize> = HashMap::with_capacity(total);

        for entry in entries {
            *outstanding.entry(entry.uri.clone()).or_default() += 1;

            let worker = self.worker.clone();
            let semaphore = Arc::clone(&self.semaphore);
            let tx = tx.clone();

            tasks.spawn(async move {
                // The semaphore is never closed
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return;
                };
                let result = worker.run(&entry).await;
                let _ = tx.send(result).await;
            });
        }
        drop(tx);

        let mut results = Vec::with_capacity(total);
        let mut receive = |result: ModelResult, results: &mut Vec<ModelResult>| {
            if let Some(count) = outstanding.get_mut(&result.reference) {
                *count = count.saturating_sub(1);
            }
            results.push(result);
        };

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                tracing::error!(error = %e, "Worker task failed");
            }
            while let Ok(result) = rx.try_recv() {
                receive(result, &mut results);
            }
        }
        while let Some(result) = rx.recv().await {
            receive(result, &mut results);
        }

        // Tasks that died before reporting still get a result
        for (reference, count) in outstanding {
            for _ in 0..count {
                tracing::warn!(reference = %reference, "No result reported; marking unreachable");
                results.push(ModelResult::unreachable(reference.clone()));
            }
        }

        tracing::info!(
            models = results.len(),
            found = results.iter().filter(|r| r.model_card_found).count(),
            "Extraction finished"
        );
        results
    }
}
