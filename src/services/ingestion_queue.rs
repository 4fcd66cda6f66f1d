use std::sync::Arc;

use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;

use crate::error::{AppError, AppResult};
use crate::services::ingestion::{IngestionJob, IngestionService};

/// Submission side of the ingestion worker pool
///
/// `submit` hands a job to a bounded queue and returns at once. A dispatcher
/// task pulls jobs off the queue and runs each one in its own task, with at
/// most `workers` running at a time. Callers never see the outcome; every run
/// logs its own result.
#[derive(Clone)]
pub struct IngestionQueue {
    job_tx: mpsc::Sender<IngestionJob>,
}

/// Handle for gracefully shutting down the ingestion workers
pub struct IngestionWorkerHandle {
    shutdown_tx: mpsc::Sender<()>,
    dispatcher: JoinHandle<()>,
}

impl IngestionWorkerHandle {
    /// Stops accepting jobs, runs the ones already queued and waits for
    /// every running job to finish
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        tracing::info!("Ingestion shutdown signal sent");
        if let Err(e) = self.dispatcher.await {
            tracing::error!(error = %e, "Ingestion dispatcher ended abnormally");
        }
    }
}

impl IngestionQueue {
    /// Spawns the dispatcher and returns the queue with its shutdown handle
    pub fn start(
        service: Arc<IngestionService>,
        workers: usize,
        capacity: usize,
    ) -> (Self, IngestionWorkerHandle) {
        let (job_tx, job_rx) = mpsc::channel(capacity.max(1));
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let workers = workers.max(1);
        let dispatcher = tokio::spawn(async move {
            Self::dispatcher_task(service, workers, job_rx, shutdown_rx).await;
        });

        let queue = Self { job_tx };
        let handle = IngestionWorkerHandle {
            shutdown_tx,
            dispatcher,
        };

        (queue, handle)
    }

    /// Queues a job without waiting for it to run
    pub fn submit(&self, job: IngestionJob) -> AppResult<()> {
        match self.job_tx.try_send(job) {
            Ok(()) => {
                tracing::debug!(job = %job, "Ingestion job queued");
                Ok(())
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(job = %job, "Ingestion queue full, job rejected");
                Err(AppError::Unavailable(
                    "Too many pending ingestion jobs, try again later".to_string(),
                ))
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Err(AppError::Unavailable(
                "Ingestion workers are shutting down".to_string(),
            )),
        }
    }

    async fn dispatcher_task(
        service: Arc<IngestionService>,
        workers: usize,
        mut job_rx: mpsc::Receiver<IngestionJob>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        tracing::info!(workers = workers, "Ingestion dispatcher started");
        let permits = Arc::new(Semaphore::new(workers));

        loop {
            tokio::select! {
                Some(job) = job_rx.recv() => {
                    Self::dispatch(&service, &permits, job).await;
                }
                _ = shutdown_rx.recv() => {
                    job_rx.close();
                    tracing::info!("Ingestion dispatcher draining queue");

                    while let Some(job) = job_rx.recv().await {
                        Self::dispatch(&service, &permits, job).await;
                    }
                    break;
                }
                else => break,
            }
        }

        // Every permit back means every spawned run has finished
        if permits.acquire_many(workers as u32).await.is_err() {
            tracing::error!("Ingestion worker permits closed unexpectedly");
        }
        tracing::info!("Ingestion dispatcher stopped");
    }

    async fn dispatch(service: &Arc<IngestionService>, permits: &Arc<Semaphore>, job: IngestionJob) {
        let permit = match permits.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(e) => {
                tracing::error!(error = %e, job = %job, "No ingestion worker available");
                return;
            }
        };

        let service = service.clone();
        tokio::spawn(async move {
            let _permit = permit;
            service.run(job).await;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Cache, CatalogStore, MemoryStore};
    use crate::services::catalog_client::MockCatalogClient;
    use serde_json::json;

    fn ingestion_service(store: Arc<MemoryStore>) -> Arc<IngestionService> {
        let mut catalog = MockCatalogClient::new();
        catalog.expect_name().return_const("mock");
        catalog
            .expect_recommendations()
            .returning(|seed| Ok(vec![json!({"id": seed * 10, "title": format!("Rec {seed}")})]));
        catalog
            .expect_trending()
            .returning(|| Ok(vec![json!({"id": 1, "title": "Trending"})]));

        Arc::new(IngestionService::new(
            store,
            Arc::new(catalog),
            Cache::in_memory(),
            "https://image.tmdb.org/t/p/w500".to_string(),
        ))
    }

    #[tokio::test]
    async fn test_submitted_jobs_run_before_shutdown_completes() {
        let store = Arc::new(MemoryStore::new());
        let (queue, handle) = IngestionQueue::start(ingestion_service(store.clone()), 2, 16);

        queue.submit(IngestionJob::Trending).unwrap();
        queue
            .submit(IngestionJob::Recommendations {
                seed_external_id: 7,
            })
            .unwrap();
        queue
            .submit(IngestionJob::Recommendations {
                seed_external_id: 8,
            })
            .unwrap();

        handle.shutdown().await;

        assert!(store.movie_exists(1).await.unwrap());
        assert!(store.movie_exists(70).await.unwrap());
        assert!(store.movie_exists(80).await.unwrap());
    }

    #[tokio::test]
    async fn test_submit_after_shutdown_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        let (queue, handle) = IngestionQueue::start(ingestion_service(store), 1, 4);

        handle.shutdown().await;

        let result = queue.submit(IngestionJob::Trending);
        assert!(matches!(result, Err(AppError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_full_queue_rejects_submission() {
        // Current-thread runtime: the dispatcher cannot drain before we fill the queue
        let store = Arc::new(MemoryStore::new());
        let (queue, handle) = IngestionQueue::start(ingestion_service(store), 1, 1);

        queue.submit(IngestionJob::Trending).unwrap();
        let second = queue.submit(IngestionJob::Trending);
        assert!(matches!(second, Err(AppError::Unavailable(_))));

        handle.shutdown().await;
    }
}
