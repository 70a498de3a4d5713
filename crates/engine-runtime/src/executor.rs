use crate::{
    error::{ExecutorError, TransferError},
    factory::{ConnectionFactory, UrlConnectionFactory, open_watermark_store},
    orchestrator::{Orchestrator, failed_summary},
};
use engine_config::settings::ValidatedConfig;
use engine_core::{metrics::Metrics, watermark::WatermarkStore};
use model::transfer::{request::TransferRequest, summary::TransferSummary};
use std::sync::Arc;
use tokio::{sync::Semaphore, task::JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Opens the watermark store and runs every configured table.
pub async fn run(
    config: &ValidatedConfig,
    metrics: Metrics,
    cancel: CancellationToken,
) -> Result<Vec<TransferSummary>, ExecutorError> {
    let store = open_watermark_store(&config.state, &config.destination.url).await?;
    let factory = Arc::new(UrlConnectionFactory::new(
        config.source.url.clone(),
        config.destination.url.clone(),
    ));

    TransferExecutor::new(factory, store, config.parallelism)
        .with_metrics(metrics)
        .with_cancel(cancel)
        .execute(config.requests.clone())
        .await
}

/// Runs independent table transfers, at most `parallelism` at a time.
/// Each table gets its own connections; only the watermark store is shared.
pub struct TransferExecutor {
    factory: Arc<dyn ConnectionFactory>,
    store: Arc<dyn WatermarkStore>,
    parallelism: usize,
    metrics: Metrics,
    cancel: CancellationToken,
}

impl TransferExecutor {
    pub fn new(
        factory: Arc<dyn ConnectionFactory>,
        store: Arc<dyn WatermarkStore>,
        parallelism: usize,
    ) -> Self {
        TransferExecutor {
            factory,
            store,
            parallelism: parallelism.max(1),
            metrics: Metrics::new(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Summaries come back in request order.
    pub async fn execute(
        &self,
        requests: Vec<TransferRequest>,
    ) -> Result<Vec<TransferSummary>, ExecutorError> {
        let total = requests.len();
        info!(tables = total, parallelism = self.parallelism, "Starting transfers");

        let permits = Arc::new(Semaphore::new(self.parallelism));
        let mut tasks = JoinSet::new();

        for (idx, request) in requests.iter().cloned().enumerate() {
            let permits = permits.clone();
            let factory = self.factory.clone();
            let store = self.store.clone();
            let metrics = self.metrics.clone();
            let cancel = self.cancel.clone();

            tasks.spawn(async move {
                let summary = match permits.acquire_owned().await {
                    Ok(_permit) => {
                        let (factory, store) = (factory.as_ref(), store.as_ref());
                        run_table(factory, store, &request, metrics.clone(), cancel).await
                    }
                    Err(_) => failed_summary(&request, &TransferError::Cancelled),
                };
                metrics.record_table(summary.success);
                (idx, summary)
            });
        }

        // A task that panics leaves its slot empty; the others keep running.
        let mut slots: Vec<Option<TransferSummary>> = vec![None; total];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((idx, summary)) => slots[idx] = Some(summary),
                Err(e) => error!(error = %e, "Transfer task aborted"),
            }
        }

        let summaries: Vec<TransferSummary> = slots
            .into_iter()
            .zip(&requests)
            .map(|(slot, request)| {
                slot.unwrap_or_else(|| {
                    self.metrics.record_table(false);
                    failed_summary(request, &TransferError::Aborted)
                })
            })
            .collect();

        let failed = summaries.iter().filter(|s| !s.success).count();
        if failed > 0 {
            warn!(failed, tables = total, "Some transfers failed");
        } else {
            info!(tables = total, "All transfers completed");
        }

        Ok(summaries)
    }
}

async fn run_table(
    factory: &dyn ConnectionFactory,
    store: &dyn WatermarkStore,
    request: &TransferRequest,
    metrics: Metrics,
    cancel: CancellationToken,
) -> TransferSummary {
    if cancel.is_cancelled() {
        return failed_summary(request, &TransferError::Cancelled);
    }

    let key = request.key();
    let source = match factory.source(request).await {
        Ok(source) => source,
        Err(e) => {
            let e = TransferError::Connection(e);
            error!(table = %key, error = %e, "Failed to open source");
            return failed_summary(request, &e);
        }
    };
    let mut sink = match factory.sink(request).await {
        Ok(sink) => sink,
        Err(e) => {
            let e = TransferError::Connection(e);
            error!(table = %key, error = %e, "Failed to open destination");
            return failed_summary(request, &e);
        }
    };

    Orchestrator::new(source.as_ref(), sink.as_mut(), store)
        .with_metrics(metrics)
        .with_cancel(cancel)
        .transfer_table(request)
        .await
}
