use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::types::{AuditRecord, RenderError};

use super::engine::ReportEngine;
use super::sink::{OutputSink, RenderOutput};

#[derive(Debug, Clone, Copy)]
pub struct BatchOptions {
    /// Documents rendered at once
    pub concurrency: usize,
    /// Per-document budget, measured from when its worker starts
    pub render_timeout: Duration,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            concurrency: 4,
            render_timeout: Duration::from_secs(60),
        }
    }
}

/// Result of one document in a batch
#[derive(Debug)]
pub struct BatchOutcome {
    pub job_id: String,
    pub slug: String,
    pub result: Result<RenderOutput, RenderError>,
}

/// Outcomes in input order
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<BatchOutcome>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }
}

fn job_id() -> String {
    format!("rpt_{}", uuid::Uuid::new_v4().simple())
}

/// Renders many records through one shared engine with bounded concurrency
pub struct BatchRenderer {
    engine: Arc<ReportEngine>,
    options: BatchOptions,
    cancel: CancellationToken,
}

impl BatchRenderer {
    pub fn new(engine: Arc<ReportEngine>, options: BatchOptions) -> Self {
        Self {
            engine,
            options,
            cancel: CancellationToken::new(),
        }
    }

    /// Token that aborts every pending and in-flight document when cancelled
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Render every record into `sink`.
    ///
    /// A failing document never affects the others. Once cancelled, workers
    /// still waiting for a slot finish immediately with `Cancelled`.
    pub async fn run(&self, records: Vec<AuditRecord>, sink: OutputSink) -> BatchReport {
        let total = records.len();
        let started = Instant::now();
        let semaphore = Arc::new(Semaphore::new(self.options.concurrency.max(1)));
        let sink = Arc::new(sink);
        let mut tasks = JoinSet::new();
        let mut slots: Vec<Option<BatchOutcome>> = Vec::with_capacity(total);

        info!(
            "Starting batch of {} reports (concurrency {})",
            total, self.options.concurrency
        );

        for (index, record) in records.into_iter().enumerate() {
            let job_id = job_id();
            slots.push(None);

            let engine = Arc::clone(&self.engine);
            let semaphore = Arc::clone(&semaphore);
            let sink = Arc::clone(&sink);
            let cancel = self.cancel.clone();
            let timeout = self.options.render_timeout;

            tasks.spawn(async move {
                let result = tokio::select! {
                    permit = semaphore.acquire_owned() => match permit {
                        Ok(_permit) => {
                            let deadline = Instant::now() + timeout;
                            engine
                                .render_with_cancel(&record, &sink, deadline, &cancel)
                                .await
                        }
                        Err(_) => Err(RenderError::Internal("worker pool closed".to_string())),
                    },
                    _ = cancel.cancelled() => Err(RenderError::Cancelled),
                };
                (
                    index,
                    BatchOutcome {
                        job_id,
                        slug: record.slug,
                        result,
                    },
                )
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => {
                    if let Err(e) = &outcome.result {
                        warn!("Job {} ({}) failed: {}", outcome.job_id, outcome.slug, e);
                    }
                    slots[index] = Some(outcome);
                }
                Err(e) => error!("Render worker panicked: {}", e),
            }
        }

        // A panicked worker leaves its slot empty
        let outcomes: Vec<BatchOutcome> = slots
            .into_iter()
            .map(|slot| {
                slot.unwrap_or_else(|| BatchOutcome {
                    job_id: job_id(),
                    slug: String::new(),
                    result: Err(RenderError::Internal("render worker panicked".to_string())),
                })
            })
            .collect();
        let report = BatchReport { outcomes };

        info!(
            "Batch finished: {} succeeded, {} failed in {:?}",
            report.succeeded(),
            report.failed(),
            started.elapsed()
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{AssetCache, AssetLoader};
    use crate::render::EngineOptions;

    fn renderer(options: BatchOptions) -> BatchRenderer {
        let loader = AssetLoader::new(reqwest::Client::new(), Duration::from_secs(2));
        let engine = ReportEngine::new(Arc::new(AssetCache::new(loader)), EngineOptions::default());
        BatchRenderer::new(Arc::new(engine), options)
    }

    fn record(slug: &str) -> AuditRecord {
        AuditRecord {
            name: slug.to_uppercase(),
            slug: slug.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_outcomes_follow_input_order() {
        let renderer = renderer(BatchOptions {
            concurrency: 3,
            ..Default::default()
        });
        let records = ["a", "b", "c", "d", "e"].iter().map(|s| record(s)).collect();
        let report = renderer.run(records, OutputSink::Buffer).await;

        let slugs: Vec<&str> = report.outcomes.iter().map(|o| o.slug.as_str()).collect();
        assert_eq!(slugs, vec!["a", "b", "c", "d", "e"]);
        assert_eq!(report.succeeded(), 5);
        assert!(report.outcomes.iter().all(|o| o.job_id.starts_with("rpt_")));
    }

    #[tokio::test]
    async fn test_batch_writes_one_file_per_record() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = renderer(BatchOptions::default());
        let records = vec![record("alpha"), record("beta")];
        let report = renderer
            .run(records, OutputSink::File(dir.path().to_path_buf()))
            .await;

        assert_eq!(report.failed(), 0);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[tokio::test]
    async fn test_zero_timeout_fails_each_document() {
        let renderer = renderer(BatchOptions {
            concurrency: 2,
            render_timeout: Duration::ZERO,
        });
        let report = renderer.run(vec![record("a"), record("b")], OutputSink::Buffer).await;

        assert_eq!(report.failed(), 2);
        assert!(report
            .outcomes
            .iter()
            .all(|o| matches!(o.result, Err(RenderError::DeadlineExceeded))));
    }

    #[tokio::test]
    async fn test_cancelled_batch() {
        let renderer = renderer(BatchOptions::default());
        renderer.cancel_token().cancel();
        let report = renderer.run(vec![record("a"), record("b")], OutputSink::Buffer).await;

        assert_eq!(report.succeeded(), 0);
        assert!(report
            .outcomes
            .iter()
            .all(|o| matches!(o.result, Err(RenderError::Cancelled))));
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let report = renderer(BatchOptions::default())
            .run(Vec::new(), OutputSink::Buffer)
            .await;
        assert!(report.outcomes.is_empty());
        assert_eq!(report.failed(), 0);
    }
}
