use std::sync::Arc;

use chrono::Utc;
use tokio::time::{timeout_at, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::assets::{logo_candidates, AssetCache};
use crate::layout::Geometry;
use crate::types::{AuditRecord, RenderError};

use super::document::{asset_keys, layout_document, DocumentOptions};
use super::sink::{report_filename, OutputSink, RenderOutput};
use super::writer::write_pdf;

/// Engine-wide settings shared by every render
#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub org_tag: String,
    pub org_name: String,
    /// Base URL or directory logos are looked up under by slug
    pub logo_base: Option<String>,
    pub font_regular: Option<String>,
    pub font_bold: Option<String>,
    pub prefetch_concurrency: usize,
    pub geometry: Geometry,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            org_tag: "AUDIT".to_string(),
            org_name: "Security Audit Team".to_string(),
            logo_base: None,
            font_regular: None,
            font_bold: None,
            prefetch_concurrency: 8,
            geometry: Geometry::default(),
        }
    }
}

/// Renders audit records to PDF.
///
/// Holds the process-wide asset cache; one engine serves any number of
/// concurrent renders.
pub struct ReportEngine {
    assets: Arc<AssetCache>,
    options: EngineOptions,
}

impl ReportEngine {
    pub fn new(assets: Arc<AssetCache>, options: EngineOptions) -> Self {
        Self { assets, options }
    }

    pub fn assets(&self) -> &Arc<AssetCache> {
        &self.assets
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    fn document_options(&self, record: &AuditRecord) -> DocumentOptions {
        let logo_keys = match (record.logo.as_deref(), self.options.logo_base.as_deref()) {
            (Some(logo), _) if !logo.trim().is_empty() => vec![logo.trim().to_string()],
            (_, Some(base)) => logo_candidates(base, &record.slug),
            _ => Vec::new(),
        };
        DocumentOptions {
            org_name: self.options.org_name.clone(),
            geometry: self.options.geometry,
            generated: Utc::now(),
            logo_keys,
            font_regular: self.options.font_regular.clone(),
            font_bold: self.options.font_bold.clone(),
        }
    }

    /// Render `record` into `sink`, giving up at `deadline`
    pub async fn render(
        &self,
        record: &AuditRecord,
        sink: &OutputSink,
        deadline: Instant,
    ) -> Result<RenderOutput, RenderError> {
        self.render_with_cancel(record, sink, deadline, &CancellationToken::new())
            .await
    }

    /// Like `render`, also aborting when `cancel` fires.
    ///
    /// Nothing reaches the sink unless the whole document was produced
    /// before the deadline.
    pub async fn render_with_cancel(
        &self,
        record: &AuditRecord,
        sink: &OutputSink,
        deadline: Instant,
        cancel: &CancellationToken,
    ) -> Result<RenderOutput, RenderError> {
        let started = Instant::now();
        let options = self.document_options(record);
        info!("Rendering report for {}", record.slug);

        // Phase 1: resolve every asset concurrently
        let keys = asset_keys(record, &options);
        let prefetch = self.assets.prefetch(&keys, self.options.prefetch_concurrency);
        let resolved = guarded(prefetch, deadline, cancel).await?;
        debug!("Prefetched {}/{} assets for {}", resolved, keys.len(), record.slug);
        let snapshot = self.assets.snapshot(&keys);

        // Phase 2: sequential layout and serialization off the runtime
        let record_owned = record.clone();
        let std_deadline = deadline.into_std();
        let token = cancel.clone();
        let job = tokio::task::spawn_blocking(move || {
            let mut checkpoint = || {
                if token.is_cancelled() {
                    return Err(RenderError::Cancelled);
                }
                if std::time::Instant::now() >= std_deadline {
                    return Err(RenderError::DeadlineExceeded);
                }
                Ok(())
            };
            let document = layout_document(&record_owned, &snapshot, &options, &mut checkpoint)?;
            let bytes = write_pdf(&document)?;
            checkpoint()?;
            Ok::<_, RenderError>((document.page_count(), document.info.created, bytes))
        });
        let (pages, created, bytes) = guarded(job, deadline, cancel)
            .await?
            .map_err(|e| RenderError::Internal(format!("render task failed: {}", e)))??;

        // Phase 3: emit
        let filename = report_filename(created.date_naive(), &self.options.org_tag, &record.slug);
        let output = sink.emit(&filename, bytes).await?;

        info!(
            "Rendered {}: {} pages, {} bytes in {:?}",
            record.slug,
            pages,
            output.len(),
            started.elapsed()
        );
        Ok(output)
    }
}

/// Await `fut` unless the deadline passes or `cancel` fires first
async fn guarded<F: std::future::Future>(
    fut: F,
    deadline: Instant,
    cancel: &CancellationToken,
) -> Result<F::Output, RenderError> {
    tokio::select! {
        result = timeout_at(deadline, fut) => result.map_err(|_| RenderError::DeadlineExceeded),
        _ = cancel.cancelled() => Err(RenderError::Cancelled),
    }
}
