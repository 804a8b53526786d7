use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

use auditpress::assets::{AssetCache, AssetLoader};
use auditpress::config::Config;
use auditpress::render::{BatchRenderer, OutputSink, ReportEngine};
use auditpress::types::AuditRecord;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("auditpress=debug".parse()?),
        )
        .json()
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    info!("Starting auditpress v{}", env!("CARGO_PKG_VERSION"));
    info!("Input: {}", config.input_dir.display());
    info!("Output: {}", config.output_dir.display());
    info!(
        "Asset cache: {}",
        config
            .asset_cache_dir
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "memory only".to_string())
    );

    let (records, invalid) = load_records(&config.input_dir).await?;
    if records.is_empty() && invalid == 0 {
        info!("No records to render");
        return Ok(());
    }

    let http_client = reqwest::Client::builder()
        .timeout(config.fetch_timeout)
        .build()?;
    let loader = AssetLoader::new(http_client, config.fetch_timeout)
        .with_asset_dir(config.asset_dir.clone())
        .with_disk_cache(config.asset_cache_dir.clone());
    let engine = Arc::new(ReportEngine::new(
        Arc::new(AssetCache::new(loader)),
        config.engine_options(),
    ));

    let renderer = BatchRenderer::new(engine, config.batch_options());
    let cancel = renderer.cancel_token();
    tokio::spawn(async move {
        shutdown_signal().await;
        cancel.cancel();
    });

    let report = renderer
        .run(records, OutputSink::File(config.output_dir.clone()))
        .await;

    for outcome in &report.outcomes {
        match &outcome.result {
            Ok(output) => info!("{} {}: {} bytes", outcome.job_id, outcome.slug, output.len()),
            Err(e) => error!("{} {}: {}", outcome.job_id, outcome.slug, e),
        }
    }

    let failed = report.failed() + invalid;
    info!(
        "Done: {} rendered, {} failed",
        report.succeeded(),
        failed
    );
    if failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}

/// Parse every `*.json` file in `dir`, sorted by name. Invalid records are
/// logged and counted, never fatal.
async fn load_records(dir: &Path) -> Result<(Vec<AuditRecord>, usize)> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .with_context(|| format!("cannot read input directory {}", dir.display()))?;

    let mut paths = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some("json") {
            paths.push(path);
        }
    }
    paths.sort();

    let mut records = Vec::with_capacity(paths.len());
    let mut invalid = 0;
    for path in paths {
        let parsed = match tokio::fs::read_to_string(&path).await {
            Ok(json) => AuditRecord::from_json(&json),
            Err(e) => Err(e.into()),
        };
        match parsed {
            Ok(record) => records.push(record),
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                invalid += 1;
            }
        }
    }
    info!("Loaded {} records ({} invalid)", records.len(), invalid);
    Ok((records, invalid))
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, cancelling remaining renders...");
        }
        _ = terminate => {
            info!("Received SIGTERM, cancelling remaining renders...");
        }
    }
}
