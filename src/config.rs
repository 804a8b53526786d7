use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::render::{BatchOptions, EngineOptions};

/// Application configuration, read from the environment (and `.env`)
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory of `*.json` audit records to render
    pub input_dir: PathBuf,
    /// Directory reports are written to
    pub output_dir: PathBuf,
    /// Organisation tag used in output filenames
    pub org_tag: String,
    /// Organisation name shown on the cover and in footers
    pub org_name: String,
    /// Local directory relative asset keys resolve against
    pub asset_dir: Option<PathBuf>,
    /// Base URL or directory for slug-derived logos
    pub logo_base: Option<String>,
    pub font_regular: Option<String>,
    pub font_bold: Option<String>,
    /// On-disk cache for remote assets (optional)
    pub asset_cache_dir: Option<PathBuf>,
    pub fetch_timeout: Duration,
    pub render_timeout: Duration,
    pub batch_concurrency: usize,
    pub prefetch_concurrency: usize,
}

fn optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parsed<T>(name: &str, default: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .with_context(|| format!("invalid {}", name))
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let batch_concurrency: usize = parsed("BATCH_CONCURRENCY", "4")?;
        let prefetch_concurrency: usize = parsed("PREFETCH_CONCURRENCY", "8")?;
        if batch_concurrency == 0 || prefetch_concurrency == 0 {
            anyhow::bail!("concurrency settings must be at least 1");
        }

        Ok(Self {
            input_dir: env::var("INPUT_DIR")
                .unwrap_or_else(|_| "./records".to_string())
                .into(),

            output_dir: env::var("OUTPUT_DIR")
                .unwrap_or_else(|_| "./reports".to_string())
                .into(),

            org_tag: env::var("ORG_TAG").unwrap_or_else(|_| "AUDIT".to_string()),

            org_name: env::var("ORG_NAME").unwrap_or_else(|_| "Security Audit Team".to_string()),

            asset_dir: optional("ASSET_DIR").map(PathBuf::from),

            logo_base: optional("LOGO_BASE"),

            font_regular: optional("FONT_REGULAR"),
            font_bold: optional("FONT_BOLD"),

            asset_cache_dir: optional("ASSET_CACHE_DIR").map(PathBuf::from),

            fetch_timeout: Duration::from_secs(parsed("FETCH_TIMEOUT_SECS", "10")?),

            render_timeout: Duration::from_secs(parsed("RENDER_TIMEOUT_SECS", "60")?),

            batch_concurrency,
            prefetch_concurrency,
        })
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            org_tag: self.org_tag.clone(),
            org_name: self.org_name.clone(),
            logo_base: self.logo_base.clone(),
            font_regular: self.font_regular.clone(),
            font_bold: self.font_bold.clone(),
            prefetch_concurrency: self.prefetch_concurrency,
            ..Default::default()
        }
    }

    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            concurrency: self.batch_concurrency,
            render_timeout: self.render_timeout,
        }
    }
}
