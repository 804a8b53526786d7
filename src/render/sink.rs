use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tokio::fs;
use tracing::debug;

use crate::types::RenderError;

/// Where a finished document goes
#[derive(Debug, Clone)]
pub enum OutputSink {
    /// Write `{YYYYMMDD}_{ORG}_{slug}_Audit.pdf` under the directory
    File(PathBuf),
    /// Hand the bytes back to the caller
    Buffer,
}

/// What a sink produced
#[derive(Debug, Clone)]
pub enum RenderOutput {
    File { path: PathBuf, bytes: usize },
    Buffer(Vec<u8>),
}

impl RenderOutput {
    pub fn len(&self) -> usize {
        match self {
            RenderOutput::File { bytes, .. } => *bytes,
            RenderOutput::Buffer(data) => data.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn sanitize(part: &str, fallback: &str) -> String {
    let cleaned: String = part
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect();
    if cleaned.is_empty() {
        fallback.to_string()
    } else {
        cleaned
    }
}

/// `{YYYYMMDD}_{ORG}_{slug}_Audit.pdf`, with path-unsafe characters replaced
pub fn report_filename(date: NaiveDate, org_tag: &str, slug: &str) -> String {
    format!(
        "{}_{}_{}_Audit.pdf",
        date.format("%Y%m%d"),
        sanitize(org_tag, "ORG"),
        sanitize(slug, "report")
    )
}

impl OutputSink {
    pub async fn emit(&self, filename: &str, bytes: Vec<u8>) -> Result<RenderOutput, RenderError> {
        match self {
            OutputSink::Buffer => Ok(RenderOutput::Buffer(bytes)),
            OutputSink::File(dir) => {
                let path = dir.join(filename);
                write_atomic(&path, &bytes).await?;
                debug!("Wrote {} ({} bytes)", path.display(), bytes.len());
                Ok(RenderOutput::File {
                    path,
                    bytes: bytes.len(),
                })
            }
        }
    }
}

/// Sibling of `path` no other writer will pick
fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.{}.part", name, uuid::Uuid::new_v4().simple()))
}

/// Write to a uniquely named temporary file and rename into place, so a
/// reader never sees a partial file and concurrent writers of the same name
/// never share one. The temporary file is removed on failure.
async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), RenderError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    let tmp = temp_path(path);

    let result = async {
        fs::write(&tmp, bytes).await?;
        fs::rename(&tmp, path).await
    }
    .await;

    if let Err(e) = result {
        let _ = fs::remove_file(&tmp).await;
        return Err(e.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_filename() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(
            report_filename(date, "AUDIT", "my-token"),
            "20240305_AUDIT_my-token_Audit.pdf"
        );
        assert_eq!(
            report_filename(date, "AUDIT", "../etc/passwd"),
            "20240305_AUDIT_---etc-passwd_Audit.pdf"
        );
        assert_eq!(report_filename(date, "", ""), "20240305_ORG_report_Audit.pdf");
    }

    #[tokio::test]
    async fn test_file_sink_leaves_no_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let sink = OutputSink::File(dir.path().join("out"));
        let output = sink.emit("report.pdf", b"%PDF-1.7".to_vec()).await.unwrap();

        let path = dir.path().join("out").join("report.pdf");
        assert!(matches!(&output, RenderOutput::File { path: p, bytes: 8 } if *p == path));
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.7");
        let leftovers = std::fs::read_dir(dir.path().join("out")).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writes_to_same_name() {
        let dir = tempfile::tempdir().unwrap();
        let sink = std::sync::Arc::new(OutputSink::File(dir.path().to_path_buf()));

        let mut tasks = tokio::task::JoinSet::new();
        for i in 0..8u8 {
            let sink = std::sync::Arc::clone(&sink);
            tasks.spawn(async move { sink.emit("same.pdf", vec![i; 4096]).await });
        }
        while let Some(result) = tasks.join_next().await {
            assert!(result.unwrap().is_ok());
        }

        // One complete winner, no stray temporaries
        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["same.pdf".to_string()]);
        let written = std::fs::read(dir.path().join("same.pdf")).unwrap();
        assert_eq!(written.len(), 4096);
        assert!(written.iter().all(|b| *b == written[0]));
    }

    #[test]
    fn test_temp_paths_are_unique_siblings() {
        let path = Path::new("/reports/a.pdf");
        let first = temp_path(path);
        let second = temp_path(path);
        assert_ne!(first, second);
        assert_eq!(first.parent(), path.parent());
        assert!(first.to_string_lossy().ends_with(".part"));
    }

    #[tokio::test]
    async fn test_buffer_sink_returns_bytes() {
        let output = OutputSink::Buffer.emit("ignored.pdf", vec![1, 2, 3]).await.unwrap();
        assert!(matches!(&output, RenderOutput::Buffer(b) if *b == vec![1, 2, 3]));
        assert_eq!(output.len(), 3);
    }
}
