use std::path::{Path, PathBuf};
use std::time::Duration;

use base64::Engine;
use sha2::{Digest, Sha256};
use tokio::fs;
use tracing::{debug, warn};

use crate::types::AssetError;

use super::bundled::{self, BUNDLED_PREFIX};

/// Resolves asset keys to bytes.
///
/// Keys may be bundled names (`bundled:pass`), `data:` URIs, HTTP(S) URLs,
/// `file://` URLs or filesystem paths (relative paths resolve under
/// `asset_dir`).
pub struct AssetLoader {
    http_client: reqwest::Client,
    asset_dir: Option<PathBuf>,
    disk_cache: Option<PathBuf>,
    fetch_timeout: Duration,
}

impl AssetLoader {
    pub fn new(http_client: reqwest::Client, fetch_timeout: Duration) -> Self {
        Self {
            http_client,
            asset_dir: None,
            disk_cache: None,
            fetch_timeout,
        }
    }

    pub fn with_asset_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.asset_dir = dir;
        self
    }

    /// Persist remote fetches under `dir`, content-addressed by key
    pub fn with_disk_cache(mut self, dir: Option<PathBuf>) -> Self {
        self.disk_cache = dir;
        self
    }

    /// Load one asset, bounded by the fetch timeout
    pub async fn load(&self, key: &str) -> Result<Vec<u8>, AssetError> {
        match tokio::time::timeout(self.fetch_timeout, self.load_inner(key)).await {
            Ok(result) => result,
            Err(_) => Err(AssetError::Timeout(self.fetch_timeout.as_secs())),
        }
    }

    async fn load_inner(&self, key: &str) -> Result<Vec<u8>, AssetError> {
        if let Some(name) = key.strip_prefix(BUNDLED_PREFIX) {
            return bundled::lookup(name)
                .map(<[u8]>::to_vec)
                .ok_or_else(|| AssetError::NotFound(key.to_string()));
        }

        if let Some(content) = key.strip_prefix("data:") {
            return parse_data_uri(content);
        }

        if key.starts_with("http://") || key.starts_with("https://") {
            return self.fetch_remote(key).await;
        }

        let path = match key.strip_prefix("file://") {
            Some(path) => PathBuf::from(path),
            None => self.resolve_path(key),
        };
        read_file(&path).await
    }

    fn resolve_path(&self, key: &str) -> PathBuf {
        let path = Path::new(key);
        match &self.asset_dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.to_path_buf(),
        }
    }

    async fn fetch_remote(&self, url: &str) -> Result<Vec<u8>, AssetError> {
        let cached_path = self.disk_cache.as_ref().map(|dir| dir.join(cache_file_name(url)));

        if let Some(path) = &cached_path {
            if let Ok(bytes) = fs::read(path).await {
                debug!("Disk cache hit for {}", url);
                return Ok(bytes);
            }
        }

        debug!("Fetching asset {}", url);
        let response = self.http_client.get(url).send().await?;
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(AssetError::NotFound(url.to_string()));
        }
        if !status.is_success() {
            return Err(AssetError::Http(format!("HTTP {} for {}", status, url)));
        }
        let bytes = response.bytes().await?.to_vec();

        if let Some(path) = &cached_path {
            if let Err(e) = write_cache_file(path, &bytes).await {
                warn!("Failed to persist {} to disk cache: {}", url, e);
            }
        }

        Ok(bytes)
    }
}

async fn read_file(path: &Path) -> Result<Vec<u8>, AssetError> {
    fs::read(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            AssetError::NotFound(path.display().to_string())
        } else {
            AssetError::Io(e)
        }
    })
}

async fn write_cache_file(path: &Path, bytes: &[u8]) -> Result<(), std::io::Error> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!(".{}.{}.part", name, uuid::Uuid::new_v4().simple()));
    fs::write(&tmp, bytes).await?;
    fs::rename(&tmp, path).await
}

/// Stable file name for a remote key
fn cache_file_name(key: &str) -> String {
    hex::encode(Sha256::digest(key.as_bytes()))
}

/// Decode the part of a data URI after `data:`
fn parse_data_uri(content: &str) -> Result<Vec<u8>, AssetError> {
    let (header, payload) = content
        .split_once(',')
        .ok_or_else(|| AssetError::InvalidDataUri("missing ',' separator".to_string()))?;

    if header.ends_with(";base64") {
        base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|e| AssetError::InvalidDataUri(e.to_string()))
    } else {
        Ok(urlencoding::decode_binary(payload.as_bytes()).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn loader() -> AssetLoader {
        AssetLoader::new(reqwest::Client::new(), Duration::from_secs(2))
    }

    #[tokio::test]
    async fn test_bundled_key() {
        let bytes = loader().load("bundled:pass").await.unwrap();
        assert!(bytes.starts_with(b"\x89PNG"));
        assert!(matches!(
            loader().load("bundled:nope").await,
            Err(AssetError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_data_uri_base64() {
        let encoded = base64::engine::general_purpose::STANDARD.encode(b"hello");
        let key = format!("data:text/plain;base64,{}", encoded);
        assert_eq!(loader().load(&key).await.unwrap(), b"hello");
    }

    #[tokio::test]
    async fn test_data_uri_without_separator() {
        assert!(matches!(
            loader().load("data:broken").await,
            Err(AssetError::InvalidDataUri(_))
        ));
    }

    #[tokio::test]
    async fn test_relative_path_under_asset_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("logo.png"), b"png-bytes").unwrap();
        let loader = loader().with_asset_dir(Some(dir.path().to_path_buf()));
        assert_eq!(loader.load("logo.png").await.unwrap(), b"png-bytes");
        assert!(matches!(
            loader.load("missing.png").await,
            Err(AssetError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_http_fetch_and_disk_cache() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/logo.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"remote".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let cache = tempfile::tempdir().unwrap();
        let url = format!("{}/logo.png", server.uri());

        let first = loader().with_disk_cache(Some(cache.path().to_path_buf()));
        assert_eq!(first.load(&url).await.unwrap(), b"remote");

        // A fresh loader reads the persisted copy instead of the network
        let second = loader().with_disk_cache(Some(cache.path().to_path_buf()));
        assert_eq!(second.load(&url).await.unwrap(), b"remote");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_loaders_sharing_disk_cache_write_concurrently() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![7u8; 8192]))
            .mount(&server)
            .await;

        let cache = tempfile::tempdir().unwrap();
        let url = format!("{}/shared.png", server.uri());

        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..8 {
            let loader = loader().with_disk_cache(Some(cache.path().to_path_buf()));
            let url = url.clone();
            tasks.spawn(async move { loader.load(&url).await });
        }
        while let Some(result) = tasks.join_next().await {
            assert_eq!(result.unwrap().unwrap().len(), 8192);
        }

        let names: Vec<String> = std::fs::read_dir(cache.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec![cache_file_name(&url)]);
        let persisted = std::fs::read(cache.path().join(cache_file_name(&url))).unwrap();
        assert_eq!(persisted, vec![7u8; 8192]);
    }

    #[tokio::test]
    async fn test_http_404_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let url = format!("{}/missing.png", server.uri());
        assert!(matches!(
            loader().load(&url).await,
            Err(AssetError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_slow_fetch_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(b"late".to_vec())
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let loader = AssetLoader::new(reqwest::Client::new(), Duration::from_millis(200));
        let url = format!("{}/slow.png", server.uri());
        assert!(matches!(loader.load(&url).await, Err(AssetError::Timeout(_))));
    }
}
