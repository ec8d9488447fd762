//! Fetch a result and save it as a local file.
//!
//! ## Strategy Chain
//!
//! Result URLs live on a third-party CDN that does not always allow direct
//! fetches, so retrieval is an ordered list of [`DownloadStrategy`]s, each
//! tried only after the previous one failed:
//!
//! 1. [`ProxyStrategy`]: `GET <download-proxy>?url=<result>`
//! 2. [`DirectStrategy`]: `GET <result>?t=<millis>` (cache-busted)
//!
//! The first success wins. When every strategy has failed the chain ends
//! with [`VectorArtError::DownloadFailed`], whose message asks the user to
//! save the image manually. Opening or redirecting to the remote URL is not
//! a tier of this chain and is never attempted.
//!
//! ## Saving
//!
//! Bytes are written to a [`tempfile::NamedTempFile`] inside the output
//! directory and then persisted under the final name, so a partially written
//! artifact never appears under its real name. If anything fails the
//! temporary file is dropped and removed.

use crate::config::ClientConfig;
use crate::error::{DownloadError, VectorArtError};
use crate::id::generate_id;
use crate::output::{SavedArtifact, StrategyKind};
use crate::transport::{HttpRequest, HttpTransport};
use async_trait::async_trait;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{info, warn};

/// One way of retrieving the bytes behind a result URL.
#[async_trait]
pub trait DownloadStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// Fetch the artifact at `url`.
    async fn fetch(&self, transport: &dyn HttpTransport, url: &str) -> Result<Vec<u8>, DownloadError>;
}

/// Fetch through the same-origin download proxy.
#[derive(Debug, Clone)]
pub struct ProxyStrategy {
    pub proxy_url: String,
}

impl ProxyStrategy {
    pub fn new(proxy_url: impl Into<String>) -> Self {
        Self {
            proxy_url: proxy_url.into(),
        }
    }

    /// `<proxy>?url=<encoded target>`.
    pub fn request_url(&self, target: &str) -> Result<String, DownloadError> {
        reqwest::Url::parse_with_params(&self.proxy_url, &[("url", target)])
            .map(String::from)
            .map_err(|e| DownloadError::Proxy {
                detail: format!("invalid proxy URL: {e}"),
            })
    }
}

#[async_trait]
impl DownloadStrategy for ProxyStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Proxy
    }

    async fn fetch(&self, transport: &dyn HttpTransport, url: &str) -> Result<Vec<u8>, DownloadError> {
        let request_url = self.request_url(url)?;
        fetch_bytes(transport, &request_url)
            .await
            .map_err(|detail| DownloadError::Proxy { detail })
    }
}

/// Fetch the result URL itself, bypassing caches.
#[derive(Debug, Clone, Default)]
pub struct DirectStrategy;

impl DirectStrategy {
    /// `target` with a `t=<cache_buster>` query pair appended.
    pub fn request_url(target: &str, cache_buster: u128) -> Result<String, DownloadError> {
        let mut url = reqwest::Url::parse(target).map_err(|e| DownloadError::Direct {
            detail: format!("invalid result URL: {e}"),
        })?;
        url.query_pairs_mut()
            .append_pair("t", &cache_buster.to_string());
        Ok(url.into())
    }
}

#[async_trait]
impl DownloadStrategy for DirectStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Direct
    }

    async fn fetch(&self, transport: &dyn HttpTransport, url: &str) -> Result<Vec<u8>, DownloadError> {
        let request_url = Self::request_url(url, now_millis())?;
        fetch_bytes(transport, &request_url)
            .await
            .map_err(|detail| DownloadError::Direct { detail })
    }
}

/// An ordered chain of download strategies.
pub struct Downloader {
    strategies: Vec<Box<dyn DownloadStrategy>>,
}

impl Downloader {
    pub fn new(strategies: Vec<Box<dyn DownloadStrategy>>) -> Self {
        Self { strategies }
    }

    /// Proxy first, then direct.
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(vec![
            Box::new(ProxyStrategy::new(&config.download_proxy_url)),
            Box::new(DirectStrategy),
        ])
    }

    /// Try each strategy in order until one returns the bytes.
    ///
    /// `on_fallback` is called for every failed strategy that has a
    /// successor. When all of them fail the collected errors are returned
    /// inside [`VectorArtError::DownloadFailed`].
    pub async fn fetch<F>(
        &self,
        transport: &dyn HttpTransport,
        url: &str,
        mut on_fallback: F,
    ) -> Result<(StrategyKind, Vec<u8>), VectorArtError>
    where
        F: FnMut(&DownloadError),
    {
        let mut attempts = Vec::with_capacity(self.strategies.len());

        for (i, strategy) in self.strategies.iter().enumerate() {
            match strategy.fetch(transport, url).await {
                Ok(bytes) => return Ok((strategy.kind(), bytes)),
                Err(e) => {
                    warn!("{:?} download of {} failed: {}", strategy.kind(), url, e);
                    if i + 1 < self.strategies.len() {
                        on_fallback(&e);
                    }
                    attempts.push(e);
                }
            }
        }

        // Terminal: the remote URL is never opened directly.
        Err(VectorArtError::DownloadFailed {
            url: url.to_string(),
            attempts,
        })
    }
}

/// `<prefix><id>.<extension>`, e.g. `vector_art_Ab3dE9xZ.png`.
pub fn artifact_name(config: &ClientConfig) -> String {
    format!(
        "{}{}.{}",
        config.download_prefix,
        generate_id(config.download_id_length),
        config.download_extension
    )
}

/// Fetch `url` through the configured chain and save it under a fresh name.
pub async fn download<F>(
    transport: &dyn HttpTransport,
    url: &str,
    config: &ClientConfig,
    on_fallback: F,
) -> Result<SavedArtifact, VectorArtError>
where
    F: FnMut(&DownloadError),
{
    let (strategy, bytes) = Downloader::from_config(config)
        .fetch(transport, url, on_fallback)
        .await?;

    let file_name = artifact_name(config);
    let size_bytes = bytes.len();
    let path = save_artifact(&config.output_dir, &file_name, bytes).await?;
    info!("Saved {} ({} bytes via {:?})", path.display(), size_bytes, strategy);

    Ok(SavedArtifact {
        path,
        file_name,
        size_bytes,
        strategy,
        source_url: url.to_string(),
    })
}

/// Write `bytes` to `<dir>/<file_name>` via a temporary file.
pub async fn save_artifact(dir: &Path, file_name: &str, bytes: Vec<u8>) -> Result<PathBuf, VectorArtError> {
    let dir = dir.to_path_buf();
    let target = dir.join(file_name);
    tokio::task::spawn_blocking(move || match write_atomically(&dir, &target, &bytes) {
        Ok(()) => Ok(target),
        Err(source) => Err(VectorArtError::OutputWriteFailed {
            path: target,
            source,
        }),
    })
    .await
    .map_err(|e| VectorArtError::Internal(format!("save task panicked: {e}")))?
}

fn write_atomically(dir: &Path, target: &Path, bytes: &[u8]) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.flush()?;
    tmp.persist(target).map_err(|e| e.error)?;
    Ok(())
}

async fn fetch_bytes(transport: &dyn HttpTransport, url: &str) -> Result<Vec<u8>, String> {
    let response = transport
        .send(HttpRequest::get(url))
        .await
        .map_err(|e| e.to_string())?;
    if !response.is_success() {
        return Err(format!("{} (HTTP {})", response.status_text, response.status));
    }
    if response.body.is_empty() {
        return Err("empty response body".to_string());
    }
    Ok(response.body)
}

fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedTransport;
    use crate::transport::{HttpResponse, Method};

    const PROXY: &str = "https://api.test/download-proxy";
    const RESULT: &str = "https://cdn.test/x.png";

    fn config(dir: &Path) -> ClientConfig {
        ClientConfig::builder()
            .download_proxy_url(PROXY)
            .output_dir(dir)
            .build()
            .unwrap()
    }

    #[test]
    fn proxy_url_encodes_target() {
        let url = ProxyStrategy::new(PROXY)
            .request_url("https://cdn.test/x.png?sig=a&b=c")
            .unwrap();
        assert_eq!(
            url,
            "https://api.test/download-proxy?url=https%3A%2F%2Fcdn.test%2Fx.png%3Fsig%3Da%26b%3Dc"
        );
    }

    #[test]
    fn direct_url_appends_cache_buster() {
        assert_eq!(
            DirectStrategy::request_url(RESULT, 1700000000000).unwrap(),
            "https://cdn.test/x.png?t=1700000000000"
        );
        assert_eq!(
            DirectStrategy::request_url("https://cdn.test/x.png?sig=1", 5).unwrap(),
            "https://cdn.test/x.png?sig=1&t=5"
        );
        assert!(DirectStrategy::request_url("not a url", 5).is_err());
    }

    #[test]
    fn artifact_name_shape() {
        let cfg = ClientConfig::default();
        let name = artifact_name(&cfg);
        let id = name
            .strip_prefix("vector_art_")
            .and_then(|s| s.strip_suffix(".png"))
            .unwrap();
        assert_eq!(id.len(), 8);
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn default_chain_order() {
        let d = Downloader::from_config(&ClientConfig::default());
        let kinds: Vec<_> = d.strategies.iter().map(|s| s.kind()).collect();
        assert_eq!(kinds, vec![StrategyKind::Proxy, StrategyKind::Direct]);
    }

    #[tokio::test]
    async fn proxy_success_short_circuits() {
        let dir = tempfile::tempdir().unwrap();
        let t = ScriptedTransport::new()
            .reply(Method::GET, PROXY, HttpResponse::ok(b"PNGDATA".to_vec()))
            .reply(Method::GET, RESULT, HttpResponse::ok(b"DIRECT".to_vec()));

        let mut fallbacks = 0;
        let saved = download(&t, RESULT, &config(dir.path()), |_| fallbacks += 1)
            .await
            .unwrap();

        assert_eq!(saved.strategy, StrategyKind::Proxy);
        assert_eq!(fallbacks, 0);
        assert_eq!(t.count(&Method::GET, RESULT), 0);
        assert_eq!(std::fs::read(&saved.path).unwrap(), b"PNGDATA");
    }

    #[tokio::test]
    async fn proxy_failure_falls_back_to_direct() {
        let dir = tempfile::tempdir().unwrap();
        let t = ScriptedTransport::new()
            .reply(Method::GET, PROXY, HttpResponse::status(502))
            .reply(Method::GET, RESULT, HttpResponse::ok(b"DIRECT".to_vec()));

        let mut errors = Vec::new();
        let saved = download(&t, RESULT, &config(dir.path()), |e| errors.push(e.clone()))
            .await
            .unwrap();

        assert_eq!(saved.strategy, StrategyKind::Direct);
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], DownloadError::Proxy { .. }));
        assert_eq!(std::fs::read(&saved.path).unwrap(), b"DIRECT");
    }

    #[tokio::test]
    async fn both_failing_is_manual_save_error_without_extra_requests() {
        let dir = tempfile::tempdir().unwrap();
        let t = ScriptedTransport::new()
            .fail(Method::GET, PROXY, "connection refused")
            .reply(Method::GET, RESULT, HttpResponse::status(403));

        let mut fallbacks = 0;
        let err = download(&t, RESULT, &config(dir.path()), |_| fallbacks += 1)
            .await
            .unwrap_err();
        assert_eq!(fallbacks, 1);
        match &err {
            VectorArtError::DownloadFailed { url, attempts } => {
                assert_eq!(url, RESULT);
                assert_eq!(attempts.len(), 2);
                assert!(matches!(attempts[1], DownloadError::Direct { .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(t.request_count(), 2);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn empty_body_counts_as_failure() {
        let dir = tempfile::tempdir().unwrap();
        let t = ScriptedTransport::new()
            .reply(Method::GET, PROXY, HttpResponse::ok(Vec::new()))
            .reply(Method::GET, RESULT, HttpResponse::ok(b"DIRECT".to_vec()));
        let saved = download(&t, RESULT, &config(dir.path()), |_| {}).await.unwrap();
        assert_eq!(saved.strategy, StrategyKind::Direct);
    }

    #[tokio::test]
    async fn save_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b");
        let path = save_artifact(&nested, "out.png", b"x".to_vec()).await.unwrap();
        assert_eq!(path, nested.join("out.png"));
        assert_eq!(std::fs::read_dir(&nested).unwrap().count(), 1);
    }
}
