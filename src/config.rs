//! Configuration for the upload → generate → download workflow.
//!
//! All endpoints and limits live in [`ClientConfig`], built via its
//! [`ClientConfigBuilder`]. The defaults point at the production services;
//! tests and staging setups override the URLs and usually inject their own
//! [`HttpTransport`].

use crate::error::VectorArtError;
use crate::id::{DOWNLOAD_ID_LENGTH, UPLOAD_ID_LENGTH};
use crate::progress::ProgressCallback;
use crate::transport::HttpTransport;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// The user every job is submitted for. Fixed at build time.
pub const DEFAULT_USER_ID: &str = "DObRu1vyStbUynoQmTcHBlhs55z2";

pub const DEFAULT_UPLOAD_SERVICE_URL: &str = "https://api.chromastudio.ai";
pub const DEFAULT_CONTENT_DOMAIN: &str = "https://contents.maxstudio.ai";
pub const DEFAULT_JOB_SERVICE_URL: &str = "https://api.chromastudio.ai/image-gen";
pub const DEFAULT_DOWNLOAD_PROXY_URL: &str = "https://api.chromastudio.ai/download-proxy";

/// Configuration for a [`crate::workflow::Workflow`].
///
/// Built via [`ClientConfig::builder()`] or using [`ClientConfig::default()`].
///
/// # Example
/// ```rust
/// use vector_art_client::ClientConfig;
/// use std::time::Duration;
///
/// let config = ClientConfig::builder()
///     .poll_interval(Duration::from_millis(500))
///     .max_polls(20)
///     .output_dir("out")
///     .build()
///     .unwrap();
/// assert_eq!(config.max_polls, 20);
/// ```
#[derive(Clone)]
pub struct ClientConfig {
    /// Base URL of the service that issues signed upload URLs.
    pub upload_service_url: String,

    /// Public domain uploaded objects are served from.
    ///
    /// The uploaded URL is `<content_domain>/<object name>`; no request is
    /// made to learn it.
    pub content_domain: String,

    /// Base URL of the image-generation job service.
    pub job_service_url: String,

    /// Endpoint that re-serves a result URL from a trusted origin.
    pub download_proxy_url: String,

    /// User identifier sent with every job and used in status URLs.
    pub user_id: String,

    /// `model` field of the generation request. Default: `image-effects`.
    pub model: String,

    /// `toolType` field of the generation request. Default: `image-effects`.
    pub tool_type: String,

    /// `effectId` field of the generation request. Default: `photoToVectorArt`.
    pub effect_id: String,

    /// Fixed wait between two status checks. Default: 2 s.
    pub poll_interval: Duration,

    /// Maximum number of status checks before giving up. Default: 60.
    ///
    /// With the default interval this caps the wait at about two minutes.
    pub max_polls: u32,

    /// Length of the random identifier in uploaded object names. Default: 21.
    pub upload_id_length: usize,

    /// Length of the random identifier in saved filenames. Default: 8.
    pub download_id_length: usize,

    /// Saved filename prefix. Default: `vector_art_`.
    pub download_prefix: String,

    /// Saved filename extension (without the dot). Default: `png`.
    pub download_extension: String,

    /// Directory downloaded artifacts are written to. Default: `.`.
    pub output_dir: PathBuf,

    /// Per-request timeout for the default transport in seconds. Default: 60.
    pub request_timeout_secs: u64,

    /// Pre-constructed transport. When `None` a [`crate::transport::ReqwestTransport`]
    /// is built from `request_timeout_secs`.
    pub transport: Option<Arc<dyn HttpTransport>>,

    /// Receives status transitions and notices.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            upload_service_url: DEFAULT_UPLOAD_SERVICE_URL.to_string(),
            content_domain: DEFAULT_CONTENT_DOMAIN.to_string(),
            job_service_url: DEFAULT_JOB_SERVICE_URL.to_string(),
            download_proxy_url: DEFAULT_DOWNLOAD_PROXY_URL.to_string(),
            user_id: DEFAULT_USER_ID.to_string(),
            model: "image-effects".to_string(),
            tool_type: "image-effects".to_string(),
            effect_id: "photoToVectorArt".to_string(),
            poll_interval: Duration::from_secs(2),
            max_polls: 60,
            upload_id_length: UPLOAD_ID_LENGTH,
            download_id_length: DOWNLOAD_ID_LENGTH,
            download_prefix: "vector_art_".to_string(),
            download_extension: "png".to_string(),
            output_dir: PathBuf::from("."),
            request_timeout_secs: 60,
            transport: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("upload_service_url", &self.upload_service_url)
            .field("content_domain", &self.content_domain)
            .field("job_service_url", &self.job_service_url)
            .field("download_proxy_url", &self.download_proxy_url)
            .field("effect_id", &self.effect_id)
            .field("poll_interval", &self.poll_interval)
            .field("max_polls", &self.max_polls)
            .field("output_dir", &self.output_dir)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("transport", &self.transport.as_ref().map(|_| "<dyn HttpTransport>"))
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn WorkflowProgressCallback>"),
            )
            .finish()
    }
}

impl ClientConfig {
    /// Create a new builder for `ClientConfig`.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder {
            config: Self::default(),
        }
    }

    /// Upper bound on the time spent polling one job.
    pub fn poll_budget(&self) -> Duration {
        self.poll_interval.saturating_mul(self.max_polls)
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn upload_service_url(mut self, url: impl Into<String>) -> Self {
        self.config.upload_service_url = trim_slash(url.into());
        self
    }

    pub fn content_domain(mut self, url: impl Into<String>) -> Self {
        self.config.content_domain = trim_slash(url.into());
        self
    }

    pub fn job_service_url(mut self, url: impl Into<String>) -> Self {
        self.config.job_service_url = trim_slash(url.into());
        self
    }

    pub fn download_proxy_url(mut self, url: impl Into<String>) -> Self {
        self.config.download_proxy_url = url.into();
        self
    }

    pub fn user_id(mut self, user_id: impl Into<String>) -> Self {
        self.config.user_id = user_id.into();
        self
    }

    pub fn effect_id(mut self, effect_id: impl Into<String>) -> Self {
        self.config.effect_id = effect_id.into();
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    pub fn max_polls(mut self, n: u32) -> Self {
        self.config.max_polls = n;
        self
    }

    pub fn upload_id_length(mut self, n: usize) -> Self {
        self.config.upload_id_length = n;
        self
    }

    pub fn download_id_length(mut self, n: usize) -> Self {
        self.config.download_id_length = n;
        self
    }

    pub fn download_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.download_prefix = prefix.into();
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs.max(1);
        self
    }

    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.config.transport = Some(transport);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ClientConfig, VectorArtError> {
        let c = &self.config;
        for (name, url) in [
            ("upload service URL", &c.upload_service_url),
            ("content domain", &c.content_domain),
            ("job service URL", &c.job_service_url),
            ("download proxy URL", &c.download_proxy_url),
        ] {
            if reqwest::Url::parse(url).is_err() {
                return Err(VectorArtError::InvalidConfig(format!(
                    "{name} is not a valid URL: '{url}'"
                )));
            }
        }
        if c.user_id.is_empty() {
            return Err(VectorArtError::InvalidConfig("User id must not be empty".into()));
        }
        if c.max_polls == 0 {
            return Err(VectorArtError::InvalidConfig("Max polls must be ≥ 1".into()));
        }
        if c.upload_id_length == 0 || c.download_id_length == 0 {
            return Err(VectorArtError::InvalidConfig(
                "Identifier lengths must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

fn trim_slash(url: String) -> String {
    url.trim_end_matches('/').to_string()
}
