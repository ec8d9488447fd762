//! The workflow controller.
//!
//! [`Workflow`] owns the [`Session`] and drives the pipeline stages in
//! order: select + upload, generate (submit + poll + resolve), download.
//! Each operation takes `&mut self`, so one workflow can never run two
//! generations at once; the session additionally rejects a generate or
//! download issued while a job is still marked in flight.
//!
//! Every failed operation reports exactly one notice through
//! [`WorkflowProgressCallback::on_notice`], except [`VectorArtError::Busy`],
//! which is a silent no-op like a disabled button.

use crate::config::ClientConfig;
use crate::error::VectorArtError;
use crate::output::{SavedArtifact, WorkflowOutput};
use crate::pipeline::input::SourceFile;
use crate::pipeline::{download, job, resolve, upload};
use crate::progress::{NoopProgressCallback, ProgressCallback};
use crate::session::{GenerationJob, JobStatus, Session, UploadSession, WorkflowStatus};
use crate::transport::{HttpTransport, ReqwestTransport};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// A single-user upload → generate → download session.
pub struct Workflow {
    config: ClientConfig,
    transport: Arc<dyn HttpTransport>,
    callback: ProgressCallback,
    session: Session,
}

impl std::fmt::Debug for Workflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workflow")
            .field("config", &self.config)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl Workflow {
    /// Create a workflow in the `Idle` state.
    ///
    /// Uses the configured transport and progress callback when present,
    /// otherwise a [`ReqwestTransport`] and [`NoopProgressCallback`].
    pub fn new(config: ClientConfig) -> Result<Self, VectorArtError> {
        let transport: Arc<dyn HttpTransport> = match &config.transport {
            Some(t) => Arc::clone(t),
            None => Arc::new(ReqwestTransport::new(config.request_timeout_secs)?),
        };
        let callback = config
            .progress_callback
            .clone()
            .unwrap_or_else(|| Arc::new(NoopProgressCallback));

        Ok(Self {
            config,
            transport,
            callback,
            session: Session::default(),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn status(&self) -> &WorkflowStatus {
        self.session.status()
    }

    pub fn uploaded_url(&self) -> Option<&str> {
        self.session.uploaded_url()
    }

    pub fn result_url(&self) -> Option<&str> {
        self.session.result_url()
    }

    pub fn job(&self) -> Option<&GenerationJob> {
        self.session.job()
    }

    /// Read `path` and upload it. See [`Workflow::select_file`].
    pub async fn select_path(&mut self, path: impl AsRef<Path>) -> Result<String, VectorArtError> {
        let file = match SourceFile::from_path(path).await {
            Ok(file) => file,
            Err(e) => {
                self.notify(&e);
                return Err(e);
            }
        };
        self.select_file(file).await
    }

    /// Upload a newly selected image and return its public URL.
    ///
    /// A non-image selection is rejected before anything is sent and leaves
    /// the current session untouched. A valid selection discards the
    /// previous upload and job first.
    pub async fn select_file(&mut self, file: SourceFile) -> Result<String, VectorArtError> {
        if let Err(e) = file.ensure_image() {
            self.notify(&e);
            return Err(e);
        }

        self.session.start_upload(UploadSession {
            file_name: file.name.clone(),
            media_type: file.media_type.clone(),
            size_bytes: file.bytes.len(),
            uploaded_url: None,
        });
        self.emit_status();

        match upload::upload(self.transport.as_ref(), &file, &self.config).await {
            Ok(url) => {
                self.session.upload_succeeded(url.clone());
                self.emit_status();
                Ok(url)
            }
            Err(e) => {
                warn!("Upload of {} failed: {}", file.name, e);
                self.session.upload_failed(e.to_string());
                self.emit_status();
                self.notify(&e);
                Err(e)
            }
        }
    }

    /// Submit the uploaded image, wait for the job and return the result URL.
    ///
    /// On failure the upload is kept, so calling `generate` again retries
    /// without re-uploading.
    pub async fn generate(&mut self) -> Result<String, VectorArtError> {
        let source_url = match self.session.start_generation() {
            Ok(url) => url,
            Err(VectorArtError::Busy) => return Err(VectorArtError::Busy),
            Err(e) => {
                self.notify(&e);
                return Err(e);
            }
        };
        self.emit_status();

        match self.run_job(&source_url).await {
            Ok(result_url) => {
                info!("Result ready: {}", result_url);
                self.session.job_completed(result_url.clone());
                self.emit_status();
                Ok(result_url)
            }
            Err(e) => {
                warn!("Generation failed: {}", e);
                let job_status = match e {
                    VectorArtError::JobTimeout { .. } => JobStatus::TimedOut,
                    _ => JobStatus::Failed,
                };
                self.session.generation_failed(e.to_string(), job_status);
                self.emit_status();
                self.notify(&e);
                Err(e)
            }
        }
    }

    async fn run_job(&mut self, source_url: &str) -> Result<String, VectorArtError> {
        let job_id = job::submit(self.transport.as_ref(), source_url, &self.config).await?;
        self.session.job_queued(job_id.clone(), source_url.to_string());
        self.emit_status();

        let session = &mut self.session;
        let callback = &self.callback;
        let max_polls = self.config.max_polls;
        let result = job::poll_until_done(self.transport.as_ref(), &job_id, &self.config, |attempt, status| {
            session.poll_pending(attempt, status);
            callback.on_status_change(session.status());
            callback.on_poll_pending(attempt, max_polls);
        })
        .await?;

        resolve::resolve(&result)
    }

    /// Fetch the current result and save it under `config.output_dir`.
    ///
    /// Whatever happens the session returns to `Completed` with the result
    /// still available. When every strategy fails, the single notice is the
    /// manual-save instruction.
    pub async fn download(&mut self) -> Result<SavedArtifact, VectorArtError> {
        let url = match self.session.start_download() {
            Ok(url) => url,
            Err(VectorArtError::Busy) => return Err(VectorArtError::Busy),
            Err(e) => {
                self.notify(&e);
                return Err(e);
            }
        };
        self.emit_status();

        let callback = &self.callback;
        let result = download::download(self.transport.as_ref(), &url, &self.config, |e| {
            callback.on_download_fallback(e)
        })
        .await;

        self.session.download_finished();
        self.emit_status();

        match result {
            Ok(artifact) => {
                self.callback.on_artifact_saved(&artifact.path);
                Ok(artifact)
            }
            Err(e) => {
                self.notify(&e);
                Err(e)
            }
        }
    }

    /// Drop the upload and job and return to `Idle`.
    ///
    /// Also the way out of a workflow whose `generate` future was dropped
    /// mid-poll.
    pub fn reset(&mut self) {
        self.session.reset();
        self.emit_status();
    }

    fn emit_status(&self) {
        self.callback.on_status_change(self.session.status());
    }

    fn notify(&self, error: &VectorArtError) {
        self.callback.on_notice(&error.to_string());
    }
}

/// Upload `path`, generate, and download the result.
///
/// # Errors
/// The first failing step's error. Download failures are
/// [`VectorArtError::DownloadFailed`], whose message is the manual-save
/// instruction.
pub async fn run(path: impl AsRef<Path>, config: &ClientConfig) -> Result<WorkflowOutput, VectorArtError> {
    let mut workflow = Workflow::new(config.clone())?;
    let uploaded_url = workflow.select_path(path).await?;
    let result_url = workflow.generate().await?;
    let artifact = workflow.download().await?;
    let job_id = workflow.job().map(|j| j.job_id.clone()).unwrap_or_default();

    Ok(WorkflowOutput {
        uploaded_url,
        job_id,
        result_url,
        artifact: Some(artifact),
    })
}

/// Blocking wrapper around [`run`] for callers without a tokio runtime.
pub fn run_sync(path: impl AsRef<Path>, config: &ClientConfig) -> Result<WorkflowOutput, VectorArtError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| VectorArtError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(run(path, config))
}
