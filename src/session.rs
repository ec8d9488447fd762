//! Session state owned by the workflow controller.
//!
//! A [`Session`] holds the one upload, the one generation job and the one
//! result URL a user works with at a time, plus the [`WorkflowStatus`] a
//! presentation layer renders. Every mutator is `pub(crate)` and only
//! [`crate::workflow::Workflow`] calls them; everything else gets read-only
//! access.
//!
//! ```text
//! Idle ──select──▶ Uploading ──▶ Ready ──generate──▶ Submitting ──▶ Queued ──▶ Polling(n) ──▶ Completed
//!                      │                                  │                       │          │     ▲
//!                      ▼                                  ▼                       ▼  download ▼     │
//!                   Errored ◀─────────────────────────────┴───────────────────────┘     Downloading
//! ```
//!
//! `reset` returns to `Idle` from anywhere. `Errored` keeps the upload (when
//! there is one) so `generate` can be retried.

use crate::error::VectorArtError;
use serde::Serialize;
use std::fmt;

/// Where the workflow currently is.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum WorkflowStatus {
    /// Nothing selected yet, or the session was reset.
    #[default]
    Idle,
    /// The selected file is being uploaded.
    Uploading,
    /// An uploaded image is available; generation may start.
    Ready,
    /// The generation request is being sent.
    Submitting,
    /// The job was accepted and has not been polled yet.
    Queued,
    /// The job is being polled; `attempt` status checks have returned pending.
    Polling { attempt: u32 },
    /// The job finished and exposed a result URL.
    Completed,
    /// The result is being downloaded.
    Downloading,
    /// The last operation failed with `message`.
    Errored { message: String },
}

impl WorkflowStatus {
    /// Short status text for a trigger button or status line.
    pub fn label(&self) -> String {
        match self {
            WorkflowStatus::Idle => "IDLE".to_string(),
            WorkflowStatus::Uploading => "UPLOADING...".to_string(),
            WorkflowStatus::Ready => "READY".to_string(),
            WorkflowStatus::Submitting => "SUBMITTING JOB...".to_string(),
            WorkflowStatus::Queued => "JOB QUEUED...".to_string(),
            WorkflowStatus::Polling { attempt } => format!("PROCESSING... ({attempt})"),
            WorkflowStatus::Completed => "COMPLETED".to_string(),
            WorkflowStatus::Downloading => "DOWNLOADING...".to_string(),
            WorkflowStatus::Errored { .. } => "ERROR".to_string(),
        }
    }

    /// A generation job is being submitted or polled.
    pub fn is_job_in_flight(&self) -> bool {
        matches!(
            self,
            WorkflowStatus::Submitting | WorkflowStatus::Queued | WorkflowStatus::Polling { .. }
        )
    }

    /// Whether a generate trigger may be enabled in this status.
    ///
    /// The session additionally needs an uploaded URL; see
    /// [`Session::can_generate`].
    pub fn accepts_generate(&self) -> bool {
        matches!(
            self,
            WorkflowStatus::Ready | WorkflowStatus::Completed | WorkflowStatus::Errored { .. }
        )
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// The file a user selected and, once uploaded, where it lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadSession {
    pub file_name: String,
    pub media_type: String,
    pub size_bytes: usize,
    /// Set only after the upload succeeded.
    pub uploaded_url: Option<String>,
}

/// Lifecycle of a generation job as reported by the job service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
    TimedOut,
}

impl JobStatus {
    /// Map a raw `status` string from the job service.
    ///
    /// `completed` is success, `failed` and `error` are failure, and any
    /// other value means the job is still pending.
    pub fn from_service(status: &str) -> Self {
        match status {
            "completed" => JobStatus::Completed,
            "failed" | "error" => JobStatus::Failed,
            "queued" => JobStatus::Queued,
            _ => JobStatus::Processing,
        }
    }
}

/// One submitted generation job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationJob {
    pub job_id: String,
    pub source_url: String,
    pub status: JobStatus,
    /// Set only once the job completed and a result URL was resolved.
    pub result_url: Option<String>,
}

/// The single piece of mutable state behind a [`crate::workflow::Workflow`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct Session {
    status: WorkflowStatus,
    upload: Option<UploadSession>,
    job: Option<GenerationJob>,
}

impl Session {
    pub fn status(&self) -> &WorkflowStatus {
        &self.status
    }

    pub fn upload(&self) -> Option<&UploadSession> {
        self.upload.as_ref()
    }

    pub fn job(&self) -> Option<&GenerationJob> {
        self.job.as_ref()
    }

    pub fn uploaded_url(&self) -> Option<&str> {
        self.upload.as_ref()?.uploaded_url.as_deref()
    }

    /// The result URL of a completed job, if any.
    pub fn result_url(&self) -> Option<&str> {
        let job = self.job.as_ref()?;
        if job.status != JobStatus::Completed {
            return None;
        }
        job.result_url.as_deref().filter(|u| !u.is_empty())
    }

    /// An uploaded image exists and no job is in flight.
    pub fn can_generate(&self) -> bool {
        self.status.accepts_generate() && self.uploaded_url().is_some()
    }

    // ── Transitions (workflow controller only) ───────────────────────────

    /// Discard everything and start uploading `upload`.
    pub(crate) fn start_upload(&mut self, upload: UploadSession) {
        self.job = None;
        self.upload = Some(upload);
        self.status = WorkflowStatus::Uploading;
    }

    pub(crate) fn upload_succeeded(&mut self, url: String) {
        if let Some(upload) = self.upload.as_mut() {
            upload.uploaded_url = Some(url);
        }
        self.status = WorkflowStatus::Ready;
    }

    /// A failed upload leaves no usable session behind.
    pub(crate) fn upload_failed(&mut self, message: String) {
        self.upload = None;
        self.job = None;
        self.status = WorkflowStatus::Errored { message };
    }

    /// Begin a generation, returning the uploaded URL to submit.
    ///
    /// Rejected while another job is in flight or before anything was
    /// uploaded. The previous job (and its result) is discarded.
    pub(crate) fn start_generation(&mut self) -> Result<String, VectorArtError> {
        if self.status.is_job_in_flight()
            || matches!(self.status, WorkflowStatus::Uploading | WorkflowStatus::Downloading)
        {
            return Err(VectorArtError::Busy);
        }
        let url = self
            .uploaded_url()
            .ok_or(VectorArtError::NoUploadedImage)?
            .to_string();
        self.job = None;
        self.status = WorkflowStatus::Submitting;
        Ok(url)
    }

    pub(crate) fn job_queued(&mut self, job_id: String, source_url: String) {
        self.job = Some(GenerationJob {
            job_id,
            source_url,
            status: JobStatus::Queued,
            result_url: None,
        });
        self.status = WorkflowStatus::Queued;
    }

    pub(crate) fn poll_pending(&mut self, attempt: u32, reported: JobStatus) {
        if let Some(job) = self.job.as_mut() {
            job.status = reported;
        }
        self.status = WorkflowStatus::Polling { attempt };
    }

    pub(crate) fn job_completed(&mut self, result_url: String) {
        if let Some(job) = self.job.as_mut() {
            job.status = JobStatus::Completed;
            job.result_url = Some(result_url);
        }
        self.status = WorkflowStatus::Completed;
    }

    /// A submit/poll/resolve failure. The upload is kept so generation can
    /// be retried without re-uploading.
    pub(crate) fn generation_failed(&mut self, message: String, job_status: JobStatus) {
        if let Some(job) = self.job.as_mut() {
            job.status = job_status;
        }
        self.status = WorkflowStatus::Errored { message };
    }

    /// Begin a download, returning the result URL to fetch.
    pub(crate) fn start_download(&mut self) -> Result<String, VectorArtError> {
        if self.status.is_job_in_flight() || self.status == WorkflowStatus::Downloading {
            return Err(VectorArtError::Busy);
        }
        let url = self.result_url().ok_or(VectorArtError::NoResult)?.to_string();
        self.status = WorkflowStatus::Downloading;
        Ok(url)
    }

    /// The result stays available whether or not the download succeeded.
    pub(crate) fn download_finished(&mut self) {
        self.status = WorkflowStatus::Completed;
    }

    pub(crate) fn reset(&mut self) {
        *self = Session::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uploaded_session() -> Session {
        let mut s = Session::default();
        s.start_upload(UploadSession {
            file_name: "photo.heic".into(),
            media_type: "image/heic".into(),
            size_bytes: 3,
            uploaded_url: None,
        });
        s.upload_succeeded("https://contents.example/abc.heic".into());
        s
    }

    #[test]
    fn labels_mirror_trigger_text() {
        assert_eq!(WorkflowStatus::Uploading.label(), "UPLOADING...");
        assert_eq!(WorkflowStatus::Submitting.label(), "SUBMITTING JOB...");
        assert_eq!(WorkflowStatus::Queued.label(), "JOB QUEUED...");
        assert_eq!(WorkflowStatus::Polling { attempt: 3 }.label(), "PROCESSING... (3)");
        assert_eq!(WorkflowStatus::Ready.to_string(), "READY");
    }

    #[test]
    fn job_status_mapping() {
        assert_eq!(JobStatus::from_service("completed"), JobStatus::Completed);
        assert_eq!(JobStatus::from_service("failed"), JobStatus::Failed);
        assert_eq!(JobStatus::from_service("error"), JobStatus::Failed);
        assert_eq!(JobStatus::from_service("queued"), JobStatus::Queued);
        assert_eq!(JobStatus::from_service("processing"), JobStatus::Processing);
        assert_eq!(JobStatus::from_service("whatever"), JobStatus::Processing);
    }

    #[test]
    fn cannot_generate_without_upload() {
        let mut s = Session::default();
        assert!(!s.can_generate());
        assert!(matches!(
            s.start_generation(),
            Err(VectorArtError::NoUploadedImage)
        ));
        assert_eq!(s.status(), &WorkflowStatus::Idle);
    }

    #[test]
    fn second_generation_is_rejected_while_polling() {
        let mut s = uploaded_session();
        let url = s.start_generation().unwrap();
        assert_eq!(url, "https://contents.example/abc.heic");
        s.job_queued("abc".into(), url);
        s.poll_pending(1, JobStatus::Processing);

        assert!(!s.can_generate());
        assert!(matches!(s.start_generation(), Err(VectorArtError::Busy)));
        assert_eq!(s.job().unwrap().job_id, "abc");
    }

    #[test]
    fn failed_generation_keeps_upload_for_retry() {
        let mut s = uploaded_session();
        s.start_generation().unwrap();
        s.generation_failed("Failed to submit job: Bad Gateway".into(), JobStatus::Failed);

        assert!(s.can_generate());
        assert_eq!(s.uploaded_url(), Some("https://contents.example/abc.heic"));
        assert!(s.start_generation().is_ok());
    }

    #[test]
    fn failed_upload_clears_session() {
        let mut s = uploaded_session();
        s.start_upload(UploadSession {
            file_name: "other.png".into(),
            media_type: "image/png".into(),
            size_bytes: 1,
            uploaded_url: None,
        });
        s.upload_failed("Failed to upload file".into());
        assert!(s.upload().is_none());
        assert!(!s.can_generate());
    }

    #[test]
    fn download_requires_completed_job_with_url() {
        let mut s = uploaded_session();
        assert!(matches!(s.start_download(), Err(VectorArtError::NoResult)));

        let url = s.start_generation().unwrap();
        s.job_queued("abc".into(), url);
        s.job_completed("https://cdn/x.png".into());
        assert_eq!(s.result_url(), Some("https://cdn/x.png"));
        assert_eq!(s.start_download().unwrap(), "https://cdn/x.png");
        assert_eq!(s.status(), &WorkflowStatus::Downloading);
        s.download_finished();
        assert_eq!(s.status(), &WorkflowStatus::Completed);
    }

    #[test]
    fn reset_returns_to_idle() {
        let mut s = uploaded_session();
        s.reset();
        assert_eq!(s.status(), &WorkflowStatus::Idle);
        assert!(s.upload().is_none());
        assert!(s.job().is_none());
    }
}
