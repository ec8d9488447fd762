//! Error types for the vector-art-client library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`VectorArtError`] is **fatal**: the current workflow step cannot
//!   proceed (the upload service refused a signed URL or the job failed).
//!   Returned as `Err(VectorArtError)` from every public async operation.
//!
//! * [`DownloadError`] is **non-fatal**: one download strategy failed, but
//!   the next strategy in the chain may still succeed. Collected by the
//!   downloader and only surfaced (inside
//!   [`VectorArtError::DownloadFailed`]) once every strategy is exhausted.

use std::path::PathBuf;
use thiserror::Error;

/// The instruction shown when no download strategy could fetch the result.
///
/// Opening the remote URL directly is never attempted; the user is asked to
/// save the image by hand instead.
pub const MANUAL_SAVE_HINT: &str = "Download failed due to browser security restrictions. \
Please right-click the result image and select \"Save Image As\".";

/// All fatal errors returned by the vector-art-client library.
#[derive(Debug, Error)]
pub enum VectorArtError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Image file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The selected file does not carry an `image/*` media type.
    #[error("Please upload an image file ('{name}' is {media_type})")]
    NotAnImage { name: String, media_type: String },

    // ── Upload errors ─────────────────────────────────────────────────────
    /// The upload-URL service refused to issue a signed URL.
    #[error("Failed to get upload URL: {status_text} (HTTP {status})")]
    UploadUrlFailed { status: u16, status_text: String },

    /// The PUT of the file bytes to the signed URL was rejected.
    #[error("Failed to upload file: {status_text} (HTTP {status})")]
    UploadTransferFailed { status: u16, status_text: String },

    // ── Job errors ────────────────────────────────────────────────────────
    /// The job service did not accept the generation request.
    #[error("Failed to submit job: {reason}")]
    SubmitFailed { reason: String },

    /// The status endpoint itself answered with a non-success status.
    #[error("Failed to check status of job '{job_id}': {status_text} (HTTP {status})")]
    StatusCheckFailed {
        job_id: String,
        status: u16,
        status_text: String,
    },

    /// A service answered 2xx with a body that could not be understood.
    #[error("Unexpected response from '{url}': {detail}")]
    InvalidResponse { url: String, detail: String },

    /// The job service reported `failed` or `error` for the job.
    #[error("{message}")]
    JobFailed { job_id: String, message: String },

    /// The poll budget ran out before the job reached a terminal state.
    #[error("Job '{job_id}' timed out after {attempts} status checks")]
    JobTimeout { job_id: String, attempts: u32 },

    /// The completed job did not expose any usable result URL.
    #[error("No result URL found in response")]
    ResultNotFound,

    // ── Download errors ───────────────────────────────────────────────────
    /// Every download strategy failed. The Display text is the manual-save
    /// instruction; the individual strategy failures are kept for logging.
    #[error("{}", MANUAL_SAVE_HINT)]
    DownloadFailed {
        url: String,
        attempts: Vec<DownloadError>,
    },

    // ── Workflow precondition errors ──────────────────────────────────────
    /// Generation was requested before any image finished uploading.
    #[error("Please upload an image first.")]
    NoUploadedImage,

    /// Download was requested before a job completed with a result URL.
    #[error("No generated result is available to download yet.")]
    NoResult,

    /// A generation job is already being submitted or polled.
    #[error("A generation job is already in progress")]
    Busy,

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the downloaded artifact.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The HTTP request never produced a response (DNS, TLS, timeout...).
    #[error("HTTP request to '{url}' failed: {detail}")]
    Transport { url: String, detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal failure of a single download strategy.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum DownloadError {
    /// The download proxy could not deliver the artifact.
    #[error("Proxy download failed: {detail}")]
    Proxy { detail: String },

    /// Fetching the result URL directly failed.
    #[error("Direct download failed: {detail}")]
    Direct { detail: String },
}

/// Failure of the HTTP transport itself, before any status code exists.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_url_failed_carries_status_text() {
        let e = VectorArtError::UploadUrlFailed {
            status: 503,
            status_text: "Service Unavailable".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("Service Unavailable"), "got: {msg}");
        assert!(msg.contains("503"), "got: {msg}");
    }

    #[test]
    fn job_failed_displays_service_message_verbatim() {
        let e = VectorArtError::JobFailed {
            job_id: "abc".into(),
            message: "NSFW content detected".into(),
        };
        assert_eq!(e.to_string(), "NSFW content detected");
    }

    #[test]
    fn job_timeout_display() {
        let e = VectorArtError::JobTimeout {
            job_id: "abc".into(),
            attempts: 60,
        };
        assert!(e.to_string().contains("60 status checks"));
        assert!(e.to_string().contains("abc"));
    }

    #[test]
    fn download_failed_is_the_manual_save_instruction() {
        let e = VectorArtError::DownloadFailed {
            url: "https://cdn/x.png".into(),
            attempts: vec![
                DownloadError::Proxy {
                    detail: "HTTP 502".into(),
                },
                DownloadError::Direct {
                    detail: "HTTP 403".into(),
                },
            ],
        };
        assert_eq!(e.to_string(), MANUAL_SAVE_HINT);
        assert!(e.to_string().contains("Save Image As"));
    }

    #[test]
    fn download_error_display() {
        let e = DownloadError::Proxy {
            detail: "HTTP 500".into(),
        };
        assert_eq!(e.to_string(), "Proxy download failed: HTTP 500");
    }
}
