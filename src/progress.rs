//! Progress-callback trait for workflow status events.
//!
//! Inject an [`Arc<dyn WorkflowProgressCallback>`] via
//! [`crate::config::ClientConfigBuilder::progress_callback`] to follow the
//! workflow as it uploads, submits, polls and downloads. The workflow never
//! renders anything itself: a presentation layer (the `vectorart` CLI, a GUI,
//! a web socket bridge) subscribes here and decides how to show each event.
//!
//! # Example
//!
//! ```rust
//! use vector_art_client::{ClientConfig, WorkflowProgressCallback, WorkflowStatus};
//! use std::sync::{Arc, Mutex};
//!
//! #[derive(Default)]
//! struct StatusLog {
//!     labels: Mutex<Vec<String>>,
//! }
//!
//! impl WorkflowProgressCallback for StatusLog {
//!     fn on_status_change(&self, status: &WorkflowStatus) {
//!         self.labels.lock().unwrap().push(status.label());
//!     }
//! }
//!
//! let log = Arc::new(StatusLog::default());
//! let config = ClientConfig::builder()
//!     .progress_callback(log.clone() as Arc<dyn WorkflowProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::error::DownloadError;
use crate::session::WorkflowStatus;
use std::path::Path;
use std::sync::Arc;

/// Called by the workflow controller as the session changes.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Events are delivered in order from the task that
/// drives the workflow; they are never emitted concurrently.
pub trait WorkflowProgressCallback: Send + Sync {
    /// Called after every status transition.
    fn on_status_change(&self, status: &WorkflowStatus) {
        let _ = status;
    }

    /// Called after each status check that found the job still pending,
    /// right before the workflow waits for the next poll.
    ///
    /// # Arguments
    /// * `attempt`  : 1-indexed number of the check that just returned
    /// * `max_polls`: the configured poll budget
    fn on_poll_pending(&self, attempt: u32, max_polls: u32) {
        let _ = (attempt, max_polls);
    }

    /// Called when a download strategy fails and the next one is tried.
    fn on_download_fallback(&self, error: &DownloadError) {
        let _ = error;
    }

    /// The single user-visible notification for a failed step.
    ///
    /// Emitted exactly once per failed operation, with the text the user
    /// should see (for download failures, the manual-save instruction).
    fn on_notice(&self, message: &str) {
        let _ = message;
    }

    /// Called once the downloaded artifact has been written to disk.
    fn on_artifact_saved(&self, path: &Path) {
        let _ = path;
    }
}

/// A no-op implementation for callers that don't need progress events.
///
/// This is the default when no callback is configured.
pub struct NoopProgressCallback;

impl WorkflowProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ClientConfig`].
pub type ProgressCallback = Arc<dyn WorkflowProgressCallback>;
