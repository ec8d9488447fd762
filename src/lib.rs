//! # vector-art-client
//!
//! Turn a photo into vector-style art through a hosted image-generation
//! service, and save the result locally.
//!
//! ## Why this crate?
//!
//! The generation service is asynchronous and its pieces live on different
//! hosts: uploads go through a signed-URL handshake, jobs are submitted and
//! then polled, and results sit on a CDN that does not always allow direct
//! fetches. This crate wraps that choreography in one state machine with a
//! single well-defined failure per step, so callers (the `vectorart` CLI, a
//! UI, a batch script) only deal with "selected", "generated", "downloaded".
//!
//! ## Pipeline Overview
//!
//! ```text
//! image file
//!  │
//!  ├─ 1. Input     read file, check it is an image, pick extension + media type
//!  ├─ 2. Upload    GET signed URL, PUT bytes, derive public URL
//!  ├─ 3. Submit    POST generation request → jobId
//!  ├─ 4. Poll      GET status every 2 s, at most 60 checks
//!  ├─ 5. Resolve   result.mediaUrl / image / url
//!  └─ 6. Download  proxy → direct, atomic save as vector_art_<id>.png
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use vector_art_client::{run, ClientConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::builder().output_dir("out").build()?;
//!     let output = run("photo.jpg", &config).await?;
//!     println!("{}", output.result_url);
//!     Ok(())
//! }
//! ```
//!
//! For step-by-step control (upload once, generate several times) drive a
//! [`Workflow`] directly.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `vectorart` binary (clap + anyhow + tracing-subscriber + indicatif) |
//! | `testing` | off   | Exposes `testing::ScriptedTransport`, an in-memory transport for offline tests |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! vector-art-client = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod id;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod session;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod transport;
pub mod workflow;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ClientConfig, ClientConfigBuilder};
pub use error::{DownloadError, VectorArtError, MANUAL_SAVE_HINT};
pub use output::{JobResult, SavedArtifact, StrategyKind, WorkflowOutput};
pub use pipeline::input::SourceFile;
pub use progress::{NoopProgressCallback, ProgressCallback, WorkflowProgressCallback};
pub use session::{GenerationJob, JobStatus, Session, UploadSession, WorkflowStatus};
pub use transport::{HttpTransport, ReqwestTransport};
pub use workflow::{run, run_sync, Workflow};
