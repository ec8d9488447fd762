//! Pipeline stages for the upload → generate → download workflow.
//!
//! Each submodule implements exactly one step and is stateless: session
//! state belongs to [`crate::workflow::Workflow`], which calls these stages
//! in order and records their results.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ upload ──▶ job ──────────────▶ resolve ──▶ download
//! (file)    (2 calls)  (submit + polling)  (pure)      (proxy → direct)
//! ```
//!
//! 1. [`input`]: read the selected file, decide extension and media type
//! 2. [`upload`]: signed URL + PUT; derive the public URL
//! 3. [`job`]: submit the generation request, poll it at a fixed cadence
//! 4. [`resolve`]: dig the result URL out of the loosely-typed payload
//! 5. [`download`]: ordered fetch strategies, atomic save to disk

pub mod download;
pub mod input;
pub mod job;
pub mod resolve;
pub mod upload;
