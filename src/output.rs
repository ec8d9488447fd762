//! Result types produced by the workflow.

use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;

/// The full payload of a job whose status check returned `completed`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobResult {
    pub job_id: String,
    /// The status response exactly as the service returned it.
    pub payload: Value,
}

impl JobResult {
    /// The loosely-typed `result` field, if present.
    pub fn result(&self) -> Option<&Value> {
        self.payload.get("result")
    }
}

/// Which download strategy delivered an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Proxy,
    Direct,
}

/// A downloaded result written to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavedArtifact {
    pub path: PathBuf,
    pub file_name: String,
    pub size_bytes: usize,
    pub strategy: StrategyKind,
    /// The result URL the bytes were fetched for.
    pub source_url: String,
}

/// Everything one end-to-end run produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkflowOutput {
    pub uploaded_url: String,
    pub job_id: String,
    pub result_url: String,
    /// `None` when the run was asked not to download.
    pub artifact: Option<SavedArtifact>,
}
