//! Submit a generation job and poll it to completion.
//!
//! ## Poll Strategy
//!
//! The status endpoint is checked at a fixed interval for a bounded number
//! of attempts (2 s × 60 by default, a two-minute ceiling). There is no
//! backoff.
//!
//! Each check ends in one of three ways:
//!
//! | `status`             | Outcome                                         |
//! |----------------------|-------------------------------------------------|
//! | `completed`          | return the whole payload                        |
//! | `failed` / `error`   | [`VectorArtError::JobFailed`] with its message  |
//! | anything else        | report progress, wait, check again              |
//!
//! Running out of attempts is [`VectorArtError::JobTimeout`]; no request is
//! made beyond the budget and no wait follows the last check.

use crate::config::ClientConfig;
use crate::error::VectorArtError;
use crate::output::JobResult;
use crate::session::JobStatus;
use crate::transport::{HttpRequest, HttpTransport};
use serde::Serialize;
use serde_json::Value;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Message used when a failed job carries no error text.
pub const GENERIC_JOB_FAILURE: &str = "Job processing failed";

/// Body of the `POST <job-service>` generation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest<'a> {
    pub model: &'a str,
    pub tool_type: &'a str,
    pub effect_id: &'a str,
    pub image_url: &'a str,
    pub user_id: &'a str,
    pub remove_watermark: bool,
    pub is_private: bool,
}

impl<'a> GenerationRequest<'a> {
    pub fn new(image_url: &'a str, config: &'a ClientConfig) -> Self {
        Self {
            model: &config.model,
            tool_type: &config.tool_type,
            effect_id: &config.effect_id,
            image_url,
            user_id: &config.user_id,
            remove_watermark: true,
            is_private: true,
        }
    }
}

/// `GET <job-service>/<user>/<job>/status`.
pub fn status_url(job_service_url: &str, user_id: &str, job_id: &str) -> Result<String, VectorArtError> {
    let mut url = reqwest::Url::parse(job_service_url)
        .map_err(|e| VectorArtError::InvalidConfig(format!("job service URL: {e}")))?;
    url.path_segments_mut()
        .map_err(|_| VectorArtError::InvalidConfig("job service URL cannot be a base".into()))?
        .pop_if_empty()
        .extend([user_id, job_id, "status"]);
    Ok(url.into())
}

/// Submit `image_url` for generation and return the job id.
pub async fn submit(
    transport: &dyn HttpTransport,
    image_url: &str,
    config: &ClientConfig,
) -> Result<String, VectorArtError> {
    let endpoint = &config.job_service_url;
    let body = serde_json::to_vec(&GenerationRequest::new(image_url, config))
        .map_err(|e| VectorArtError::Internal(format!("serialise request: {e}")))?;

    let request = HttpRequest::post(endpoint, body)
        .header("Accept", "application/json, text/plain, */*")
        .header("Content-Type", "application/json");
    let response = transport
        .send(request)
        .await
        .map_err(|e| VectorArtError::Transport {
            url: endpoint.clone(),
            detail: e.to_string(),
        })?;

    if !response.is_success() {
        return Err(VectorArtError::SubmitFailed {
            reason: format!("{} (HTTP {})", response.status_text, response.status),
        });
    }

    let payload: Value = response.parse_json().map_err(|e| VectorArtError::SubmitFailed {
        reason: format!("response is not JSON: {e}"),
    })?;
    let job_id = match payload.get("jobId") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => {
            return Err(VectorArtError::SubmitFailed {
                reason: "response has no jobId".into(),
            })
        }
    };

    info!("Submitted job {} for {}", job_id, image_url);
    Ok(job_id)
}

/// Poll `job_id` until it completes, fails, or the poll budget runs out.
///
/// `on_pending(attempt, status)` is called after every check that found the
/// job still pending, before the wait that follows it.
pub async fn poll_until_done<F>(
    transport: &dyn HttpTransport,
    job_id: &str,
    config: &ClientConfig,
    mut on_pending: F,
) -> Result<JobResult, VectorArtError>
where
    F: FnMut(u32, JobStatus),
{
    let url = status_url(&config.job_service_url, &config.user_id, job_id)?;
    debug!(
        "Polling job {} every {:?}, at most {} checks ({:?})",
        job_id,
        config.poll_interval,
        config.max_polls,
        config.poll_budget()
    );

    for attempt in 1..=config.max_polls {
        let response = transport
            .send(HttpRequest::get(&url))
            .await
            .map_err(|e| VectorArtError::Transport {
                url: url.clone(),
                detail: e.to_string(),
            })?;

        if !response.is_success() {
            return Err(VectorArtError::StatusCheckFailed {
                job_id: job_id.to_string(),
                status: response.status,
                status_text: response.status_text,
            });
        }

        let payload: Value = response
            .parse_json()
            .map_err(|e| VectorArtError::InvalidResponse {
                url: url.clone(),
                detail: e.to_string(),
            })?;
        let raw_status = payload.get("status").and_then(Value::as_str).unwrap_or("");
        let status = JobStatus::from_service(raw_status);
        debug!("Job {}: check {}/{} → {:?}", job_id, attempt, config.max_polls, raw_status);

        match status {
            JobStatus::Completed => {
                info!("Job {} completed after {} checks", job_id, attempt);
                return Ok(JobResult {
                    job_id: job_id.to_string(),
                    payload,
                });
            }
            JobStatus::Failed => {
                let message = failure_message(&payload);
                warn!("Job {} failed: {}", job_id, message);
                return Err(VectorArtError::JobFailed {
                    job_id: job_id.to_string(),
                    message,
                });
            }
            pending => {
                on_pending(attempt, pending);
                if attempt < config.max_polls {
                    sleep(config.poll_interval).await;
                }
            }
        }
    }

    warn!("Job {} still pending after {} checks", job_id, config.max_polls);
    Err(VectorArtError::JobTimeout {
        job_id: job_id.to_string(),
        attempts: config.max_polls,
    })
}

/// The service's `error` field, or [`GENERIC_JOB_FAILURE`].
fn failure_message(payload: &Value) -> String {
    match payload.get("error") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Object(o)) => match o.get("message") {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            _ => GENERIC_JOB_FAILURE.to_string(),
        },
        _ => GENERIC_JOB_FAILURE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedTransport;
    use crate::transport::{HttpResponse, Method};
    use serde_json::json;
    use std::time::Duration;

    const JOBS: &str = "https://jobs.test/image-gen";

    fn config() -> ClientConfig {
        ClientConfig::builder()
            .job_service_url(JOBS)
            .user_id("user-1")
            .build()
            .unwrap()
    }

    #[test]
    fn request_body_shape() {
        let cfg = config();
        let body = serde_json::to_value(GenerationRequest::new("https://contents.test/a.png", &cfg)).unwrap();
        assert_eq!(
            body,
            json!({
                "model": "image-effects",
                "toolType": "image-effects",
                "effectId": "photoToVectorArt",
                "imageUrl": "https://contents.test/a.png",
                "userId": "user-1",
                "removeWatermark": true,
                "isPrivate": true,
            })
        );
    }

    #[test]
    fn status_url_shape() {
        assert_eq!(
            status_url(JOBS, "user-1", "abc").unwrap(),
            "https://jobs.test/image-gen/user-1/abc/status"
        );
        assert_eq!(
            status_url("https://jobs.test/image-gen/", "u", "a/b").unwrap(),
            "https://jobs.test/image-gen/u/a%2Fb/status"
        );
    }

    #[test]
    fn failure_message_fallbacks() {
        assert_eq!(failure_message(&json!({ "error": "bad input" })), "bad input");
        assert_eq!(failure_message(&json!({ "error": { "message": "nested" } })), "nested");
        assert_eq!(failure_message(&json!({ "error": "" })), GENERIC_JOB_FAILURE);
        assert_eq!(failure_message(&json!({})), GENERIC_JOB_FAILURE);
    }

    #[tokio::test]
    async fn submit_returns_job_id_and_sends_json() {
        let t = ScriptedTransport::new().reply(
            Method::POST,
            JOBS,
            HttpResponse::json(&json!({ "jobId": "abc" })),
        );
        let id = submit(&t, "https://contents.test/a.png", &config()).await.unwrap();
        assert_eq!(id, "abc");

        let req = &t.requests()[0];
        assert_eq!(req.header_value("content-type"), Some("application/json"));
        let body: Value = serde_json::from_slice(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["imageUrl"], "https://contents.test/a.png");
    }

    #[tokio::test]
    async fn submit_non_success_is_submit_error() {
        let t = ScriptedTransport::new().reply(Method::POST, JOBS, HttpResponse::status(502));
        let err = submit(&t, "https://contents.test/a.png", &config()).await.unwrap_err();
        assert!(matches!(err, VectorArtError::SubmitFailed { .. }));
        assert!(err.to_string().contains("Bad Gateway"), "got: {err}");
    }

    #[tokio::test]
    async fn submit_without_job_id_is_submit_error() {
        let t = ScriptedTransport::new().reply(Method::POST, JOBS, HttpResponse::json(&json!({ "ok": true })));
        let err = submit(&t, "https://contents.test/a.png", &config()).await.unwrap_err();
        assert!(err.to_string().contains("jobId"), "got: {err}");
    }

    #[tokio::test(start_paused = true)]
    async fn pending_then_completed() {
        let status = format!("{JOBS}/user-1/abc/status");
        let t = ScriptedTransport::new()
            .reply_times(Method::GET, &status, HttpResponse::json(&json!({ "status": "processing" })), 3)
            .reply(
                Method::GET,
                &status,
                HttpResponse::json(&json!({ "status": "completed", "result": { "url": "https://cdn/x.png" } })),
            );

        let started = tokio::time::Instant::now();
        let mut seen = Vec::new();
        let result = poll_until_done(&t, "abc", &config(), |attempt, _| seen.push(attempt))
            .await
            .unwrap();

        assert_eq!(t.request_count(), 4);
        assert_eq!(seen, vec![1, 2, 3]);
        assert_eq!(started.elapsed(), Duration::from_secs(6));
        assert_eq!(result.payload["result"]["url"], "https://cdn/x.png");
    }

    #[tokio::test(start_paused = true)]
    async fn failed_status_stops_immediately() {
        let status = format!("{JOBS}/user-1/abc/status");
        let t = ScriptedTransport::new()
            .reply(Method::GET, &status, HttpResponse::json(&json!({ "status": "queued" })))
            .reply(
                Method::GET,
                &status,
                HttpResponse::json(&json!({ "status": "failed", "error": "Face not detected" })),
            )
            .reply(Method::GET, &status, HttpResponse::json(&json!({ "status": "completed" })));

        let err = poll_until_done(&t, "abc", &config(), |_, _| {}).await.unwrap_err();
        match err {
            VectorArtError::JobFailed { message, .. } => assert_eq!(message, "Face not detected"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(t.request_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn error_status_without_message_uses_generic_text() {
        let status = format!("{JOBS}/user-1/abc/status");
        let t = ScriptedTransport::new().reply(Method::GET, &status, HttpResponse::json(&json!({ "status": "error" })));
        let err = poll_until_done(&t, "abc", &config(), |_, _| {}).await.unwrap_err();
        assert_eq!(err.to_string(), GENERIC_JOB_FAILURE);
    }

    #[tokio::test(start_paused = true)]
    async fn status_endpoint_failure_aborts() {
        let status = format!("{JOBS}/user-1/abc/status");
        let t = ScriptedTransport::new().reply(Method::GET, &status, HttpResponse::status(500));
        let err = poll_until_done(&t, "abc", &config(), |_, _| {}).await.unwrap_err();
        assert!(matches!(err, VectorArtError::StatusCheckFailed { status: 500, .. }));
    }
}
