//! Pick the result URL out of a completed job payload.
//!
//! The job service does not publish a schema for `result`. Observed
//! payloads carry either a single object or a list of objects, and the URL
//! sits under one of several field names. The lookup order below is a best
//! guess from those observations and is expected to change; the tests in
//! this module pin the currently known shapes.

use crate::error::VectorArtError;
use crate::output::JobResult;
use serde_json::Value;

/// Field names holding the result URL, highest priority first.
pub const RESULT_URL_FIELDS: [&str; 3] = ["mediaUrl", "image", "url"];

/// Resolve the result URL of a completed job.
pub fn resolve(job: &JobResult) -> Result<String, VectorArtError> {
    resolve_result(job.result())
}

/// Resolve from a raw status payload (`{ "result": ... }`).
pub fn resolve_payload(payload: &Value) -> Result<String, VectorArtError> {
    resolve_result(payload.get("result"))
}

fn resolve_result(result: Option<&Value>) -> Result<String, VectorArtError> {
    let item = match result {
        Some(Value::Array(items)) => items.first(),
        other => other,
    };

    item.and_then(|item| {
        RESULT_URL_FIELDS
            .iter()
            .filter_map(|field| item.get(*field).and_then(Value::as_str))
            .find(|url| !url.is_empty())
    })
    .map(str::to_string)
    .ok_or(VectorArtError::ResultNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sequence_takes_first_element() {
        let payload = json!({ "result": [{ "mediaUrl": "X" }, { "mediaUrl": "Z" }] });
        assert_eq!(resolve_payload(&payload).unwrap(), "X");
    }

    #[test]
    fn image_used_when_media_url_missing() {
        let payload = json!({ "result": { "image": "Y" } });
        assert_eq!(resolve_payload(&payload).unwrap(), "Y");
    }

    #[test]
    fn media_url_beats_image_and_url() {
        let payload = json!({ "result": { "url": "U", "image": "I", "mediaUrl": "M" } });
        assert_eq!(resolve_payload(&payload).unwrap(), "M");
    }

    #[test]
    fn generic_url_is_last_resort() {
        let payload = json!({ "result": { "url": "https://cdn/x.png" } });
        assert_eq!(resolve_payload(&payload).unwrap(), "https://cdn/x.png");
    }

    #[test]
    fn empty_strings_fall_through() {
        let payload = json!({ "result": { "mediaUrl": "", "image": "Y" } });
        assert_eq!(resolve_payload(&payload).unwrap(), "Y");
    }

    #[test]
    fn no_known_field_is_not_found() {
        let payload = json!({ "result": { "thumbnail": "T" } });
        assert!(matches!(
            resolve_payload(&payload),
            Err(VectorArtError::ResultNotFound)
        ));
    }

    #[test]
    fn missing_or_empty_result_is_not_found() {
        assert!(resolve_payload(&json!({ "status": "completed" })).is_err());
        assert!(resolve_payload(&json!({ "result": [] })).is_err());
        assert!(resolve_payload(&json!({ "result": null })).is_err());
    }

    #[test]
    fn non_string_fields_are_ignored() {
        let payload = json!({ "result": { "mediaUrl": 42, "url": "U" } });
        assert_eq!(resolve_payload(&payload).unwrap(), "U");
    }

    #[test]
    fn resolves_from_job_result() {
        let job = JobResult {
            job_id: "abc".into(),
            payload: json!({ "status": "completed", "result": [{ "image": "Y" }] }),
        };
        assert_eq!(resolve(&job).unwrap(), "Y");
    }
}
