//! Upload a selected image and return its public URL.
//!
//! The protocol is two sequential round trips:
//!
//! 1. `GET <upload-service>/get-emd-upload-url?fileName=<object>` returns a
//!    signed URL as plain text.
//! 2. `PUT <signed-url>` with the raw bytes and the file's media type.
//!
//! The public URL is never returned by the service. The object name is
//! chosen here and the content domain is fixed, so the URL is simply
//! `<content-domain>/<object>`. Nothing is retried: either step failing
//! aborts the upload.

use crate::config::ClientConfig;
use crate::error::VectorArtError;
use crate::id::generate_id;
use crate::pipeline::input::SourceFile;
use crate::transport::{HttpRequest, HttpTransport};
use tracing::{debug, info};

/// Path of the signed-URL endpoint under the upload service.
pub const UPLOAD_URL_PATH: &str = "get-emd-upload-url";

/// Build a fresh object name `<id>.<extension>` for `file`.
pub fn object_name(file: &SourceFile, id_length: usize) -> String {
    format!("{}.{}", generate_id(id_length), file.extension())
}

/// Public URL an uploaded object is served from.
pub fn public_url(content_domain: &str, object_name: &str) -> String {
    format!("{}/{}", content_domain.trim_end_matches('/'), object_name)
}

/// URL that asks the upload service to sign `object_name`.
pub fn signed_url_request(upload_service_url: &str, object_name: &str) -> Result<String, VectorArtError> {
    let base = format!("{}/{}", upload_service_url.trim_end_matches('/'), UPLOAD_URL_PATH);
    reqwest::Url::parse_with_params(&base, &[("fileName", object_name)])
        .map(String::from)
        .map_err(|e| VectorArtError::InvalidConfig(format!("upload service URL: {e}")))
}

/// Upload `file` and return the URL it will be served from.
pub async fn upload(
    transport: &dyn HttpTransport,
    file: &SourceFile,
    config: &ClientConfig,
) -> Result<String, VectorArtError> {
    let object = object_name(file, config.upload_id_length);
    info!("Uploading {} as {}", file.name, object);

    // ── Step 1: signed URL ───────────────────────────────────────────────
    let request_url = signed_url_request(&config.upload_service_url, &object)?;
    let response = transport
        .send(HttpRequest::get(&request_url))
        .await
        .map_err(|e| VectorArtError::Transport {
            url: request_url.clone(),
            detail: e.to_string(),
        })?;
    if !response.is_success() {
        return Err(VectorArtError::UploadUrlFailed {
            status: response.status,
            status_text: response.status_text,
        });
    }
    let signed_url = response.text().trim().to_string();
    if let Err(e) = reqwest::Url::parse(&signed_url) {
        return Err(VectorArtError::InvalidResponse {
            url: request_url,
            detail: format!("signed upload URL '{signed_url}' is not a URL: {e}"),
        });
    }
    debug!("Signed upload URL issued for {}", object);

    // ── Step 2: PUT bytes ────────────────────────────────────────────────
    let put = HttpRequest::put(&signed_url, file.bytes.clone()).header("Content-Type", &file.media_type);
    let response = transport
        .send(put)
        .await
        .map_err(|e| VectorArtError::Transport {
            url: signed_url.clone(),
            detail: e.to_string(),
        })?;
    if !response.is_success() {
        return Err(VectorArtError::UploadTransferFailed {
            status: response.status,
            status_text: response.status_text,
        });
    }

    // ── Step 3: derive public URL ────────────────────────────────────────
    let url = public_url(&config.content_domain, &object);
    info!("Uploaded {} bytes → {}", file.bytes.len(), url);
    Ok(url)
}
