//! Input resolution: turn a user-selected file into an uploadable image.
//!
//! The upload service stores whatever bytes it is given under whatever name
//! the client picks, so everything about the object (its extension and the
//! `Content-Type` it is stored with) is decided here, before any request.

use crate::error::VectorArtError;
use image::ImageFormat;
use std::path::Path;
use tracing::debug;

/// Extension used when the original filename has none.
pub const DEFAULT_EXTENSION: &str = "jpg";

const OCTET_STREAM: &str = "application/octet-stream";

/// A selected file, fully read into memory.
#[derive(Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Original filename (no directory part).
    pub name: String,
    /// Declared media type, sent as the upload `Content-Type`.
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for SourceFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceFile")
            .field("name", &self.name)
            .field("media_type", &self.media_type)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

impl SourceFile {
    /// Wrap in-memory bytes with an explicit name and media type.
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            bytes,
        }
    }

    /// Read a file from disk, detecting its media type.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, VectorArtError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::PermissionDenied => VectorArtError::PermissionDenied {
                path: path.to_path_buf(),
            },
            std::io::ErrorKind::NotFound => VectorArtError::FileNotFound {
                path: path.to_path_buf(),
            },
            _ => VectorArtError::Internal(format!("Failed to read '{}': {e}", path.display())),
        })?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let media_type = detect_media_type(&name, &bytes);
        debug!("Selected {} ({}, {} bytes)", name, media_type, bytes.len());

        Ok(Self {
            name,
            media_type,
            bytes,
        })
    }

    /// Extension used for the uploaded object name.
    pub fn extension(&self) -> &str {
        extension_of(&self.name)
    }

    /// Reject anything whose media type is not `image/*`.
    pub fn ensure_image(&self) -> Result<(), VectorArtError> {
        if self.media_type.starts_with("image/") {
            Ok(())
        } else {
            Err(VectorArtError::NotAnImage {
                name: self.name.clone(),
                media_type: self.media_type.clone(),
            })
        }
    }
}

/// The text after the last `.` of `name`, or [`DEFAULT_EXTENSION`] if the
/// name has no dot or ends with one.
pub fn extension_of(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => ext,
        _ => DEFAULT_EXTENSION,
    }
}

/// Media type from the filename extension, then from the content's magic
/// bytes, then `application/octet-stream`.
pub fn detect_media_type(name: &str, bytes: &[u8]) -> String {
    if let Some((_, ext)) = name.rsplit_once('.') {
        let ext = ext.to_ascii_lowercase();
        // Camera formats the image crate has no table entry for.
        match ext.as_str() {
            "heic" => return "image/heic".to_string(),
            "heif" => return "image/heif".to_string(),
            _ => {}
        }
        if let Some(format) = ImageFormat::from_extension(&ext) {
            return format.to_mime_type().to_string();
        }
    }
    match image::guess_format(bytes) {
        Ok(format) => format.to_mime_type().to_string(),
        Err(_) => OCTET_STREAM.to_string(),
    }
}
