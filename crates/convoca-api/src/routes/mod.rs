//! Route modules and shared request plumbing.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use bson::oid::ObjectId;
use serde::Deserialize;

use convoca_core::error::DomainError;
use convoca_core::image::{ImageKind, NormalizedImage};

use crate::error::ApiError;

pub mod events;
pub mod health;
pub mod mega_events;

/// Parses an object-id path segment.
pub(crate) fn parse_object_id(raw: &str, what: &str) -> Result<ObjectId, ApiError> {
    ObjectId::parse_str(raw)
        .map_err(|_| ApiError(DomainError::Validation(format!("malformed {what} id"))))
}

/// An image upload already normalized by the blob-ingestion collaborator:
/// base64 content plus MIME type, size- and format-constrained upstream.
#[derive(Debug, Deserialize)]
pub(crate) struct ImageUpload {
    /// Original filename.
    pub filename: String,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Usage tag.
    #[serde(default)]
    pub kind: ImageKind,
    /// MIME type of the payload.
    pub mime_type: String,
    /// Base64-encoded image bytes.
    pub content_base64: String,
}

/// Decodes uploads into normalized payloads, enforcing the per-request count
/// cap and the image-only MIME constraint.
pub(crate) fn decode_images(
    uploads: Vec<ImageUpload>,
    per_request_cap: usize,
) -> Result<Vec<NormalizedImage>, ApiError> {
    if uploads.is_empty() {
        return Err(ApiError(DomainError::Validation(
            "no images provided".into(),
        )));
    }
    if uploads.len() > per_request_cap {
        return Err(ApiError(DomainError::Validation(format!(
            "at most {per_request_cap} images per request"
        ))));
    }
    uploads
        .into_iter()
        .map(|upload| {
            if !upload.mime_type.starts_with("image/") {
                return Err(ApiError(DomainError::Validation(format!(
                    "unsupported MIME type: {}",
                    upload.mime_type
                ))));
            }
            let bytes = BASE64.decode(upload.content_base64.as_bytes()).map_err(|_| {
                ApiError(DomainError::Validation(format!(
                    "image {} is not valid base64",
                    upload.filename
                )))
            })?;
            Ok(NormalizedImage {
                filename: upload.filename,
                description: upload.description,
                kind: upload.kind,
                bytes,
                mime_type: upload.mime_type,
            })
        })
        .collect()
}
