//! Promotional image sub-documents.
//!
//! Image ingestion and transcoding happen upstream (the blob-ingestion
//! collaborator); the core only appends and removes already-normalized
//! payloads, subject to a per-aggregate hard ceiling.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// What the image is used for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageKind {
    /// Gallery photo.
    #[default]
    Gallery,
    /// Cover image.
    Cover,
    /// Promotional material.
    Promotional,
    /// Page banner (mega-events).
    Banner,
    /// Organization logo (mega-events).
    Logo,
}

/// Normalized upload payload produced by the blob-ingestion collaborator.
#[derive(Debug, Clone)]
pub struct NormalizedImage {
    /// Original filename.
    pub filename: String,
    /// Free-text description.
    pub description: String,
    /// Usage tag.
    pub kind: ImageKind,
    /// Image bytes, already size- and format-constrained.
    pub bytes: Vec<u8>,
    /// MIME type of the payload.
    pub mime_type: String,
}

/// A promotional image embedded in an aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromoImage {
    /// Stable identifier used for removal.
    pub id: Uuid,
    /// Original filename.
    pub filename: String,
    /// Free-text description.
    pub description: String,
    /// Usage tag.
    pub kind: ImageKind,
    /// Image bytes.
    pub bytes: Vec<u8>,
    /// MIME type of the payload.
    pub mime_type: String,
    /// Payload size in bytes.
    pub byte_len: u64,
    /// When the image was attached.
    pub uploaded_at: DateTime<Utc>,
}

impl PromoImage {
    /// Builds an embedded image from a normalized upload.
    #[must_use]
    pub fn from_normalized(image: NormalizedImage, now: DateTime<Utc>) -> Self {
        let byte_len = image.bytes.len() as u64;
        Self {
            id: Uuid::new_v4(),
            filename: image.filename,
            description: image.description,
            kind: image.kind,
            bytes: image.bytes,
            mime_type: image.mime_type,
            byte_len,
            uploaded_at: now,
        }
    }

    /// Renders the payload as an inline `data:` URL for safe projections.
    #[must_use]
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, BASE64.encode(&self.bytes))
    }
}

/// Safe projection of an embedded image: metadata plus an inline data URL,
/// without the raw byte field.
#[derive(Debug, Clone, Serialize)]
pub struct ImageView {
    /// Stable identifier used for removal.
    pub id: Uuid,
    /// Original filename.
    pub filename: String,
    /// Free-text description.
    pub description: String,
    /// Usage tag.
    pub kind: ImageKind,
    /// Payload size in bytes.
    pub byte_len: u64,
    /// When the image was attached.
    pub uploaded_at: DateTime<Utc>,
    /// Inline `data:` URL.
    pub url: String,
}

impl From<&PromoImage> for ImageView {
    fn from(image: &PromoImage) -> Self {
        Self {
            id: image.id,
            filename: image.filename.clone(),
            description: image.description.clone(),
            kind: image.kind,
            byte_len: image.byte_len,
            uploaded_at: image.uploaded_at,
            url: image.data_url(),
        }
    }
}

/// Appends normalized uploads to an embedded image list, enforcing the
/// aggregate's hard ceiling.
///
/// # Errors
///
/// Returns `DomainError::TooManyImages` if the append would exceed `ceiling`;
/// the list is left unchanged.
pub fn append_images(
    images: &mut Vec<PromoImage>,
    uploads: Vec<NormalizedImage>,
    ceiling: u32,
    now: DateTime<Utc>,
) -> Result<(), DomainError> {
    if images.len() + uploads.len() > ceiling as usize {
        return Err(DomainError::TooManyImages(ceiling));
    }
    images.extend(
        uploads
            .into_iter()
            .map(|upload| PromoImage::from_normalized(upload, now)),
    );
    Ok(())
}

/// Removes an image by id.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if no image with that id is attached.
pub fn remove_image(images: &mut Vec<PromoImage>, image_id: Uuid) -> Result<(), DomainError> {
    let index = images
        .iter()
        .position(|image| image.id == image_id)
        .ok_or_else(|| DomainError::NotFound("image".into()))?;
    images.remove(index);
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn upload(name: &str) -> NormalizedImage {
        NormalizedImage {
            filename: name.to_owned(),
            description: String::new(),
            kind: ImageKind::Gallery,
            bytes: vec![1, 2, 3],
            mime_type: "image/jpeg".to_owned(),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_append_within_ceiling_attaches_images() {
        let mut images = Vec::new();

        append_images(&mut images, vec![upload("a.jpg"), upload("b.jpg")], 10, now()).unwrap();

        assert_eq!(images.len(), 2);
        assert_eq!(images[0].byte_len, 3);
    }

    #[test]
    fn test_append_past_ceiling_fails_and_leaves_list_unchanged() {
        let mut images = Vec::new();
        append_images(&mut images, vec![upload("a.jpg")], 2, now()).unwrap();

        let result = append_images(&mut images, vec![upload("b.jpg"), upload("c.jpg")], 2, now());

        assert!(matches!(result, Err(DomainError::TooManyImages(2))));
        assert_eq!(images.len(), 1);
    }

    #[test]
    fn test_remove_missing_image_fails_not_found() {
        let mut images = Vec::new();
        append_images(&mut images, vec![upload("a.jpg")], 10, now()).unwrap();

        let result = remove_image(&mut images, Uuid::new_v4());

        assert!(matches!(result, Err(DomainError::NotFound(_))));
        assert_eq!(images.len(), 1);
    }

    #[test]
    fn test_data_url_embeds_mime_type() {
        let image = PromoImage::from_normalized(upload("a.jpg"), now());
        assert!(image.data_url().starts_with("data:image/jpeg;base64,"));
    }
}
