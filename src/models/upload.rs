use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::error::AppError;

/// Where an uploaded image will be referenced from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum UploadFolder {
    Products,
    Brands,
}

impl UploadFolder {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Products => "products",
            Self::Brands => "brands",
        }
    }
}

/// PresignedUrlRequest
///
/// Asks for a short-lived URL the dashboard can PUT an image to directly.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, TS)]
#[ts(export)]
pub struct PresignedUrlRequest {
    #[schema(example = "hero.png")]
    pub filename: String,
    #[schema(example = "image/png")]
    pub file_type: String,
    pub folder: UploadFolder,
}

const ALLOWED_IMAGE_TYPES: &[&str] = &["image/png", "image/jpeg", "image/webp", "image/gif"];

impl PresignedUrlRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if !ALLOWED_IMAGE_TYPES.contains(&self.file_type.as_str()) {
            return Err(AppError::Validation(format!(
                "file_type must be one of {}",
                ALLOWED_IMAGE_TYPES.join(", ")
            )));
        }
        Ok(())
    }

    /// `<folder>/<uuid>.<ext>`; the extension falls back to `bin`.
    pub fn object_key(&self, id: uuid::Uuid) -> String {
        let extension = std::path::Path::new(&self.filename)
            .extension()
            .and_then(std::ffi::OsStr::to_str)
            .map(str::to_ascii_lowercase)
            .unwrap_or_else(|| "bin".to_string());
        format!("{}/{}.{}", self.folder.as_str(), id, extension)
    }
}

/// PresignedUrlResponse
///
/// `resource_key` is what the dashboard stores in `images` / `logo_url` afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS, Default)]
#[ts(export)]
pub struct PresignedUrlResponse {
    pub upload_url: String,
    pub resource_key: String,
}
