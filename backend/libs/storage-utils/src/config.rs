/// Storage configuration shared by the backend adapter
use crate::preview::{PreviewOptions, StorageUrlError};
use crate::validate_file_id;
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// API endpoint including the version prefix, e.g. `https://cloud.appwrite.io/v1`
    pub endpoint: String,
    /// Project the bucket belongs to
    pub project_id: String,
    /// Storage bucket id
    pub bucket_id: String,
    /// Transformation applied to post images
    pub preview: PreviewOptions,
}

impl StorageConfig {
    /// Load storage configuration from environment variables
    pub fn from_env() -> Self {
        let mut preview = PreviewOptions::default();
        if let Some(width) = std::env::var("STORAGE_PREVIEW_WIDTH")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            preview.width = width;
        }
        if let Some(height) = std::env::var("STORAGE_PREVIEW_HEIGHT")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            preview.height = height;
        }
        if let Ok(gravity) = std::env::var("STORAGE_PREVIEW_GRAVITY") {
            match gravity.parse() {
                Ok(g) => preview.gravity = g,
                Err(e) => warn!("ignoring STORAGE_PREVIEW_GRAVITY: {}", e),
            }
        }
        if let Some(quality) = std::env::var("STORAGE_PREVIEW_QUALITY")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            preview.quality = quality;
        }

        Self {
            endpoint: std::env::var("APPWRITE_ENDPOINT")
                .unwrap_or_else(|_| "https://cloud.appwrite.io/v1".to_string()),
            project_id: std::env::var("APPWRITE_PROJECT_ID").unwrap_or_default(),
            bucket_id: std::env::var("APPWRITE_STORAGE_ID").unwrap_or_else(|_| "media".into()),
            preview,
        }
    }

    fn base(&self) -> &str {
        self.endpoint.trim_end_matches('/')
    }

    /// Collection endpoint for files in the configured bucket
    pub fn files_url(&self) -> String {
        format!("{}/storage/buckets/{}/files", self.base(), self.bucket_id)
    }

    /// Endpoint of a single stored file
    pub fn file_url(&self, file_id: &str) -> Result<String, StorageUrlError> {
        validate_file_id(file_id)?;
        Ok(format!("{}/{}", self.files_url(), file_id))
    }

    /// Transformed preview URL for an uploaded image
    pub fn preview_url(&self, file_id: &str) -> Result<String, StorageUrlError> {
        self.preview.validate()?;
        let mut url = format!("{}/preview?", self.file_url(file_id)?);
        for (key, value) in self.preview.query_pairs() {
            url.push_str(key);
            url.push('=');
            url.push_str(&value);
            url.push('&');
        }
        url.push_str("project=");
        url.push_str(&urlencoding::encode(&self.project_id));
        Ok(url)
    }

    /// Generated avatar showing the initials of `name`
    pub fn initials_avatar_url(&self, name: &str) -> String {
        format!(
            "{}/avatars/initials?name={}&project={}",
            self.base(),
            urlencoding::encode(name),
            urlencoding::encode(&self.project_id)
        )
    }
}
