/// Post mutation pipeline - create, update, and delete posts with their images
///
/// An image is uploaded before the document that references it is written.
/// Whenever a later step fails, the freshly uploaded file is deleted again so
/// no storage object is left without a post pointing at it.
use crate::backend::{DocumentStore, FileStorage};
use crate::domain::{FileUpload, ImageRef, NewPost, Post, PostDocument, PostUpdate, UpdatePost};
use crate::error::{SocialError, SocialResult};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Normalize free-text tags: whitespace removed, split on commas, empty
/// segments dropped
pub fn parse_tags(raw: Option<&str>) -> Vec<String> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    compact
        .split(',')
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

/// Uploaded file not yet referenced by any document
#[must_use = "a pending upload must be committed or discarded"]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingUpload {
    file_id: String,
    preview_url: String,
}

impl PendingUpload {
    pub fn file_id(&self) -> &str {
        &self.file_id
    }

    pub fn image(&self) -> ImageRef {
        ImageRef {
            image_url: self.preview_url.clone(),
            image_id: self.file_id.clone(),
        }
    }
}

pub struct PostPipeline {
    store: Arc<dyn DocumentStore>,
    storage: Arc<dyn FileStorage>,
}

impl PostPipeline {
    pub fn new(store: Arc<dyn DocumentStore>, storage: Arc<dyn FileStorage>) -> Self {
        Self { store, storage }
    }

    /// Upload a file and derive its preview URL
    ///
    /// If the preview cannot be derived the upload is deleted before the error
    /// is returned.
    pub async fn stage_upload(&self, file: &FileUpload) -> SocialResult<PendingUpload> {
        let stored = self.storage.upload_file(file).await.map_err(|err| {
            error!(file_name = %file.file_name, "upload failed: {}", err);
            err
        })?;

        match self.storage.file_preview(&stored.id) {
            Ok(preview_url) => {
                info!(file_id = %stored.id, "file uploaded");
                Ok(PendingUpload {
                    file_id: stored.id,
                    preview_url,
                })
            }
            Err(err) => {
                error!(file_id = %stored.id, "preview derivation failed: {}", err);
                self.discard(&stored.id).await;
                Err(SocialError::UploadFailure(format!(
                    "no preview for file {}: {}",
                    stored.id, err
                )))
            }
        }
    }

    /// Compensating delete of an upload no document will reference
    async fn discard(&self, file_id: &str) {
        match self.storage.delete_file(file_id).await {
            Ok(()) => info!(%file_id, "orphaned upload deleted"),
            Err(err) => error!(%file_id, "failed to delete orphaned upload: {}", err),
        }
    }

    pub async fn create_post(&self, input: &NewPost) -> SocialResult<Post> {
        if input.creator_id.is_empty() {
            return Err(SocialError::InvalidInput("creator id is required".into()));
        }

        let upload = self.stage_upload(&input.file).await?;

        let doc = PostDocument {
            creator: input.creator_id.clone(),
            caption: input.caption.clone(),
            image: upload.image(),
            location: input.location.clone(),
            tags: parse_tags(input.tags.as_deref()),
        };

        match self.store.create_post(&doc).await {
            Ok(post) => {
                info!(post_id = %post.id, creator = %post.creator, "post created");
                Ok(post)
            }
            Err(err) => {
                error!(creator = %input.creator_id, "post write failed: {}", err);
                self.discard(upload.file_id()).await;
                Err(err)
            }
        }
    }

    /// Update caption, location, tags, and optionally the image of a post
    ///
    /// The previously stored image stays in place until the new document is
    /// written. Once it is, a superseded image file is deleted.
    pub async fn update_post(&self, input: &UpdatePost) -> SocialResult<Post> {
        if input.post_id.is_empty() {
            return Err(SocialError::InvalidInput("post id is required".into()));
        }

        let upload = match &input.file {
            Some(file) => Some(self.stage_upload(file).await?),
            None => None,
        };

        let image = upload
            .as_ref()
            .map(PendingUpload::image)
            .unwrap_or_else(|| input.image.clone());

        let doc = PostUpdate {
            caption: input.caption.clone(),
            image,
            location: input.location.clone(),
            tags: parse_tags(input.tags.as_deref()),
        };

        match self.store.update_post(&input.post_id, &doc).await {
            Ok(post) => {
                info!(post_id = %post.id, new_image = upload.is_some(), "post updated");
                if let Some(upload) = &upload {
                    let previous = &input.image.image_id;
                    if !previous.is_empty() && previous != upload.file_id() {
                        self.delete_superseded(previous).await;
                    }
                }
                Ok(post)
            }
            Err(err) => {
                error!(post_id = %input.post_id, "post update failed: {}", err);
                if let Some(upload) = &upload {
                    self.discard(upload.file_id()).await;
                }
                Err(err)
            }
        }
    }

    async fn delete_superseded(&self, file_id: &str) {
        if let Err(err) = self.storage.delete_file(file_id).await {
            warn!(%file_id, "failed to delete replaced image: {}", err);
        }
    }

    /// Delete a post document; its image file is left in storage
    pub async fn delete_post(&self, post_id: &str, image_id: &str) -> SocialResult<()> {
        if post_id.is_empty() || image_id.is_empty() {
            return Err(SocialError::InvalidInput(
                "post id and image id are required".into(),
            ));
        }

        self.store.delete_post(post_id).await.map_err(|err| {
            error!(%post_id, "post delete failed: {}", err);
            err
        })?;
        info!(%post_id, "post deleted");
        Ok(())
    }
}
